use super::{Rule, RuleCategory, RuleMeta, Severity};
use crate::{
    ast::{AstNode, NodeKind},
    context::{AnalysisContext, IssueDraft},
    error::AppResult,
    walker::{VisitControl, for_each_node}
};

/// String literal argument of a `require` call or `revert` statement.
fn revert_reason(node: &AstNode) -> Option<&AstNode> {
    if node.is_call_to("require") || node.is_call_to("revert") {
        return node
            .call_args()
            .iter()
            .find(|arg| arg.kind == NodeKind::StringLiteral);
    }
    if node.kind == NodeKind::RevertStatement {
        return node
            .children
            .iter()
            .find(|arg| arg.kind == NodeKind::StringLiteral);
    }
    None
}

/// Revert strings cost deployment and runtime gas; custom errors don't.
pub struct CustomErrors;

impl Rule for CustomErrors {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id:             "gas/custom-errors",
            title:          "Custom errors",
            description:    "String revert reason instead of a custom error",
            recommendation: "Define custom errors and revert with them",
            severity:       Severity::Info,
            category:       RuleCategory::Gas,
            fixable:        false
        }
    }

    fn analyze(&self, context: &mut AnalysisContext<'_>) -> AppResult<()> {
        let mut drafts = Vec::new();
        for_each_node(context.ast(), |node, _| {
            if revert_reason(node).is_some() {
                drafts.push(
                    IssueDraft::for_node(node, "Revert reason strings cost more gas than custom errors")
                        .with_suggestion("Declare `error SomeError();` and use `revert SomeError()`")
                );
            }
            VisitControl::Continue
        });
        for draft in drafts {
            context.report(draft)?;
        }
        Ok(())
    }
}

/// Events without indexed parameters are expensive to filter.
pub struct IndexedEvents;

impl Rule for IndexedEvents {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id:             "gas/indexed-events",
            title:          "Indexed events",
            description:    "Event without any indexed parameter",
            recommendation: "Index up to three parameters used for filtering",
            severity:       Severity::Info,
            category:       RuleCategory::Gas,
            fixable:        false
        }
    }

    fn analyze(&self, context: &mut AnalysisContext<'_>) -> AppResult<()> {
        let mut drafts = Vec::new();
        for_each_node(context.ast(), |node, _| {
            if node.kind == NodeKind::EventDefinition {
                let params = node.children_of_kind(NodeKind::EventParameter).count();
                let indexed = node
                    .children_of_kind(NodeKind::EventParameter)
                    .filter(|p| p.attr("indexed") == Some("true"))
                    .count();
                if params > 0 && indexed == 0 {
                    let name = node.text_str().unwrap_or("<unnamed>");
                    drafts.push(IssueDraft::for_node(
                        node,
                        format!("Event '{}' has no indexed parameters", name)
                    ));
                }
            }
            VisitControl::Continue
        });
        for draft in drafts {
            context.report(draft)?;
        }
        Ok(())
    }
}

/// `.length` read on every loop iteration.
pub struct LengthInLoops;

impl Rule for LengthInLoops {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id:             "gas/length-in-loops",
            title:          "Length in loops",
            description:    "Array length re-read in a loop condition",
            recommendation: "Cache the length in a local variable before the loop",
            severity:       Severity::Warning,
            category:       RuleCategory::Gas,
            fixable:        false
        }
    }

    fn analyze(&self, context: &mut AnalysisContext<'_>) -> AppResult<()> {
        let mut drafts = Vec::new();
        for_each_node(context.ast(), |node, _| {
            if !matches!(
                node.kind,
                NodeKind::ForStatement | NodeKind::WhileStatement | NodeKind::DoWhileStatement
            ) {
                return VisitControl::Continue;
            }
            // Only loop header children; the body block is checked on its own.
            for child in node.children.iter().filter(|c| c.kind != NodeKind::Block) {
                let mut found = None;
                for_each_node(child, |inner, _| {
                    if inner.kind == NodeKind::MemberAccess && inner.text_str() == Some("length") {
                        found = Some(inner.span);
                        return VisitControl::SkipSubtree;
                    }
                    VisitControl::Continue
                });
                if let Some(span) = found {
                    let mut draft =
                        IssueDraft::new("Array length is re-evaluated on every iteration")
                            .with_suggestion("Hoist the length into a local before the loop");
                    if let Some(span) = span {
                        draft = draft.at(span);
                    }
                    drafts.push(draft);
                    break;
                }
            }
            VisitControl::Continue
        });
        for draft in drafts {
            context.report(draft)?;
        }
        Ok(())
    }
}

/// `<=` / `>=` compile to an extra instruction compared to `<` / `>`.
pub struct StrictInequalities;

impl Rule for StrictInequalities {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id:             "gas/strict-inequalities",
            title:          "Strict inequalities",
            description:    "Non-strict comparison where a strict one may do",
            recommendation: "Prefer < and > when the boundary allows it",
            severity:       Severity::Info,
            category:       RuleCategory::Gas,
            fixable:        false
        }
    }

    fn analyze(&self, context: &mut AnalysisContext<'_>) -> AppResult<()> {
        let mut drafts = Vec::new();
        for_each_node(context.ast(), |node, _| {
            if node.kind == NodeKind::BinaryOperation
                && matches!(node.text_str(), Some("<=") | Some(">="))
            {
                drafts.push(IssueDraft::for_node(
                    node,
                    "Non-strict inequality costs an extra instruction"
                ));
            }
            VisitControl::Continue
        });
        for draft in drafts {
            context.report(draft)?;
        }
        Ok(())
    }
}

/// Revert strings above 32 bytes occupy an extra storage slot.
pub struct SmallStrings;

impl Rule for SmallStrings {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id:             "gas/small-strings",
            title:          "Small strings",
            description:    "Revert reason longer than 32 bytes",
            recommendation: "Keep revert strings within 32 bytes or use custom errors",
            severity:       Severity::Info,
            category:       RuleCategory::Gas,
            fixable:        false
        }
    }

    fn analyze(&self, context: &mut AnalysisContext<'_>) -> AppResult<()> {
        let mut drafts = Vec::new();
        for_each_node(context.ast(), |node, _| {
            if let Some(reason) = revert_reason(node)
                && let Some(text) = reason.text_str()
                // Spelling includes the surrounding quotes.
                && text.len() > 34
            {
                drafts.push(IssueDraft::for_node(
                    reason,
                    format!("Revert reason is {} bytes, above the 32-byte slot", text.len() - 2)
                ));
            }
            VisitControl::Continue
        });
        for draft in drafts {
            context.report(draft)?;
        }
        Ok(())
    }
}

/// External functions can read arguments directly from calldata.
pub struct CalldataParameters;

impl Rule for CalldataParameters {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id:             "gas/calldata-parameters",
            title:          "Calldata parameters",
            description:    "Memory parameter on an external function",
            recommendation: "Use calldata for external function parameters",
            severity:       Severity::Info,
            category:       RuleCategory::Gas,
            fixable:        false
        }
    }

    fn analyze(&self, context: &mut AnalysisContext<'_>) -> AppResult<()> {
        let mut drafts = Vec::new();
        for_each_node(context.ast(), |node, _| {
            if node.kind == NodeKind::FunctionDefinition
                && node.attr("visibility") == Some("external")
            {
                for parameter in node.children_of_kind(NodeKind::Parameter) {
                    if parameter.attr("storage") == Some("memory")
                        && !parameter.has_attr("return")
                    {
                        let name = parameter.text_str().unwrap_or("<unnamed>");
                        drafts.push(IssueDraft::for_node(
                            parameter,
                            format!("Parameter '{}' is copied to memory", name)
                        ));
                    }
                }
            }
            VisitControl::Continue
        });
        for draft in drafts {
            context.report(draft)?;
        }
        Ok(())
    }
}

/// `x += 1` costs more than `++x`.
pub struct IncrementByOne;

impl Rule for IncrementByOne {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id:             "gas/increment-by-one",
            title:          "Increment by one",
            description:    "Addition-assignment of one",
            recommendation: "Use the pre-increment operator",
            severity:       Severity::Info,
            category:       RuleCategory::Gas,
            fixable:        false
        }
    }

    fn analyze(&self, context: &mut AnalysisContext<'_>) -> AppResult<()> {
        let mut drafts = Vec::new();
        for_each_node(context.ast(), |node, _| {
            if node.kind == NodeKind::Assignment
                && node.text_str() == Some("+=")
                && node
                    .children
                    .get(1)
                    .is_some_and(|rhs| {
                        rhs.kind == NodeKind::NumberLiteral && rhs.text_str() == Some("1")
                    })
            {
                drafts.push(IssueDraft::for_node(node, "x += 1 costs more gas than ++x"));
            }
            VisitControl::Continue
        });
        for draft in drafts {
            context.report(draft)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AnalyzerConfig,
        parser::{ParseOptions, SolidityParser, SourceParser},
        source::SourceView
    };

    fn run_rule(rule: &dyn Rule, source: &str) -> usize {
        let outcome = SolidityParser.parse(source, &ParseOptions::default());
        let ast = outcome.ast.expect("parseable test source");
        let view = SourceView::new(source);
        let config = AnalyzerConfig::default();
        let mut context = AnalysisContext::new("test.sol", &view, &ast, &config);
        let meta = rule.meta();
        context.begin_rule(meta.id, meta.category, meta.severity);
        rule.analyze(&mut context).unwrap();
        context.end_rule();
        context.issue_count()
    }

    #[test]
    fn test_require_with_reason_string() {
        let count = run_rule(
            &CustomErrors,
            "contract X { function f(uint256 a) public pure { require(a > 0, \"zero\"); } }\n"
        );
        assert_eq!(count, 1);
    }

    #[test]
    fn test_require_without_reason_is_clean_for_custom_errors() {
        let count = run_rule(
            &CustomErrors,
            "contract X { function f(uint256 a) public pure { require(a > 0); } }\n"
        );
        assert_eq!(count, 0);
    }

    #[test]
    fn test_unindexed_event() {
        let count = run_rule(
            &IndexedEvents,
            "contract X { event Transfer(address from, address to, uint256 amount); }\n"
        );
        assert_eq!(count, 1);
    }

    #[test]
    fn test_indexed_event_is_clean() {
        let count = run_rule(
            &IndexedEvents,
            "contract X { event Transfer(address indexed from, address to, uint256 amount); }\n"
        );
        assert_eq!(count, 0);
    }

    #[test]
    fn test_length_in_loop_condition() {
        let count = run_rule(
            &LengthInLoops,
            "contract X { function f(uint256[] memory xs) public pure { for (uint256 i = 0; i < xs.length; i++) { } } }\n"
        );
        assert_eq!(count, 1);
    }

    #[test]
    fn test_cached_length_is_clean() {
        let count = run_rule(
            &LengthInLoops,
            "contract X { function f(uint256[] memory xs) public pure { uint256 n = xs.length; for (uint256 i = 0; i < n; i++) { } } }\n"
        );
        assert_eq!(count, 0);
    }

    #[test]
    fn test_calldata_parameters() {
        let count = run_rule(
            &CalldataParameters,
            "contract X { function f(bytes memory data) external pure { data; } }\n"
        );
        assert_eq!(count, 1);
    }

    #[test]
    fn test_increment_by_one() {
        let count = run_rule(
            &IncrementByOne,
            "contract X { uint256 public total; function f() public { total += 1; } }\n"
        );
        assert_eq!(count, 1);
    }
}
