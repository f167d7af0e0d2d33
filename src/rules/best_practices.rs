use std::sync::LazyLock;

use regex::Regex;

use super::{Rule, RuleCategory, RuleMeta, Severity};
use crate::{
    ast::NodeKind,
    context::{AnalysisContext, IssueDraft},
    error::AppResult,
    walker::{VisitControl, for_each_node}
};

static CAPWORDS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][a-zA-Z0-9]*$").expect("valid CapWords pattern"));

static MIXEDCASE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^_?[a-z][a-zA-Z0-9]*$").expect("valid mixedCase pattern"));

static SNAKECASE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Z0-9_]*$").expect("valid SNAKE_CASE pattern"));

static GLOBAL_IMPORT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*import\s+["'][^"']+["']\s*;"#).expect("valid global import pattern")
});

/// Single-letter names that read as numerals.
pub struct UseForbiddenName;

impl Rule for UseForbiddenName {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id:             "best-practices/use-forbidden-name",
            title:          "Forbidden name",
            description:    "Identifier named I, l or O",
            recommendation: "Pick a name that cannot be confused with 0 or 1",
            severity:       Severity::Warning,
            category:       RuleCategory::BestPractices,
            fixable:        false
        }
    }

    fn analyze(&self, context: &mut AnalysisContext<'_>) -> AppResult<()> {
        let mut drafts = Vec::new();
        for_each_node(context.ast(), |node, _| {
            if matches!(
                node.kind,
                NodeKind::VariableDeclaration
                    | NodeKind::StateVariableDeclaration
                    | NodeKind::Parameter
            ) && let Some(name) = node.text_str()
                && matches!(name, "I" | "l" | "O")
            {
                drafts.push(IssueDraft::for_node(
                    node,
                    format!("'{}' is easily confused with a numeral", name)
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

/// Contracts with many state variables get expensive and hard to audit.
pub struct MaxStatesCount;

impl Rule for MaxStatesCount {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id:             "best-practices/max-states-count",
            title:          "Max states count",
            description:    "Contract declares too many state variables",
            recommendation: "Group related fields into structs or split the contract",
            severity:       Severity::Warning,
            category:       RuleCategory::BestPractices,
            fixable:        false
        }
    }

    fn analyze(&self, context: &mut AnalysisContext<'_>) -> AppResult<()> {
        let max_states = context
            .rule_options()
            .and_then(|options| options.get("maxStates"))
            .and_then(|v| v.as_u64())
            .unwrap_or(15) as usize;
        let mut drafts = Vec::new();
        for_each_node(context.ast(), |node, _| {
            if node.kind == NodeKind::ContractDefinition {
                let states = node
                    .children_of_kind(NodeKind::StateVariableDeclaration)
                    .count();
                if states > max_states {
                    let name = node.text_str().unwrap_or("<unnamed>");
                    drafts.push(IssueDraft::for_node(
                        node,
                        format!(
                            "Contract '{}' declares {} state variables (limit {})",
                            name, states, max_states
                        )
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

/// Global imports pull every symbol into scope.
pub struct NoGlobalImport;

impl Rule for NoGlobalImport {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id:             "best-practices/no-global-import",
            title:          "No global import",
            description:    "Import without named symbols",
            recommendation: "Import specific symbols: import {X} from \"./X.sol\"",
            severity:       Severity::Warning,
            category:       RuleCategory::BestPractices,
            fixable:        false
        }
    }

    fn analyze(&self, context: &mut AnalysisContext<'_>) -> AppResult<()> {
        for (range, _) in context.find_lines(&GLOBAL_IMPORT_PATTERN) {
            context.report(
                IssueDraft::new("Global import of an entire file")
                    .with_suggestion("Name the imported symbols explicitly")
                    .at(range)
            )?;
        }
        Ok(())
    }
}

/// A fallback that is not payable rejects plain transfers confusingly.
pub struct PayableFallback;

impl Rule for PayableFallback {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id:             "best-practices/payable-fallback",
            title:          "Payable fallback",
            description:    "Fallback function without payable, and no receive",
            recommendation: "Mark the fallback payable or add a receive function",
            severity:       Severity::Warning,
            category:       RuleCategory::BestPractices,
            fixable:        false
        }
    }

    fn analyze(&self, context: &mut AnalysisContext<'_>) -> AppResult<()> {
        let mut drafts = Vec::new();
        for_each_node(context.ast(), |node, _| {
            if node.kind != NodeKind::ContractDefinition {
                return VisitControl::Continue;
            }
            let has_receive = node
                .children_of_kind(NodeKind::FunctionDefinition)
                .any(|f| f.attr("kind") == Some("receive"));
            if has_receive {
                return VisitControl::Continue;
            }
            for function in node.children_of_kind(NodeKind::FunctionDefinition) {
                if function.attr("kind") == Some("fallback")
                    && function.attr("mutability") != Some("payable")
                {
                    drafts.push(IssueDraft::for_node(
                        function,
                        "Fallback is not payable and the contract has no receive function"
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

/// `require` without a reason gives opaque failures.
pub struct ReasonString;

impl Rule for ReasonString {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id:             "best-practices/reason-string",
            title:          "Reason string",
            description:    "require without an error reason",
            recommendation: "Provide a reason string or a custom error",
            severity:       Severity::Info,
            category:       RuleCategory::BestPractices,
            fixable:        false
        }
    }

    fn analyze(&self, context: &mut AnalysisContext<'_>) -> AppResult<()> {
        let mut drafts = Vec::new();
        for_each_node(context.ast(), |node, _| {
            if node.is_call_to("require") && node.call_args().len() == 1 {
                drafts.push(IssueDraft::for_node(node, "require has no failure reason"));
            }
            VisitControl::Continue
        });
        for draft in drafts {
            context.report(draft)?;
        }
        Ok(())
    }
}

/// Contract-level type names use CapWords.
pub struct ContractNameCapwords;

impl Rule for ContractNameCapwords {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id:             "best-practices/contract-name-capwords",
            title:          "Contract name CapWords",
            description:    "Contract, struct or enum name is not CapWords",
            recommendation: "Name types LikeThis",
            severity:       Severity::Info,
            category:       RuleCategory::BestPractices,
            fixable:        false
        }
    }

    fn analyze(&self, context: &mut AnalysisContext<'_>) -> AppResult<()> {
        let mut drafts = Vec::new();
        for_each_node(context.ast(), |node, _| {
            if matches!(
                node.kind,
                NodeKind::ContractDefinition | NodeKind::StructDefinition | NodeKind::EnumDefinition
            ) && let Some(name) = node.text_str()
                && !CAPWORDS_PATTERN.is_match(name)
            {
                drafts.push(IssueDraft::for_node(
                    node,
                    format!("Name '{}' is not CapWords", name)
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

/// Function names use mixedCase.
pub struct FuncNameMixedcase;

impl Rule for FuncNameMixedcase {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id:             "best-practices/func-name-mixedcase",
            title:          "Function name mixedCase",
            description:    "Function name is not mixedCase",
            recommendation: "Name functions likeThis",
            severity:       Severity::Info,
            category:       RuleCategory::BestPractices,
            fixable:        false
        }
    }

    fn analyze(&self, context: &mut AnalysisContext<'_>) -> AppResult<()> {
        let mut drafts = Vec::new();
        for_each_node(context.ast(), |node, _| {
            if node.kind == NodeKind::FunctionDefinition
                && node.attr("kind") == Some("function")
                && let Some(name) = node.text_str()
                && !MIXEDCASE_PATTERN.is_match(name)
            {
                drafts.push(IssueDraft::for_node(
                    node,
                    format!("Function name '{}' is not mixedCase", name)
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

/// Variable names use mixedCase.
pub struct VarNameMixedcase;

impl Rule for VarNameMixedcase {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id:             "best-practices/var-name-mixedcase",
            title:          "Variable name mixedCase",
            description:    "Variable name is not mixedCase",
            recommendation: "Name variables likeThis",
            severity:       Severity::Info,
            category:       RuleCategory::BestPractices,
            fixable:        false
        }
    }

    fn analyze(&self, context: &mut AnalysisContext<'_>) -> AppResult<()> {
        let mut drafts = Vec::new();
        for_each_node(context.ast(), |node, _| {
            let is_plain_state = node.kind == NodeKind::StateVariableDeclaration
                && !node.has_attr("constant")
                && !node.has_attr("immutable");
            if (is_plain_state
                || matches!(node.kind, NodeKind::VariableDeclaration | NodeKind::Parameter))
                && let Some(name) = node.text_str()
                && !MIXEDCASE_PATTERN.is_match(name)
            {
                drafts.push(IssueDraft::for_node(
                    node,
                    format!("Variable name '{}' is not mixedCase", name)
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

/// Constants use SNAKE_CASE.
pub struct ConstNameSnakecase;

impl Rule for ConstNameSnakecase {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id:             "best-practices/const-name-snakecase",
            title:          "Constant name SNAKE_CASE",
            description:    "Constant name is not SNAKE_CASE",
            recommendation: "Name constants LIKE_THIS",
            severity:       Severity::Info,
            category:       RuleCategory::BestPractices,
            fixable:        false
        }
    }

    fn analyze(&self, context: &mut AnalysisContext<'_>) -> AppResult<()> {
        let mut drafts = Vec::new();
        for_each_node(context.ast(), |node, _| {
            if node.kind == NodeKind::StateVariableDeclaration
                && (node.has_attr("constant") || node.has_attr("immutable"))
                && let Some(name) = node.text_str()
                && !SNAKECASE_PATTERN.is_match(name)
            {
                drafts.push(IssueDraft::for_node(
                    node,
                    format!("Constant '{}' is not SNAKE_CASE", name)
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

/// Event names use CapWords.
pub struct EventNameCapwords;

impl Rule for EventNameCapwords {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id:             "best-practices/event-name-capwords",
            title:          "Event name CapWords",
            description:    "Event name is not CapWords",
            recommendation: "Name events LikeThis",
            severity:       Severity::Info,
            category:       RuleCategory::BestPractices,
            fixable:        false
        }
    }

    fn analyze(&self, context: &mut AnalysisContext<'_>) -> AppResult<()> {
        let mut drafts = Vec::new();
        for_each_node(context.ast(), |node, _| {
            if node.kind == NodeKind::EventDefinition
                && let Some(name) = node.text_str()
                && !CAPWORDS_PATTERN.is_match(name)
            {
                drafts.push(IssueDraft::for_node(
                    node,
                    format!("Event name '{}' is not CapWords", name)
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
    fn test_forbidden_name() {
        let count = run_rule(
            &UseForbiddenName,
            "contract X { function f() public pure { uint256 l = 1; l; } }\n"
        );
        assert_eq!(count, 1);
    }

    #[test]
    fn test_global_import() {
        let count = run_rule(
            &NoGlobalImport,
            "import \"./Token.sol\";\ncontract X { }\n"
        );
        assert_eq!(count, 1);
    }

    #[test]
    fn test_named_import_is_clean() {
        let count = run_rule(
            &NoGlobalImport,
            "import {Token} from \"./Token.sol\";\ncontract X { }\n"
        );
        assert_eq!(count, 0);
    }

    #[test]
    fn test_require_without_reason() {
        let count = run_rule(
            &ReasonString,
            "contract X { function f(uint256 a) public pure { require(a > 0); } }\n"
        );
        assert_eq!(count, 1);
    }

    #[test]
    fn test_require_with_reason_is_clean() {
        let count = run_rule(
            &ReasonString,
            "contract X { function f(uint256 a) public pure { require(a > 0, \"a is zero\"); } }\n"
        );
        assert_eq!(count, 0);
    }

    #[test]
    fn test_contract_name_capwords() {
        assert_eq!(run_rule(&ContractNameCapwords, "contract bad_name { }\n"), 1);
        assert_eq!(run_rule(&ContractNameCapwords, "contract GoodName { }\n"), 0);
    }

    #[test]
    fn test_function_name_mixedcase() {
        let count = run_rule(
            &FuncNameMixedcase,
            "contract X { function Bad_Name() public pure { } }\n"
        );
        assert_eq!(count, 1);
    }

    #[test]
    fn test_const_name_snakecase() {
        assert_eq!(
            run_rule(&ConstNameSnakecase, "contract X { uint256 internal constant limit = 1; }\n"),
            1
        );
        assert_eq!(
            run_rule(&ConstNameSnakecase, "contract X { uint256 internal constant LIMIT = 1; }\n"),
            0
        );
    }

    #[test]
    fn test_max_states_count_with_default_limit() {
        let mut body = String::new();
        for index in 0..16 {
            body.push_str(&format!("uint256 internal value{};\n", index));
        }
        let source = format!("contract X {{\n{}}}\n", body);
        assert_eq!(run_rule(&MaxStatesCount, &source), 1);
    }

    #[test]
    fn test_payable_fallback() {
        let count = run_rule(
            &PayableFallback,
            "contract X { fallback() external { } }\n"
        );
        assert_eq!(count, 1);
    }

    #[test]
    fn test_payable_fallback_with_receive_is_clean() {
        let count = run_rule(
            &PayableFallback,
            "contract X { fallback() external { } receive() external payable { } }\n"
        );
        assert_eq!(count, 0);
    }
}
