use std::sync::LazyLock;

use regex::Regex;

use super::{Fix, Rule, RuleCategory, RuleMeta, Severity};
use crate::{
    ast::{AstNode, NodeKind},
    context::{AnalysisContext, IssueDraft},
    error::AppResult,
    walker::{VisitControl, for_each_node}
};

/// Callee member of a call expression, looking through `{...}` call options.
///
/// `addr.call(...)`, `addr.call{value: 1}(...)` and `addr.send(x)` all
/// resolve to the `MemberAccess` naming the invoked member.
fn member_callee(node: &AstNode) -> Option<&AstNode> {
    let callee = node.callee()?;
    match callee.kind {
        NodeKind::MemberAccess => Some(callee),
        NodeKind::FunctionCall if callee.has_attr("call-options") => {
            let inner = callee.callee()?;
            (inner.kind == NodeKind::MemberAccess).then_some(inner)
        }
        _ => None
    }
}

/// Detects authorization checks built on `tx.origin`.
///
/// `tx.origin` is the externally-owned account at the start of the call
/// chain, not the immediate caller, so any contract in between can act on
/// behalf of the user (phishing-style attacks).
pub struct TxOrigin;

impl Rule for TxOrigin {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id:             "security/tx-origin",
            title:          "Avoid tx.origin",
            description:    "Use of tx.origin for authorization",
            recommendation: "Use msg.sender instead of tx.origin",
            severity:       Severity::Error,
            category:       RuleCategory::Security,
            fixable:        false
        }
    }

    fn analyze(&self, context: &mut AnalysisContext<'_>) -> AppResult<()> {
        let mut drafts = Vec::new();
        for_each_node(context.ast(), |node, _| {
            if node.is_member_of("tx", "origin") {
                drafts.push(
                    IssueDraft::for_node(node, "tx.origin used for authorization is vulnerable to phishing")
                        .with_suggestion("Use msg.sender to identify the immediate caller")
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

/// Flags `.call`, `.delegatecall` and `.staticcall` invocations.
pub struct AvoidLowLevelCalls;

impl Rule for AvoidLowLevelCalls {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id:             "security/avoid-low-level-calls",
            title:          "Avoid low-level calls",
            description:    "Low-level call bypasses type checking and error propagation",
            recommendation: "Prefer contract interfaces or library wrappers over raw calls",
            severity:       Severity::Warning,
            category:       RuleCategory::Security,
            fixable:        false
        }
    }

    fn analyze(&self, context: &mut AnalysisContext<'_>) -> AppResult<()> {
        let mut drafts = Vec::new();
        for_each_node(context.ast(), |node, _| {
            if let Some(member) = member_callee(node)
                && let Some(name) = member.text_str()
                && matches!(name, "call" | "delegatecall" | "staticcall")
            {
                drafts.push(
                    IssueDraft::for_node(node, format!("Low-level '{}' detected", name))
                        .with_suggestion("Use a typed contract call or check the returned success flag")
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

/// `sha3` is a deprecated alias of `keccak256`.
pub struct AvoidSha3;

impl Rule for AvoidSha3 {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id:             "security/avoid-sha3",
            title:          "Avoid sha3",
            description:    "Deprecated sha3 alias",
            recommendation: "Call keccak256 directly",
            severity:       Severity::Warning,
            category:       RuleCategory::Security,
            fixable:        true
        }
    }

    fn analyze(&self, context: &mut AnalysisContext<'_>) -> AppResult<()> {
        let mut drafts = Vec::new();
        for_each_node(context.ast(), |node, _| {
            if node.is_call_to("sha3")
                && let Some(callee) = node.callee()
                && let Some(span) = callee.span
            {
                drafts.push(
                    IssueDraft::for_node(node, "sha3 is a deprecated alias of keccak256").with_fix(
                        Fix {
                            range:       span,
                            text:        "keccak256".to_string(),
                            description: "Replace sha3 with keccak256".to_string()
                        }
                    )
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

/// `suicide` is a deprecated alias of `selfdestruct`.
pub struct AvoidSuicide;

impl Rule for AvoidSuicide {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id:             "security/avoid-suicide",
            title:          "Avoid suicide",
            description:    "Deprecated suicide alias",
            recommendation: "Call selfdestruct directly",
            severity:       Severity::Error,
            category:       RuleCategory::Security,
            fixable:        true
        }
    }

    fn analyze(&self, context: &mut AnalysisContext<'_>) -> AppResult<()> {
        let mut drafts = Vec::new();
        for_each_node(context.ast(), |node, _| {
            if node.is_call_to("suicide")
                && let Some(callee) = node.callee()
                && let Some(span) = callee.span
            {
                drafts.push(
                    IssueDraft::for_node(node, "suicide is a deprecated alias of selfdestruct")
                        .with_fix(Fix {
                            range:       span,
                            text:        "selfdestruct".to_string(),
                            description: "Replace suicide with selfdestruct".to_string()
                        })
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

static THROW_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bthrow\s*;").expect("valid throw pattern"));

/// Flags legacy `throw;` statements.
pub struct AvoidThrow;

impl Rule for AvoidThrow {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id:             "security/avoid-throw",
            title:          "Avoid throw",
            description:    "Legacy throw statement",
            recommendation: "Use revert, require or assert",
            severity:       Severity::Error,
            category:       RuleCategory::Security,
            fixable:        false
        }
    }

    fn analyze(&self, context: &mut AnalysisContext<'_>) -> AppResult<()> {
        for (range, _) in context.find_lines(&THROW_PATTERN) {
            context.report(
                IssueDraft::new("throw is deprecated")
                    .with_suggestion("Use revert() or require() with a reason")
                    .at(range)
            )?;
        }
        Ok(())
    }
}

/// Flags inline assembly blocks.
pub struct NoInlineAssembly;

impl Rule for NoInlineAssembly {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id:             "security/no-inline-assembly",
            title:          "No inline assembly",
            description:    "Inline assembly bypasses compiler safety checks",
            recommendation: "Express the logic in Solidity where possible",
            severity:       Severity::Warning,
            category:       RuleCategory::Security,
            fixable:        false
        }
    }

    fn analyze(&self, context: &mut AnalysisContext<'_>) -> AppResult<()> {
        let mut drafts = Vec::new();
        for_each_node(context.ast(), |node, _| {
            if node.kind == NodeKind::InlineAssembly {
                drafts.push(IssueDraft::for_node(
                    node,
                    "Inline assembly bypasses overflow and type checks"
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

/// Flags logic that depends on block timestamps.
pub struct NotRelyOnTime;

impl Rule for NotRelyOnTime {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id:             "security/not-rely-on-time",
            title:          "Not rely on time",
            description:    "Miners can manipulate block timestamps within bounds",
            recommendation: "Avoid block.timestamp and now in critical logic",
            severity:       Severity::Warning,
            category:       RuleCategory::Security,
            fixable:        false
        }
    }

    fn analyze(&self, context: &mut AnalysisContext<'_>) -> AppResult<()> {
        let mut drafts = Vec::new();
        for_each_node(context.ast(), |node, parent| {
            let is_timestamp = node.is_member_of("block", "timestamp");
            // `now` only counts as the global alias, not a member name.
            let is_now = node.kind == NodeKind::Identifier
                && node.text_str() == Some("now")
                && parent.is_none_or(|p| p.kind != NodeKind::MemberAccess);
            if is_timestamp || is_now {
                drafts.push(
                    IssueDraft::for_node(node, "Timestamp dependence can be exploited by miners")
                        .with_suggestion("Allow a tolerance window or use block numbers")
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

/// Flags logic that depends on block hashes.
pub struct NotRelyOnBlockHash;

impl Rule for NotRelyOnBlockHash {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id:             "security/not-rely-on-block-hash",
            title:          "Not rely on block hash",
            description:    "Block hashes are miner-influenced and unsuitable as randomness",
            recommendation: "Use a commit-reveal scheme or an oracle for randomness",
            severity:       Severity::Warning,
            category:       RuleCategory::Security,
            fixable:        false
        }
    }

    fn analyze(&self, context: &mut AnalysisContext<'_>) -> AppResult<()> {
        let mut drafts = Vec::new();
        for_each_node(context.ast(), |node, _| {
            if node.is_member_of("block", "blockhash") || node.is_call_to("blockhash") {
                drafts.push(IssueDraft::for_node(
                    node,
                    "Block hash is not a safe source of randomness"
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

/// `.send` returns a success flag that must be checked.
pub struct CheckSendResult;

impl Rule for CheckSendResult {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id:             "security/check-send-result",
            title:          "Check send result",
            description:    "Ignored send result lets failed transfers pass silently",
            recommendation: "Check the boolean returned by send, or use transfer",
            severity:       Severity::Warning,
            category:       RuleCategory::Security,
            fixable:        false
        }
    }

    fn analyze(&self, context: &mut AnalysisContext<'_>) -> AppResult<()> {
        let mut drafts = Vec::new();
        for_each_node(context.ast(), |node, _| {
            if node.kind == NodeKind::ExpressionStatement
                && let Some(call) = node.children.first()
                && let Some(member) = member_callee(call)
                && member.text_str() == Some("send")
            {
                drafts.push(
                    IssueDraft::for_node(call, "Result of send is ignored")
                        .with_suggestion("require(recipient.send(amount)) or use transfer")
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

/// Flags ether forwarding through `.call` with an attached value.
pub struct AvoidCallValue;

impl Rule for AvoidCallValue {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id:             "security/avoid-call-value",
            title:          "Avoid call.value",
            description:    "Forwarding ether via call forwards all remaining gas",
            recommendation: "Use transfer or send, or a checks-effects-interactions pattern",
            severity:       Severity::Warning,
            category:       RuleCategory::Security,
            fixable:        false
        }
    }

    fn analyze(&self, context: &mut AnalysisContext<'_>) -> AppResult<()> {
        let mut drafts = Vec::new();
        for_each_node(context.ast(), |node, _| {
            // Modern form: addr.call{value: x}("").
            let modern = member_callee(node).is_some_and(|m| m.text_str() == Some("call"))
                && node
                    .callee()
                    .is_some_and(|c| c.has_attr("call-options"))
                && node
                    .span
                    .and_then(|span| context.source().slice(&span))
                    .is_some_and(|text| text.contains("value"));
            // Legacy form: addr.call.value(x)("").
            let legacy = node.kind == NodeKind::MemberAccess
                && node.text_str() == Some("value")
                && node
                    .children
                    .first()
                    .is_some_and(|base| {
                        base.kind == NodeKind::MemberAccess && base.text_str() == Some("call")
                    });
            if modern || legacy {
                drafts.push(IssueDraft::for_node(
                    node,
                    "Ether sent through call forwards all remaining gas"
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

/// State variables should declare an explicit visibility.
pub struct StateVisibility;

impl Rule for StateVisibility {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id:             "security/state-visibility",
            title:          "State visibility",
            description:    "State variable without explicit visibility",
            recommendation: "Declare state variables public, internal or private",
            severity:       Severity::Warning,
            category:       RuleCategory::Security,
            fixable:        false
        }
    }

    fn analyze(&self, context: &mut AnalysisContext<'_>) -> AppResult<()> {
        let mut drafts = Vec::new();
        for_each_node(context.ast(), |node, _| {
            if node.kind == NodeKind::StateVariableDeclaration && !node.has_attr("visibility") {
                let name = node.text_str().unwrap_or("<unnamed>");
                drafts.push(IssueDraft::for_node(
                    node,
                    format!("State variable '{}' has no explicit visibility", name)
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

/// Functions should declare an explicit visibility.
pub struct FuncVisibility;

impl Rule for FuncVisibility {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id:             "security/func-visibility",
            title:          "Function visibility",
            description:    "Function without explicit visibility",
            recommendation: "Declare functions external, public, internal or private",
            severity:       Severity::Warning,
            category:       RuleCategory::Security,
            fixable:        false
        }
    }

    fn analyze(&self, context: &mut AnalysisContext<'_>) -> AppResult<()> {
        let mut drafts = Vec::new();
        for_each_node(context.ast(), |node, _| {
            if node.kind == NodeKind::FunctionDefinition
                && node.attr("kind") == Some("function")
                && !node.has_attr("visibility")
            {
                let name = node.text_str().unwrap_or("<unnamed>");
                drafts.push(IssueDraft::for_node(
                    node,
                    format!("Function '{}' has no explicit visibility", name)
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

/// Multiple ether transfers in one function multiply failure modes.
pub struct MultipleSends;

impl Rule for MultipleSends {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id:             "security/multiple-sends",
            title:          "Multiple sends",
            description:    "Several ether transfers inside a single function",
            recommendation: "Favor pull-payments over multiple pushes in one transaction",
            severity:       Severity::Warning,
            category:       RuleCategory::Security,
            fixable:        false
        }
    }

    fn analyze(&self, context: &mut AnalysisContext<'_>) -> AppResult<()> {
        let mut drafts = Vec::new();
        for_each_node(context.ast(), |node, _| {
            if node.kind != NodeKind::FunctionDefinition {
                return VisitControl::Continue;
            }
            let mut transfers = 0usize;
            for_each_node(node, |inner, _| {
                if member_callee(inner)
                    .and_then(AstNode::text_str)
                    .is_some_and(|name| matches!(name, "send" | "transfer"))
                {
                    transfers += 1;
                }
                VisitControl::Continue
            });
            if transfers > 1 {
                let name = node.text_str().unwrap_or("<unnamed>");
                drafts.push(IssueDraft::for_node(
                    node,
                    format!("Function '{}' performs {} ether transfers", name, transfers)
                ));
            }
            VisitControl::SkipSubtree
        });
        for draft in drafts {
            context.report(draft)?;
        }
        Ok(())
    }
}

/// Fallback functions should stay trivial.
pub struct NoComplexFallback;

impl Rule for NoComplexFallback {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id:             "security/no-complex-fallback",
            title:          "No complex fallback",
            description:    "Fallback function with non-trivial logic",
            recommendation: "Keep fallback and receive bodies to a couple of statements",
            severity:       Severity::Warning,
            category:       RuleCategory::Security,
            fixable:        false
        }
    }

    fn analyze(&self, context: &mut AnalysisContext<'_>) -> AppResult<()> {
        let max_statements = context
            .rule_options()
            .and_then(|options| options.get("maxStatements"))
            .and_then(|v| v.as_u64())
            .unwrap_or(2) as usize;
        let mut drafts = Vec::new();
        for_each_node(context.ast(), |node, _| {
            if node.kind == NodeKind::FunctionDefinition
                && matches!(node.attr("kind"), Some("fallback") | Some("receive"))
                && let Some(body) = node.child_of_kind(NodeKind::Block)
            {
                let mut statements = 0usize;
                for_each_node(body, |inner, _| {
                    if is_statement_kind(inner.kind) {
                        statements += 1;
                    }
                    VisitControl::Continue
                });
                if statements > max_statements {
                    drafts.push(IssueDraft::for_node(
                        node,
                        format!(
                            "Fallback contains {} statements (limit {})",
                            statements, max_statements
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

fn is_statement_kind(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::IfStatement
            | NodeKind::WhileStatement
            | NodeKind::DoWhileStatement
            | NodeKind::ForStatement
            | NodeKind::ReturnStatement
            | NodeKind::EmitStatement
            | NodeKind::RevertStatement
            | NodeKind::TryStatement
            | NodeKind::ExpressionStatement
            | NodeKind::VariableDeclarationStatement
            | NodeKind::ContinueStatement
            | NodeKind::BreakStatement
            | NodeKind::InlineAssembly
    )
}

/// Heuristic detection of state writes after external calls.
pub struct Reentrancy;

impl Rule for Reentrancy {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id:             "security/reentrancy",
            title:          "Reentrancy",
            description:    "State written after an external call",
            recommendation: "Apply checks-effects-interactions: update state before calling out",
            severity:       Severity::Warning,
            category:       RuleCategory::Security,
            fixable:        false
        }
    }

    fn analyze(&self, context: &mut AnalysisContext<'_>) -> AppResult<()> {
        let mut drafts = Vec::new();
        for_each_node(context.ast(), |node, _| {
            if node.kind != NodeKind::FunctionDefinition {
                return VisitControl::Continue;
            }
            let mut external_call: Option<&AstNode> = None;
            let mut writes_after_call = false;
            for_each_node(node, |inner, _| {
                let is_external = member_callee(inner)
                    .and_then(AstNode::text_str)
                    .is_some_and(|name| matches!(name, "call" | "send" | "transfer"));
                if is_external && external_call.is_none() {
                    external_call = Some(inner);
                } else if external_call.is_some() && inner.kind == NodeKind::Assignment {
                    writes_after_call = true;
                }
                VisitControl::Continue
            });
            if writes_after_call && let Some(call) = external_call {
                drafts.push(
                    IssueDraft::for_node(call, "State is modified after this external call")
                        .with_suggestion("Move state updates before the external interaction")
                );
            }
            VisitControl::SkipSubtree
        });
        for draft in drafts {
            context.report(draft)?;
        }
        Ok(())
    }
}

static PRAGMA_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"pragma\s+solidity\s+([^;]+);").expect("valid pragma pattern"));

/// Flags pragmas that admit pre-0.8 compilers.
pub struct CompilerVersion;

impl Rule for CompilerVersion {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id:             "security/compiler-version",
            title:          "Compiler version",
            description:    "Pragma admits a compiler without checked arithmetic",
            recommendation: "Require solidity 0.8 or newer",
            severity:       Severity::Warning,
            category:       RuleCategory::Security,
            fixable:        false
        }
    }

    fn analyze(&self, context: &mut AnalysisContext<'_>) -> AppResult<()> {
        for (range, constraint) in context.find_lines(&PRAGMA_PATTERN) {
            let constraint = constraint.trim();
            let outdated = ["0.4.", "0.5.", "0.6.", "0.7."]
                .iter()
                .any(|old| constraint.contains(old));
            if outdated {
                context.report(
                    IssueDraft::new(format!(
                        "Pragma '{}' admits compilers without built-in overflow checks",
                        constraint
                    ))
                    .with_suggestion("Use pragma solidity ^0.8.0 or newer")
                    .at(range)
                )?;
            }
        }
        Ok(())
    }
}
