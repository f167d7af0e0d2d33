use std::sync::LazyLock;

use regex::Regex;

use super::{Fix, Rule, RuleCategory, RuleMeta, Severity};
use crate::{
    ast::NodeKind,
    context::{AnalysisContext, IssueDraft},
    error::AppResult,
    walker::{VisitControl, for_each_node}
};

/// Comparisons against boolean literals are redundant.
pub struct BooleanEquality;

impl Rule for BooleanEquality {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id:             "lint/boolean-equality",
            title:          "Boolean equality",
            description:    "Comparison against a boolean literal",
            recommendation: "Use the expression itself (or its negation)",
            severity:       Severity::Info,
            category:       RuleCategory::Lint,
            fixable:        true
        }
    }

    fn analyze(&self, context: &mut AnalysisContext<'_>) -> AppResult<()> {
        let mut drafts = Vec::new();
        for_each_node(context.ast(), |node, _| {
            let operator = match node.text_str() {
                Some(op @ ("==" | "!=")) if node.kind == NodeKind::BinaryOperation => op,
                _ => return VisitControl::Continue
            };
            if node.children.len() != 2 {
                return VisitControl::Continue;
            }
            let (literal, other) = match (&node.children[0], &node.children[1]) {
                (l, o) if l.kind == NodeKind::BoolLiteral => (l, o),
                (o, l) if l.kind == NodeKind::BoolLiteral => (l, o),
                _ => return VisitControl::Continue
            };
            let literal_is_true = literal.text_str() == Some("true");
            // `x == true` and `x != false` keep x; the others negate it.
            let keep = (operator == "==") == literal_is_true;
            let mut draft = IssueDraft::for_node(node, "Comparison against a boolean literal");
            if let (Some(span), Some(other_span)) = (node.span, other.span)
                && let Some(other_text) = context.source().slice(&other_span)
            {
                let replacement = if keep {
                    other_text.to_string()
                } else if other.kind == NodeKind::Identifier {
                    format!("!{}", other_text)
                } else {
                    format!("!({})", other_text)
                };
                draft = draft.with_fix(Fix {
                    range:       span,
                    text:        replacement,
                    description: "Remove the boolean literal comparison".to_string()
                });
            }
            drafts.push(draft);
            VisitControl::Continue
        });
        for draft in drafts {
            context.report(draft)?;
        }
        Ok(())
    }
}

/// Empty code blocks usually indicate unfinished logic.
pub struct NoEmptyBlocks;

impl Rule for NoEmptyBlocks {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id:             "lint/no-empty-blocks",
            title:          "No empty blocks",
            description:    "Empty code block",
            recommendation: "Add logic or a comment, or remove the block",
            severity:       Severity::Warning,
            category:       RuleCategory::Lint,
            fixable:        false
        }
    }

    fn analyze(&self, context: &mut AnalysisContext<'_>) -> AppResult<()> {
        let mut drafts = Vec::new();
        for_each_node(context.ast(), |node, parent| {
            if node.kind != NodeKind::Block || !node.children.is_empty() {
                return VisitControl::Continue;
            }
            // Empty constructor/receive/fallback bodies are a common idiom.
            let allowed = parent.is_some_and(|p| {
                p.kind == NodeKind::FunctionDefinition
                    && (matches!(
                        p.attr("kind"),
                        Some("constructor") | Some("receive") | Some("fallback")
                    ) || p.attr("mutability") == Some("payable"))
            });
            if !allowed {
                drafts.push(IssueDraft::for_node(node, "Empty block"));
            }
            VisitControl::Continue
        });
        for draft in drafts {
            context.report(draft)?;
        }
        Ok(())
    }
}

/// Local variables that are declared but never read.
pub struct NoUnusedVars;

impl Rule for NoUnusedVars {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id:             "lint/no-unused-vars",
            title:          "No unused variables",
            description:    "Local variable is never used",
            recommendation: "Remove the variable or prefix it with an underscore",
            severity:       Severity::Warning,
            category:       RuleCategory::Lint,
            fixable:        false
        }
    }

    fn analyze(&self, context: &mut AnalysisContext<'_>) -> AppResult<()> {
        let mut drafts = Vec::new();
        for_each_node(context.ast(), |node, _| {
            if node.kind != NodeKind::FunctionDefinition {
                return VisitControl::Continue;
            }
            let mut declared: Vec<(&str, Option<crate::source::SourceRange>)> = Vec::new();
            let mut used: Vec<&str> = Vec::new();
            for_each_node(node, |inner, _| {
                match inner.kind {
                    NodeKind::VariableDeclaration => {
                        if let Some(name) = inner.text_str()
                            && !name.starts_with('_')
                        {
                            declared.push((name, inner.span));
                        }
                    }
                    NodeKind::Identifier => {
                        if let Some(name) = inner.text_str() {
                            used.push(name);
                        }
                    }
                    _ => {}
                }
                VisitControl::Continue
            });
            for (name, span) in declared {
                if !used.contains(&name) {
                    let mut draft =
                        IssueDraft::new(format!("Variable '{}' is never used", name));
                    if let Some(span) = span {
                        draft = draft.at(span);
                    }
                    drafts.push(draft);
                }
            }
            VisitControl::SkipSubtree
        });
        for draft in drafts {
            context.report(draft)?;
        }
        Ok(())
    }
}

/// String literals should use double quotes.
pub struct Quotes;

impl Rule for Quotes {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id:             "lint/quotes",
            title:          "Quotes",
            description:    "Single-quoted string literal",
            recommendation: "Use double quotes for string literals",
            severity:       Severity::Info,
            category:       RuleCategory::Lint,
            fixable:        true
        }
    }

    fn analyze(&self, context: &mut AnalysisContext<'_>) -> AppResult<()> {
        let mut drafts = Vec::new();
        for_each_node(context.ast(), |node, _| {
            if node.kind == NodeKind::StringLiteral
                && let Some(text) = node.text_str()
                && text.starts_with('\'')
            {
                let mut draft = IssueDraft::for_node(node, "String uses single quotes");
                let inner = text.trim_matches('\'');
                if let Some(span) = node.span
                    && !inner.contains('"')
                {
                    draft = draft.with_fix(Fix {
                        range:       span,
                        text:        format!("\"{}\"", inner),
                        description: "Switch to double quotes".to_string()
                    });
                }
                drafts.push(draft);
            }
            VisitControl::Continue
        });
        for draft in drafts {
            context.report(draft)?;
        }
        Ok(())
    }
}

static CONSOLE_IMPORT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"import\s+["'](?:hardhat|forge-std)/console[2]?\.sol["']"#)
        .expect("valid console import pattern")
});

/// Development console imports and calls must not ship.
pub struct NoConsole;

impl Rule for NoConsole {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id:             "lint/no-console",
            title:          "No console",
            description:    "Development console usage",
            recommendation: "Remove console imports and calls before deployment",
            severity:       Severity::Warning,
            category:       RuleCategory::Lint,
            fixable:        false
        }
    }

    fn analyze(&self, context: &mut AnalysisContext<'_>) -> AppResult<()> {
        for (range, _) in context.find_lines(&CONSOLE_IMPORT_PATTERN) {
            context.report(IssueDraft::new("Console import").at(range))?;
        }
        let mut drafts = Vec::new();
        for_each_node(context.ast(), |node, _| {
            if node.kind == NodeKind::FunctionCall
                && let Some(callee) = node.callee()
                && callee.kind == NodeKind::MemberAccess
                && callee
                    .children
                    .first()
                    .is_some_and(|base| {
                        base.kind == NodeKind::Identifier
                            && matches!(base.text_str(), Some("console") | Some("console2"))
                    })
            {
                drafts.push(IssueDraft::for_node(node, "Console call"));
            }
            VisitControl::Continue
        });
        for draft in drafts {
            context.report(draft)?;
        }
        Ok(())
    }
}

/// Long lines hurt reviewability.
pub struct MaxLineLength;

impl Rule for MaxLineLength {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id:             "lint/max-line-length",
            title:          "Max line length",
            description:    "Line exceeds the configured maximum",
            recommendation: "Wrap long lines",
            severity:       Severity::Info,
            category:       RuleCategory::Lint,
            fixable:        false
        }
    }

    fn analyze(&self, context: &mut AnalysisContext<'_>) -> AppResult<()> {
        let max_length = context
            .rule_options()
            .and_then(|options| options.get("maxLength"))
            .and_then(|v| v.as_u64())
            .unwrap_or(120) as usize;
        let mut drafts = Vec::new();
        for line_number in 1..=context.source().line_count() {
            if let Some(line) = context.line_text(line_number)
                && line.len() > max_length
            {
                drafts.push(
                    IssueDraft::new(format!(
                        "Line is {} characters (limit {})",
                        line.len(),
                        max_length
                    ))
                    .at(crate::source::SourceRange::new(
                        crate::source::Position::new(line_number, max_length),
                        crate::source::Position::new(line_number, line.len())
                    ))
                );
            }
        }
        for draft in drafts {
            context.report(draft)?;
        }
        Ok(())
    }
}

/// Cyclomatic complexity per function.
pub struct CodeComplexity;

impl Rule for CodeComplexity {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id:             "lint/code-complexity",
            title:          "Code complexity",
            description:    "Function exceeds the cyclomatic complexity threshold",
            recommendation: "Split the function into smaller pieces",
            severity:       Severity::Warning,
            category:       RuleCategory::Lint,
            fixable:        false
        }
    }

    fn analyze(&self, context: &mut AnalysisContext<'_>) -> AppResult<()> {
        let threshold = context
            .rule_options()
            .and_then(|options| options.get("threshold"))
            .and_then(|v| v.as_u64())
            .unwrap_or(7) as usize;
        let mut drafts = Vec::new();
        for_each_node(context.ast(), |node, _| {
            if node.kind != NodeKind::FunctionDefinition {
                return VisitControl::Continue;
            }
            let mut complexity = 1usize;
            for_each_node(node, |inner, _| {
                let branches = match inner.kind {
                    NodeKind::IfStatement
                    | NodeKind::WhileStatement
                    | NodeKind::DoWhileStatement
                    | NodeKind::ForStatement
                    | NodeKind::ConditionalExpression => true,
                    NodeKind::BinaryOperation => {
                        matches!(inner.text_str(), Some("&&") | Some("||"))
                    }
                    _ => false
                };
                if branches {
                    complexity += 1;
                }
                VisitControl::Continue
            });
            if complexity > threshold {
                let name = node.text_str().unwrap_or("<unnamed>");
                drafts.push(IssueDraft::for_node(
                    node,
                    format!(
                        "Function '{}' has cyclomatic complexity {} (limit {})",
                        name, complexity, threshold
                    )
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

/// Function length in source lines.
pub struct FunctionMaxLines;

impl Rule for FunctionMaxLines {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id:             "lint/function-max-lines",
            title:          "Function max lines",
            description:    "Function body spans too many lines",
            recommendation: "Extract helpers to shorten the function",
            severity:       Severity::Warning,
            category:       RuleCategory::Lint,
            fixable:        false
        }
    }

    fn analyze(&self, context: &mut AnalysisContext<'_>) -> AppResult<()> {
        let max_lines = context
            .rule_options()
            .and_then(|options| options.get("maxLines"))
            .and_then(|v| v.as_u64())
            .unwrap_or(50) as usize;
        let mut drafts = Vec::new();
        for_each_node(context.ast(), |node, _| {
            if node.kind == NodeKind::FunctionDefinition
                && let Some(span) = node.span
            {
                let lines = span.end.line.saturating_sub(span.start.line) + 1;
                if lines > max_lines {
                    let name = node.text_str().unwrap_or("<unnamed>");
                    drafts.push(IssueDraft::for_node(
                        node,
                        format!("Function '{}' spans {} lines (limit {})", name, lines, max_lines)
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

/// `uint`/`int` aliases hide the actual width.
pub struct ExplicitTypes;

impl Rule for ExplicitTypes {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id:             "lint/explicit-types",
            title:          "Explicit types",
            description:    "Implicitly sized integer alias",
            recommendation: "Spell uint256/int256 explicitly",
            severity:       Severity::Info,
            category:       RuleCategory::Lint,
            fixable:        true
        }
    }

    fn analyze(&self, context: &mut AnalysisContext<'_>) -> AppResult<()> {
        let mut drafts = Vec::new();
        for_each_node(context.ast(), |node, _| {
            if node.kind == NodeKind::ElementaryTypeName
                && let Some(alias) = node.text_str()
                && matches!(alias, "uint" | "int")
            {
                let explicit = format!("{}256", alias);
                let mut draft = IssueDraft::for_node(
                    node,
                    format!("'{}' is an alias for '{}'", alias, explicit)
                );
                if let Some(span) = node.span {
                    draft = draft.with_fix(Fix {
                        range:       span,
                        text:        explicit.clone(),
                        description: format!("Replace {} with {}", alias, explicit)
                    });
                }
                drafts.push(draft);
            }
            VisitControl::Continue
        });
        for draft in drafts {
            context.report(draft)?;
        }
        Ok(())
    }
}
