//! Per-file analysis context handed to each rule.
//!
//! The engine creates one [`AnalysisContext`] per file, activates it for one
//! rule at a time, and consumes it after the last rule. A rule sees the
//! file path, the immutable source, the parsed AST, the effective config,
//! and a report sink. The context stamps the file path and the effective
//! rule id onto every reported issue, substitutes the `(line 1, column 0)`
//! fallback location for drafts without a range, and collapses duplicate
//! reports at the same `(rule_id, location)`.
//!
//! `report` outside an active rule fails with the rule-lifecycle error:
//! rules must emit their issues before `analyze` returns.

use std::collections::HashSet;

use compact_str::CompactString;
use regex::Regex;

use crate::{
    ast::AstNode,
    config::AnalyzerConfig,
    error::{AppResult, rule_lifecycle_error},
    rules::{Fix, Issue, RuleCategory, Severity},
    source::{Position, SourceRange, SourceView}
};

/// Issue payload produced by a rule before the context stamps identity.
#[derive(Debug, Clone, Default)]
pub struct IssueDraft {
    pub message:    String,
    pub location:   Option<SourceRange>,
    pub fix:        Option<Fix>,
    pub suggestion: Option<String>
}

impl IssueDraft {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    /// Anchor the draft at a node's span; drafts without a span fall back
    /// to the start of the file and name the node kind in the message.
    pub fn for_node(node: &AstNode, message: impl Into<String>) -> Self {
        let message = message.into();
        match node.span {
            Some(span) => Self::new(message).at(span),
            None => Self::new(format!("{} (at {})", message, node.kind))
        }
    }

    pub fn at(mut self, location: SourceRange) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_fix(mut self, fix: Fix) -> Self {
        self.fix = Some(fix);
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

struct ActiveRule {
    id:       CompactString,
    category: RuleCategory,
    severity: Severity
}

/// Per-file scratchpad shared sequentially by all rules.
pub struct AnalysisContext<'a> {
    file_path: &'a str,
    source:    &'a SourceView<'a>,
    ast:       &'a AstNode,
    config:    &'a AnalyzerConfig,
    active:    Option<ActiveRule>,
    issues:    Vec<Issue>,
    reported:  HashSet<(CompactString, SourceRange)>
}

impl<'a> AnalysisContext<'a> {
    pub fn new(
        file_path: &'a str,
        source: &'a SourceView<'a>,
        ast: &'a AstNode,
        config: &'a AnalyzerConfig
    ) -> Self {
        Self {
            file_path,
            source,
            ast,
            config,
            active: None,
            issues: Vec::new(),
            reported: HashSet::new()
        }
    }

    pub fn file_path(&self) -> &str {
        self.file_path
    }

    pub fn source_code(&self) -> &'a str {
        self.source.text()
    }

    pub fn source(&self) -> &'a SourceView<'a> {
        self.source
    }

    pub fn ast(&self) -> &'a AstNode {
        self.ast
    }

    pub fn config(&self) -> &AnalyzerConfig {
        self.config
    }

    /// Text of a 1-based line without its trailing newline.
    pub fn line_text(&self, line: usize) -> Option<&'a str> {
        self.source.line_text(line)
    }

    /// Options bag configured for the active rule, if any.
    pub fn rule_options(&self) -> Option<&serde_json::Value> {
        let active = self.active.as_ref()?;
        self.config.rule_options(&active.id)
    }

    /// Scan every line for a pattern, yielding the match range and the
    /// first capture group (or the full match when the pattern has none).
    ///
    /// Text-level rules (pragma constraints, imports, legacy keywords) use
    /// this instead of walking the AST.
    pub fn find_lines(&self, pattern: &Regex) -> Vec<(SourceRange, CompactString)> {
        let mut matches = Vec::new();
        for line_number in 1..=self.source.line_count() {
            let Some(line) = self.source.line_text(line_number) else {
                continue;
            };
            for captures in pattern.captures_iter(line) {
                let full = captures.get(0).expect("match group 0");
                let text = captures.get(1).map(|g| g.as_str()).unwrap_or(full.as_str());
                let range = SourceRange::new(
                    Position::new(line_number, full.start()),
                    Position::new(line_number, full.end())
                );
                matches.push((range, CompactString::new(text)));
            }
        }
        matches
    }

    /// Activate the context for one rule. Engine only.
    pub(crate) fn begin_rule(
        &mut self,
        id: impl Into<CompactString>,
        category: RuleCategory,
        severity: Severity
    ) {
        self.active = Some(ActiveRule {
            id: id.into(),
            category,
            severity
        });
    }

    /// Deactivate after the rule's `analyze` returned. Engine only.
    pub(crate) fn end_rule(&mut self) {
        self.active = None;
    }

    /// Append an issue for the active rule.
    ///
    /// # Errors
    ///
    /// Fails with the rule-lifecycle error when called outside an active
    /// `analyze` invocation.
    pub fn report(&mut self, draft: IssueDraft) -> AppResult<()> {
        let Some(active) = self.active.as_ref() else {
            return Err(rule_lifecycle_error(
                "report called outside an active rule analysis"
            ));
        };
        let location = draft.location.unwrap_or_else(|| {
            SourceRange::new(Position::file_start(), Position::file_start())
        });
        if !self.reported.insert((active.id.clone(), location)) {
            return Ok(());
        }
        self.issues.push(Issue {
            rule_id: active.id.clone(),
            category: active.category,
            severity: active.severity,
            message: draft.message,
            file_path: self.file_path.to_string(),
            location,
            fix: draft.fix,
            suggestion: draft.suggestion
        });
        Ok(())
    }

    /// Number of issues emitted so far.
    pub fn issue_count(&self) -> usize {
        self.issues.len()
    }

    /// Consume the context, yielding issues in emission order. Engine only.
    pub(crate) fn into_issues(self) -> Vec<Issue> {
        self.issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;

    fn range(line: usize, column: usize) -> SourceRange {
        SourceRange::new(Position::new(line, column), Position::new(line, column + 2))
    }

    fn with_context<R>(run: impl FnOnce(&mut AnalysisContext<'_>) -> R) -> R {
        let source = "contract C {}\n";
        let view = SourceView::new(source);
        let ast = AstNode::new(NodeKind::SourceUnit, None);
        let config = AnalyzerConfig::default();
        let mut context = AnalysisContext::new("test.sol", &view, &ast, &config);
        run(&mut context)
    }

    #[test]
    fn test_report_requires_active_rule() {
        with_context(|context| {
            let result = context.report(IssueDraft::new("orphan").at(range(1, 0)));
            assert!(result.is_err());
        });
    }

    #[test]
    fn test_report_stamps_identity() {
        with_context(|context| {
            context.begin_rule("security/tx-origin", RuleCategory::Security, Severity::Error);
            context
                .report(IssueDraft::new("found").at(range(1, 0)))
                .unwrap();
            context.end_rule();
            let issues = std::mem::take(&mut context.issues);
            assert_eq!(issues.len(), 1);
            assert_eq!(issues[0].rule_id, "security/tx-origin");
            assert_eq!(issues[0].file_path, "test.sol");
            assert_eq!(issues[0].severity, Severity::Error);
        });
    }

    #[test]
    fn test_duplicate_reports_collapse() {
        with_context(|context| {
            context.begin_rule("lint/quotes", RuleCategory::Lint, Severity::Info);
            context
                .report(IssueDraft::new("first").at(range(2, 4)))
                .unwrap();
            context
                .report(IssueDraft::new("second").at(range(2, 4)))
                .unwrap();
            context
                .report(IssueDraft::new("third").at(range(3, 0)))
                .unwrap();
            assert_eq!(context.issue_count(), 2);
        });
    }

    #[test]
    fn test_missing_location_falls_back_to_file_start() {
        with_context(|context| {
            context.begin_rule("lint/no-console", RuleCategory::Lint, Severity::Warning);
            context.report(IssueDraft::new("no range")).unwrap();
            let issue = &context.issues[0];
            assert_eq!(issue.location.start, Position::file_start());
        });
    }

    #[test]
    fn test_draft_for_node_without_span_names_kind() {
        let node = AstNode::new(NodeKind::PragmaDirective, None);
        let draft = IssueDraft::for_node(&node, "floating pragma");
        assert!(draft.message.contains("PragmaDirective"));
        assert!(draft.location.is_none());
    }

    #[test]
    fn test_report_rejected_after_end_rule() {
        with_context(|context| {
            context.begin_rule("gas/custom-errors", RuleCategory::Gas, Severity::Info);
            context.end_rule();
            assert!(context.report(IssueDraft::new("late")).is_err());
        });
    }
}
