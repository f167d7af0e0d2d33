use colored::Colorize;

use crate::rules::{AnalysisReport, RuleCategory, RuleRegistry, Severity};

/// Output format for results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json
}

/// Output options
#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub format:  OutputFormat,
    pub colored: bool,
    pub verbose: bool
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            format:  OutputFormat::Text,
            colored: true,
            verbose: false
        }
    }
}

/// Format the aggregate report based on output options
pub fn format_report(report: &AnalysisReport, opts: &OutputOptions) -> String {
    match opts.format {
        OutputFormat::Json => serde_json::to_string_pretty(report).unwrap_or_default(),
        OutputFormat::Text => format_text_report(report, opts)
    }
}

fn format_text_report(report: &AnalysisReport, opts: &OutputOptions) -> String {
    let mut output = String::new();

    for file in &report.files {
        if file.issues.is_empty() && file.parse_errors.is_empty() {
            continue;
        }
        let header = &file.file_path;
        if opts.colored {
            output.push_str(&header.bold().underline().to_string());
        } else {
            output.push_str(header);
        }
        output.push('\n');

        for error in &file.parse_errors {
            let position = error
                .location
                .map(|range| format!("{}:{}", range.start.line, range.start.column))
                .unwrap_or_else(|| "-".to_string());
            let line = format!("  {:>8}  parse error  {}", position, error.message);
            if opts.colored {
                output.push_str(&line.red().to_string());
            } else {
                output.push_str(&line);
            }
            output.push('\n');
        }

        for issue in &file.issues {
            let position = format!("{}:{}", issue.location.start.line, issue.location.start.column);
            let severity = severity_label(issue.severity, opts.colored);
            output.push_str(&format!(
                "  {:>8}  {}  {}  {}\n",
                position, severity, issue.message, issue.rule_id
            ));
            if opts.verbose && let Some(suggestion) = &issue.suggestion {
                output.push_str(&format!("            ↳ {}\n", suggestion));
            }
        }
        output.push('\n');
    }

    output.push_str(&format_summary(report, opts.colored));
    output
}

fn severity_label(severity: Severity, colored: bool) -> String {
    let label = format!("{:<5}", severity.to_string());
    if !colored {
        return label;
    }
    match severity {
        Severity::Error => label.red().to_string(),
        Severity::Warning => label.yellow().to_string(),
        Severity::Info => label.cyan().to_string(),
        Severity::Off => label
    }
}

fn format_summary(report: &AnalysisReport, colored: bool) -> String {
    let summary = format!(
        "{} problem(s) in {} file(s): {} error(s), {} warning(s), {} info ({} ms)",
        report.total_issues,
        report.files.len(),
        report.summary.errors,
        report.summary.warnings,
        report.summary.info,
        report.duration_ms
    );
    if !colored {
        return summary;
    }
    if report.summary.errors > 0 {
        summary.red().bold().to_string()
    } else if report.summary.warnings > 0 {
        summary.yellow().bold().to_string()
    } else {
        summary.green().to_string()
    }
}

/// Format the rule catalog grouped by category
pub fn format_rules_list(registry: &RuleRegistry, colored: bool) -> String {
    let mut output = String::new();
    for category in [
        RuleCategory::Security,
        RuleCategory::Gas,
        RuleCategory::Lint,
        RuleCategory::BestPractices,
    ] {
        let rules = registry.all_by_category(category);
        if rules.is_empty() {
            continue;
        }
        let header = format!("{} rules", category);
        if colored {
            output.push_str(&header.bold().to_string());
        } else {
            output.push_str(&header);
        }
        output.push('\n');
        for rule in rules {
            let meta = rule.meta();
            let fixable = if meta.fixable { " (fixable)" } else { "" };
            output.push_str(&format!(
                "  {:<40} {:<5} {}{}\n",
                meta.id, meta.severity.to_string(), meta.description, fixable
            ));
        }
        output.push('\n');
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        rules::{FileReport, Issue, RuleCategory},
        source::{Position, SourceRange}
    };

    fn sample_report() -> AnalysisReport {
        let issue = Issue {
            rule_id:    "security/tx-origin".into(),
            category:   RuleCategory::Security,
            severity:   Severity::Error,
            message:    "tx.origin used".to_string(),
            file_path:  "a.sol".to_string(),
            location:   SourceRange::new(Position::new(2, 43), Position::new(2, 52)),
            fix:        None,
            suggestion: Some("Use msg.sender".to_string())
        };
        AnalysisReport::from_files(
            vec![FileReport {
                file_path:    "a.sol".to_string(),
                duration_ms:  3,
                parse_errors: Vec::new(),
                issues:       vec![issue]
            }],
            5
        )
    }

    #[test]
    fn test_text_report_contains_position_and_rule() {
        let text = format_report(
            &sample_report(),
            &OutputOptions {
                colored: false,
                ..OutputOptions::default()
            }
        );
        assert!(text.contains("a.sol"));
        assert!(text.contains("2:43"));
        assert!(text.contains("security/tx-origin"));
        assert!(text.contains("1 error(s)"));
    }

    #[test]
    fn test_verbose_includes_suggestion() {
        let text = format_report(
            &sample_report(),
            &OutputOptions {
                colored: false,
                verbose: true,
                ..OutputOptions::default()
            }
        );
        assert!(text.contains("Use msg.sender"));
    }

    #[test]
    fn test_json_report_round_trips() {
        let text = format_report(
            &sample_report(),
            &OutputOptions {
                format: OutputFormat::Json,
                colored: false,
                verbose: false
            }
        );
        let parsed: AnalysisReport = serde_json::from_str(&text).expect("valid json");
        assert_eq!(parsed.total_issues, 1);
    }

    #[test]
    fn test_rules_list_groups_categories() {
        let registry = RuleRegistry::with_builtin_rules();
        let listing = format_rules_list(&registry, false);
        assert!(listing.contains("Security rules"));
        assert!(listing.contains("security/tx-origin"));
        assert!(listing.contains("Gas rules"));
    }
}
