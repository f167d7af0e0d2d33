//! Type definitions for the static analysis rule system.
//!
//! This module defines the core types used throughout the rule engine:
//! - [`Severity`] - Issue severity levels (Off, Info, Warning, Error)
//! - [`RuleCategory`] - Rule categories (Lint, Security, Gas, BestPractices)
//! - [`RuleMeta`] - Immutable per-rule metadata
//! - [`Issue`] - Individual findings with location and optional fix
//! - [`Fix`] - A textual edit attached to an issue
//! - [`FileReport`] / [`AnalysisReport`] - Per-file and aggregate results

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::{parser::ParseDiagnostic, source::SourceRange};

/// Severity level of an issue.
///
/// Ordered from lowest to highest severity for sorting purposes. `Off`
/// disables a rule entirely; it never appears on an emitted issue. The
/// process exit code is `1` when any `Error` finding is present.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Rule disabled; no issues are produced
    Off,
    /// Informational suggestion, does not affect exit code
    Info,
    /// Warning that may indicate a problem
    Warning,
    /// Critical issue that must be addressed (exit code 1)
    Error
}

impl Severity {
    /// Parse a configuration spelling.
    ///
    /// Accepts `off`, `info`, `warn`, `warning`, `error` (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "off" => Some(Self::Off),
            "info" => Some(Self::Info),
            "warning" | "warn" => Some(Self::Warning),
            "error" => Some(Self::Error),
            _ => None
        }
    }

    /// Numeric configuration form: `0` = off, `1` = warning, `2` = error.
    pub fn from_level(level: u64) -> Option<Self> {
        match level {
            0 => Some(Self::Off),
            1 => Some(Self::Warning),
            2 => Some(Self::Error),
            _ => None
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Off => write!(f, "OFF"),
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR")
        }
    }
}

/// Category of a rule for grouping and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleCategory {
    /// Stylistic and correctness lints
    Lint,
    /// Rules that identify potential security vulnerabilities
    Security,
    /// Rules that detect avoidable gas costs
    Gas,
    /// Idiomatic Solidity conventions
    BestPractices
}

impl RuleCategory {
    /// Kebab-case prefix used in rule ids of this category.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Lint => "lint",
            Self::Security => "security",
            Self::Gas => "gas",
            Self::BestPractices => "best-practices"
        }
    }
}

impl std::fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lint => write!(f, "Lint"),
            Self::Security => write!(f, "Security"),
            Self::Gas => write!(f, "Gas"),
            Self::BestPractices => write!(f, "Best practices")
        }
    }
}

/// Metadata about a rule, frozen at rule construction.
#[derive(Debug, Clone)]
pub struct RuleMeta {
    /// Unique rule identifier (e.g., "security/tx-origin")
    pub id:             &'static str,
    /// Short human-readable title
    pub title:          &'static str,
    /// What the rule detects
    pub description:    &'static str,
    /// How to address findings
    pub recommendation: &'static str,
    /// Default severity level
    pub severity:       Severity,
    /// Rule category
    pub category:       RuleCategory,
    /// Whether the rule attaches textual fixes to its issues
    pub fixable:        bool
}

/// A textual edit attached to an issue.
///
/// The range addresses the *original* source of the file; the applicator
/// drops fixes whose range falls outside the file or is inverted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    pub range:       SourceRange,
    pub text:        String,
    pub description: String
}

/// A single finding emitted by a rule.
///
/// `file_path` and the effective `rule_id` are stamped by the analysis
/// context; `(file_path, rule_id, location)` identify an issue for
/// deduplication. Issues are immutable once the owning rule returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Effective rule identifier, namespaced for plugin rules
    pub rule_id:    CompactString,
    /// Category of the originating rule
    pub category:   RuleCategory,
    /// Severity after configuration overrides
    pub severity:   Severity,
    /// Detailed description of the finding
    pub message:    String,
    /// Path of the analyzed file
    pub file_path:  String,
    /// Source span of the finding
    pub location:   SourceRange,
    /// Optional textual fix
    pub fix:        Option<Fix>,
    /// Optional suggestion for addressing the issue
    pub suggestion: Option<String>
}

/// Analysis result for a single file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileReport {
    pub file_path:    String,
    /// Wall-clock analysis time; excluded from equality-sensitive checks
    pub duration_ms:  u64,
    /// Parser diagnostics; non-empty iff the file failed to parse
    pub parse_errors: Vec<ParseDiagnostic>,
    /// Findings sorted by `(start.line, start.column, rule_id)`
    pub issues:       Vec<Issue>
}

impl FileReport {
    pub fn parse_failed(&self) -> bool {
        !self.parse_errors.is_empty()
    }
}

/// Issue counts by severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub errors:   usize,
    pub warnings: usize,
    pub info:     usize
}

/// Complete analysis report over all input files.
///
/// Files appear in resolved-path order regardless of completion order, one
/// entry per input file even when parsing failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub files:            Vec<FileReport>,
    pub total_issues:     usize,
    pub summary:          ReportSummary,
    pub duration_ms:      u64,
    pub has_parse_errors: bool
}

impl AnalysisReport {
    /// Assemble the aggregate from per-file reports already in path order.
    pub fn from_files(files: Vec<FileReport>, duration_ms: u64) -> Self {
        let mut summary = ReportSummary::default();
        for issue in files.iter().flat_map(|f| f.issues.iter()) {
            match issue.severity {
                Severity::Error => summary.errors += 1,
                Severity::Warning => summary.warnings += 1,
                Severity::Info => summary.info += 1,
                Severity::Off => {}
            }
        }
        let total_issues = files.iter().map(|f| f.issues.len()).sum();
        let has_parse_errors = files.iter().any(FileReport::parse_failed);
        Self {
            files,
            total_issues,
            summary,
            duration_ms,
            has_parse_errors
        }
    }

    pub fn error_count(&self) -> usize {
        self.summary.errors
    }

    pub fn warning_count(&self) -> usize {
        self.summary.warnings
    }

    pub fn info_count(&self) -> usize {
        self.summary.info
    }
}
