//! Textual fix application.
//!
//! Fixes attached to issues address spans of the *original* source. The
//! applicator resolves each range to byte offsets through one line-offset
//! table, orders the candidates by `(start desc, end desc)` and applies
//! them end-to-start so earlier offsets stay valid. A fix that intersects
//! an already-accepted fix is skipped, so at most one fix per overlap
//! cluster is applied and applied ranges are pairwise disjoint.
//!
//! [`apply_fixes`] is pure; writing the result back to disk (with an
//! optional backup and an atomic temp-file rename) is a separate step.

use std::{fs, path::Path};

use colored::Colorize;
use compact_str::CompactString;
use serde::Serialize;

use crate::{
    error::{AppResult, fix_error},
    rules::Issue,
    source::SourceView
};

/// A fix that was applied to the output text.
#[derive(Debug, Clone, Serialize)]
pub struct AppliedFix {
    pub rule_id:     CompactString,
    pub description: String,
    pub start:       usize,
    pub end:         usize,
    pub original:    String,
    pub replacement: String
}

/// Why a fix was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    /// Intersects a previously accepted fix
    Overlapping,
    /// Range lies outside the file or is inverted
    OutOfBounds
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Overlapping => write!(f, "overlapping"),
            Self::OutOfBounds => write!(f, "out of bounds")
        }
    }
}

/// A fix that was rejected, with its reason.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedFix {
    pub rule_id:     CompactString,
    pub description: String,
    pub reason:      SkipReason
}

/// Outcome of applying all of a file's fixes.
#[derive(Debug, Clone, Serialize)]
pub struct FileFixResult {
    pub file_path: String,
    pub output:    String,
    pub applied:   Vec<AppliedFix>,
    pub skipped:   Vec<SkippedFix>
}

impl FileFixResult {
    pub fn fixes_applied(&self) -> usize {
        self.applied.len()
    }

    pub fn fixes_skipped(&self) -> usize {
        self.skipped.len()
    }
}

struct Candidate<'a> {
    rule_id:     &'a str,
    description: &'a str,
    start:       usize,
    end:         usize,
    text:        &'a str
}

/// Apply the fixes attached to `issues` to `source`.
///
/// Pure function of its inputs: the on-disk file is untouched and the
/// result is independent of the input order of non-overlapping fixes.
pub fn apply_fixes(file_path: &str, source: &str, issues: &[Issue]) -> FileFixResult {
    let view = SourceView::new(source);
    let mut skipped = Vec::new();
    let mut candidates = Vec::new();

    for issue in issues {
        let Some(fix) = &issue.fix else {
            continue;
        };
        match view.range_to_offsets(&fix.range) {
            Some((start, end)) => candidates.push(Candidate {
                rule_id: issue.rule_id.as_str(),
                description: fix.description.as_str(),
                start,
                end,
                text: fix.text.as_str()
            }),
            None => skipped.push(SkippedFix {
                rule_id:     issue.rule_id.clone(),
                description: fix.description.clone(),
                reason:      SkipReason::OutOfBounds
            })
        }
    }

    // Descending start, then descending end: on equal starts the longer
    // fix wins, making the outcome independent of discovery order.
    candidates.sort_by(|a, b| b.start.cmp(&a.start).then(b.end.cmp(&a.end)));

    let mut output = source.to_string();
    let mut applied = Vec::new();
    let mut accepted_start = usize::MAX;

    for candidate in candidates {
        if candidate.end > accepted_start {
            skipped.push(SkippedFix {
                rule_id:     candidate.rule_id.into(),
                description: candidate.description.to_string(),
                reason:      SkipReason::Overlapping
            });
            continue;
        }
        let original = output[candidate.start..candidate.end].to_string();
        output.replace_range(candidate.start..candidate.end, candidate.text);
        applied.push(AppliedFix {
            rule_id:     candidate.rule_id.into(),
            description: candidate.description.to_string(),
            start:       candidate.start,
            end:         candidate.end,
            original,
            replacement: candidate.text.to_string()
        });
        accepted_start = candidate.start;
    }

    FileFixResult {
        file_path: file_path.to_string(),
        output,
        applied,
        skipped
    }
}

/// Unified-diff-like rendering grouped per fix.
pub fn render_diff(result: &FileFixResult, colored: bool) -> String {
    let mut diff = String::new();
    for fix in result.applied.iter().rev() {
        let header = format!("{}: {}", fix.rule_id, fix.description);
        let removed = format!("- {}", fix.original);
        let added = format!("+ {}", fix.replacement);
        if colored {
            diff.push_str(&format!(
                "{}\n{}\n{}\n",
                header.bold(),
                removed.red(),
                added.green()
            ));
        } else {
            diff.push_str(&format!("{}\n{}\n{}\n", header, removed, added));
        }
    }
    for fix in &result.skipped {
        diff.push_str(&format!("~ {}: {} (skipped: {})\n", fix.rule_id, fix.description, fix.reason));
    }
    diff
}

/// Write fixed text back to its file.
///
/// Optionally keeps a backup at `path + backup_extension`, then writes to a
/// temporary sibling and renames it into place so readers never observe a
/// half-written file.
///
/// # Errors
///
/// Fails when the backup, temporary write or rename fails.
pub fn write_fixed(path: &Path, text: &str, backup_extension: Option<&str>) -> AppResult<()> {
    let display = path.display().to_string();
    if let Some(extension) = backup_extension {
        let mut backup = path.as_os_str().to_owned();
        backup.push(extension);
        fs::copy(path, &backup)
            .map_err(|e| fix_error(&display, format!("cannot write backup: {}", e)))?;
    }
    let mut temporary = path.as_os_str().to_owned();
    temporary.push(".tmp");
    fs::write(&temporary, text)
        .map_err(|e| fix_error(&display, format!("cannot write temporary file: {}", e)))?;
    fs::rename(&temporary, path)
        .map_err(|e| fix_error(&display, format!("cannot replace file: {}", e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        rules::{Fix, RuleCategory, Severity},
        source::{Position, SourceRange}
    };

    fn issue_with_fix(rule_id: &str, range: SourceRange, text: &str) -> Issue {
        Issue {
            rule_id:    rule_id.into(),
            category:   RuleCategory::Lint,
            severity:   Severity::Info,
            message:    "test".to_string(),
            file_path:  "test.sol".to_string(),
            location:   range,
            fix:        Some(Fix {
                range,
                text: text.to_string(),
                description: format!("apply {}", rule_id)
            }),
            suggestion: None
        }
    }

    fn range(line: usize, start: usize, end: usize) -> SourceRange {
        SourceRange::new(Position::new(line, start), Position::new(line, end))
    }

    #[test]
    fn test_single_fix_applied() {
        let source = "if (flag == true) { run(); }\n";
        let issues = vec![issue_with_fix("lint/boolean-equality", range(1, 4, 16), "flag")];
        let result = apply_fixes("test.sol", source, &issues);
        assert_eq!(result.output, "if (flag) { run(); }\n");
        assert_eq!(result.fixes_applied(), 1);
        assert_eq!(result.fixes_skipped(), 0);
    }

    #[test]
    fn test_overlapping_fix_skipped() {
        let source = "aaaa bbbb cccc\n";
        let issues = vec![
            issue_with_fix("lint/one", range(1, 0, 9), "X"),
            issue_with_fix("lint/two", range(1, 5, 14), "Y"),
        ];
        let result = apply_fixes("test.sol", source, &issues);
        // Larger start offset wins; the earlier span overlaps and is skipped.
        assert_eq!(result.output, "aaaa Y\n");
        assert_eq!(result.fixes_applied(), 1);
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].reason, SkipReason::Overlapping);
        assert_eq!(result.skipped[0].rule_id, "lint/one");
    }

    #[test]
    fn test_equal_start_longer_fix_wins() {
        let source = "abcdef\n";
        let issues = vec![
            issue_with_fix("lint/short", range(1, 0, 2), "S"),
            issue_with_fix("lint/long", range(1, 0, 4), "L"),
        ];
        let result = apply_fixes("test.sol", source, &issues);
        assert_eq!(result.output, "Lef\n");
        assert_eq!(result.applied[0].rule_id, "lint/long");
        assert_eq!(result.skipped[0].rule_id, "lint/short");
    }

    #[test]
    fn test_containment_counts_as_overlap() {
        let source = "abcdefgh\n";
        let issues = vec![
            issue_with_fix("lint/inner", range(1, 3, 5), "X"),
            issue_with_fix("lint/outer", range(1, 1, 7), "Y"),
        ];
        let result = apply_fixes("test.sol", source, &issues);
        assert_eq!(result.fixes_applied(), 1);
        assert_eq!(result.skipped.len(), 1);
    }

    #[test]
    fn test_result_independent_of_input_order() {
        let source = "one two three\n";
        let forward = vec![
            issue_with_fix("lint/a", range(1, 0, 3), "1"),
            issue_with_fix("lint/b", range(1, 8, 13), "3"),
        ];
        let backward: Vec<Issue> = forward.iter().rev().cloned().collect();
        let first = apply_fixes("test.sol", source, &forward);
        let second = apply_fixes("test.sol", source, &backward);
        assert_eq!(first.output, second.output);
        assert_eq!(first.output, "1 two 3\n");
    }

    #[test]
    fn test_out_of_bounds_fix_dropped() {
        let source = "short\n";
        let issues = vec![issue_with_fix("lint/bad", range(9, 0, 4), "X")];
        let result = apply_fixes("test.sol", source, &issues);
        assert_eq!(result.output, source);
        assert_eq!(result.skipped[0].reason, SkipReason::OutOfBounds);
    }

    #[test]
    fn test_applied_ranges_are_disjoint() {
        let source = "aaa bbb ccc ddd\n";
        let issues = vec![
            issue_with_fix("lint/a", range(1, 0, 3), "A"),
            issue_with_fix("lint/b", range(1, 2, 7), "B"),
            issue_with_fix("lint/c", range(1, 8, 11), "C"),
            issue_with_fix("lint/d", range(1, 10, 15), "D"),
        ];
        let result = apply_fixes("test.sol", source, &issues);
        let mut ranges: Vec<(usize, usize)> =
            result.applied.iter().map(|f| (f.start, f.end)).collect();
        ranges.sort();
        for pair in ranges.windows(2) {
            assert!(pair[0].1 <= pair[1].0, "ranges {:?} overlap", pair);
        }
    }

    #[test]
    fn test_write_fixed_with_backup() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("Token.sol");
        fs::write(&path, "original").unwrap();
        write_fixed(&path, "fixed", Some(".bak")).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "fixed");
        assert_eq!(
            fs::read_to_string(dir.path().join("Token.sol.bak")).unwrap(),
            "original"
        );
    }

    #[test]
    fn test_render_diff_lists_fixes() {
        let source = "if (flag == true) { }\n";
        let issues = vec![issue_with_fix("lint/boolean-equality", range(1, 4, 16), "flag")];
        let result = apply_fixes("test.sol", source, &issues);
        let diff = render_diff(&result, false);
        assert!(diff.contains("lint/boolean-equality"));
        assert!(diff.contains("- flag == true"));
        assert!(diff.contains("+ flag"));
    }
}
