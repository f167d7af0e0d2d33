// SPDX-License-Identifier: MIT

use solidity_analyzer::{
    config::AnalyzerConfig,
    engine::{AnalysisEngine, CancellationToken},
    fix::{SkipReason, apply_fixes},
    rules::{Fix, Issue, RuleCategory, Severity},
    source::{Position, SourceRange}
};

const BOOLEAN_SOURCE: &str = "contract X {\n    bool internal flag;\n\n    function f() public view returns (bool) {\n        if (flag == true) {\n            return flag;\n        }\n        return false;\n    }\n}\n";

fn analyze(source: &str) -> solidity_analyzer::rules::FileReport {
    let engine = AnalysisEngine::new();
    let config = AnalyzerConfig::default();
    engine.analyze_source("test.sol", source, &config, 0, 0, &CancellationToken::new())
}

#[test]
fn test_fix_application_scenario() {
    let report = analyze(BOOLEAN_SOURCE);
    let boolean_issues: Vec<&Issue> = report
        .issues
        .iter()
        .filter(|i| i.rule_id == "lint/boolean-equality")
        .collect();
    assert_eq!(boolean_issues.len(), 1);

    let result = apply_fixes("test.sol", BOOLEAN_SOURCE, &report.issues);
    assert_eq!(result.fixes_applied(), 1);
    assert_eq!(result.fixes_skipped(), 0);
    assert!(result.output.contains("if (flag) {"));
    assert!(!result.output.contains("flag == true"));
}

#[test]
fn test_fix_idempotence() {
    let report = analyze(BOOLEAN_SOURCE);
    let fixed = apply_fixes("test.sol", BOOLEAN_SOURCE, &report.issues);

    // Re-analyzing the fixed source must not re-emit the fixed finding at
    // the original location.
    let again = analyze(&fixed.output);
    let location = report
        .issues
        .iter()
        .find(|i| i.rule_id == "lint/boolean-equality")
        .map(|i| i.location)
        .expect("original finding");
    assert!(
        !again
            .issues
            .iter()
            .any(|i| i.rule_id == "lint/boolean-equality" && i.location == location)
    );

    // And applying the (empty) fix set again changes nothing.
    let twice = apply_fixes("test.sol", &fixed.output, &again.issues);
    let second_boolean_fixes = again
        .issues
        .iter()
        .filter(|i| i.rule_id == "lint/boolean-equality")
        .count();
    assert_eq!(second_boolean_fixes, 0);
    assert_eq!(twice.output, fixed.output);
}

fn overlap_issue(rule_id: &str, start: usize, end: usize, text: &str) -> Issue {
    let range = SourceRange::new(Position::new(1, start), Position::new(1, end));
    Issue {
        rule_id: rule_id.into(),
        category: RuleCategory::Lint,
        severity: Severity::Info,
        message: "overlap".to_string(),
        file_path: "test.sol".to_string(),
        location: range,
        fix: Some(Fix {
            range,
            text: text.to_string(),
            description: format!("{} edit", rule_id)
        }),
        suggestion: None
    }
}

#[test]
fn test_overlapping_fixes_scenario() {
    let source = "uint256 constant answer = 40 + 2;\n";
    // Two rules target intersecting spans of the same expression.
    let issues = vec![
        overlap_issue("lint/first", 26, 32, "42"),
        overlap_issue("lint/second", 28, 33, "2 + 40"),
    ];
    let result = apply_fixes("test.sol", source, &issues);

    assert_eq!(result.fixes_applied(), 1);
    assert_eq!(result.fixes_skipped(), 1);
    // The fix with the larger start offset wins.
    assert_eq!(result.applied[0].rule_id, "lint/second");
    assert_eq!(result.skipped[0].rule_id, "lint/first");
    assert_eq!(result.skipped[0].reason, SkipReason::Overlapping);
}

#[test]
fn test_preview_is_pure() {
    let report = analyze(BOOLEAN_SOURCE);
    let first = apply_fixes("test.sol", BOOLEAN_SOURCE, &report.issues);
    let second = apply_fixes("test.sol", BOOLEAN_SOURCE, &report.issues);
    assert_eq!(first.output, second.output);
    assert_eq!(first.fixes_applied(), second.fixes_applied());
}
