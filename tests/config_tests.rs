// SPDX-License-Identifier: MIT

use std::fs;

use solidity_analyzer::{
    config::{AnalyzerConfig, builtin_presets, normalize_rule_entry},
    rules::{RuleRegistry, Severity}
};

#[test]
fn test_load_config_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(".solidity-analyzer.json");
    fs::write(
        &path,
        r#"{
            "extends": "solidity:recommended",
            "rules": {
                "security/tx-origin": "error",
                "lint/max-line-length": ["warning", { "maxLength": 100 }],
                "gas/strict-inequalities": 0
            }
        }"#
    )
    .unwrap();

    let config = AnalyzerConfig::load(&path.to_string_lossy()).unwrap();
    assert_eq!(
        config.severity_for("security/tx-origin", Severity::Warning),
        Severity::Error
    );
    assert_eq!(
        config.severity_for("lint/max-line-length", Severity::Info),
        Severity::Warning
    );
    assert_eq!(
        config.severity_for("gas/strict-inequalities", Severity::Info),
        Severity::Off
    );
    assert_eq!(
        config.rule_options("lint/max-line-length").unwrap()["maxLength"],
        100
    );
}

#[test]
fn test_invalid_json_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ not json").unwrap();
    assert!(AnalyzerConfig::load(&path.to_string_lossy()).is_err());
}

#[test]
fn test_unknown_severity_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("bad-severity.json");
    fs::write(&path, r#"{ "rules": { "lint/quotes": "fatal" } }"#).unwrap();
    assert!(AnalyzerConfig::load(&path.to_string_lossy()).is_err());
}

#[test]
fn test_missing_config_file_rejected() {
    assert!(AnalyzerConfig::load("/definitely/missing/config.json").is_err());
}

#[test]
fn test_numeric_severity_normalization() {
    for (level, expected) in [
        (0, Severity::Off),
        (1, Severity::Warning),
        (2, Severity::Error),
    ] {
        let entry = normalize_rule_entry("x", &serde_json::json!(level)).unwrap();
        assert_eq!(entry.severity, expected);
    }
}

#[test]
fn test_every_preset_rule_exists() {
    let registry = RuleRegistry::with_builtin_rules();
    for (preset_name, table) in builtin_presets() {
        for rule_id in table.keys() {
            assert!(
                registry.get(rule_id).is_some(),
                "preset '{}' references unknown rule '{}'",
                preset_name,
                rule_id
            );
        }
    }
}

#[test]
fn test_minimal_preset_keeps_security_rules() {
    let presets = builtin_presets();
    let minimal = presets.get("solidity:minimal").unwrap();
    assert!(minimal.keys().all(|id| !id.starts_with("security/")));
    assert!(
        minimal
            .values()
            .all(|entry| entry.severity == Severity::Off)
    );
}
