//! Configuration loading and management.
//!
//! The analyzer reads a JSON configuration object containing at least a
//! `rules` table, plus an optional `extends` naming a preset:
//!
//! ```json
//! {
//!     "extends": "solidity:recommended",
//!     "rules": {
//!         "security/tx-origin": "error",
//!         "lint/max-line-length": "off",
//!         "lint/code-complexity": ["warning", { "threshold": 10 }]
//!     }
//! }
//! ```
//!
//! # Severity spellings
//!
//! | Form | Severity |
//! |------|----------|
//! | `"off"`, `0` | Off |
//! | `"warn"`, `"warning"`, `1` | Warning |
//! | `"error"`, `2` | Error |
//! | `"info"` | Info |
//!
//! An entry may also be `[severity, options]`; the options bag is passed
//! through to the rule unchanged. Rules absent from the table run at their
//! default severity. Unknown severities fail configuration loading.

use std::{fs, path::PathBuf};

use indexmap::IndexMap;
use serde_json::Value;

use crate::{
    error::{AppResult, config_error, file_read_error},
    rules::Severity
};

/// Configuration file recognized in analyzed project roots.
pub const CONFIG_FILE_NAME: &str = ".solidity-analyzer.json";

/// Rule table: rule id to configured severity and options.
pub type RuleTable = IndexMap<String, RuleEntry>;

/// Named preset fragments addressable from `extends`.
pub type PresetMap = IndexMap<String, RuleTable>;

/// Normalized configuration entry for a single rule.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleEntry {
    pub severity: Severity,
    pub options:  Option<Value>
}

impl RuleEntry {
    pub fn severity(severity: Severity) -> Self {
        Self {
            severity,
            options: None
        }
    }
}

/// Effective, read-only analysis configuration.
#[derive(Debug, Clone, Default)]
pub struct AnalyzerConfig {
    /// Base path analyzed paths are reported relative to
    pub base_path: PathBuf,
    /// Severity overrides and options per rule id
    pub rules:     RuleTable
}

impl AnalyzerConfig {
    /// Load configuration from a JSON file, resolving `extends` against the
    /// built-in presets.
    pub fn load(path: &str) -> AppResult<Self> {
        Self::load_with_presets(path, &builtin_presets())
    }

    /// Load configuration resolving `extends` against the given presets
    /// (built-ins plus any plugin-contributed fragments).
    pub fn load_with_presets(path: &str, presets: &PresetMap) -> AppResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| file_read_error(path, e))?;
        let value: Value = serde_json::from_str(&content)
            .map_err(|e| config_error(format!("Invalid config file '{}': {}", path, e)))?;
        Self::from_json_value(&value, presets)
    }

    /// Build a configuration from an already-parsed JSON object.
    pub fn from_json_value(value: &Value, presets: &PresetMap) -> AppResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| config_error("Config must be a JSON object"))?;

        let mut rules = RuleTable::new();
        if let Some(extends) = object.get("extends") {
            let name = extends
                .as_str()
                .ok_or_else(|| config_error("'extends' must be a preset name"))?;
            let preset = presets
                .get(name)
                .ok_or_else(|| config_error(format!("Unknown preset '{}'", name)))?;
            rules.extend(preset.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        if let Some(table) = object.get("rules") {
            let table = table
                .as_object()
                .ok_or_else(|| config_error("'rules' must be an object"))?;
            for (rule_id, entry) in table {
                rules.insert(rule_id.clone(), normalize_rule_entry(rule_id, entry)?);
            }
        }

        let base_path = object
            .get("basePath")
            .and_then(Value::as_str)
            .map(PathBuf::from)
            .unwrap_or_default();

        Ok(Self {
            base_path,
            rules
        })
    }

    /// Effective severity for a rule, falling back to its default.
    pub fn severity_for(&self, rule_id: &str, default: Severity) -> Severity {
        self.rules
            .get(rule_id)
            .map(|entry| entry.severity)
            .unwrap_or(default)
    }

    /// Options bag configured for a rule, if any.
    pub fn rule_options(&self, rule_id: &str) -> Option<&Value> {
        self.rules.get(rule_id).and_then(|entry| entry.options.as_ref())
    }
}

/// Normalize one `rules` entry: bare severity or `[severity, options]`.
pub fn normalize_rule_entry(rule_id: &str, value: &Value) -> AppResult<RuleEntry> {
    match value {
        Value::Array(items) => {
            let severity_value = items.first().ok_or_else(|| {
                config_error(format!("Rule '{}': empty severity array", rule_id))
            })?;
            let severity = normalize_severity(rule_id, severity_value)?;
            let options = items.get(1).cloned();
            if items.len() > 2 {
                return Err(config_error(format!(
                    "Rule '{}': expected [severity, options]",
                    rule_id
                )));
            }
            Ok(RuleEntry {
                severity,
                options
            })
        }
        other => Ok(RuleEntry::severity(normalize_severity(rule_id, other)?))
    }
}

fn normalize_severity(rule_id: &str, value: &Value) -> AppResult<Severity> {
    let severity = match value {
        Value::String(s) => Severity::parse(s),
        Value::Number(n) => n.as_u64().and_then(Severity::from_level),
        _ => None
    };
    severity.ok_or_else(|| {
        config_error(format!("Rule '{}': unknown severity '{}'", rule_id, value))
    })
}

/// Built-in presets addressable from `extends`.
///
/// - `solidity:recommended` - every rule at its default severity
/// - `solidity:strict` - security findings promoted to errors, stylistic
///   findings promoted to warnings
/// - `solidity:minimal` - security rules only
pub fn builtin_presets() -> PresetMap {
    let mut presets = PresetMap::new();
    presets.insert("solidity:recommended".to_string(), RuleTable::new());

    let mut strict = RuleTable::new();
    for rule_id in [
        "security/avoid-low-level-calls",
        "security/no-inline-assembly",
        "security/not-rely-on-time",
        "security/check-send-result",
        "security/state-visibility",
        "security/func-visibility",
        "security/reentrancy",
        "security/compiler-version",
    ] {
        strict.insert(rule_id.to_string(), RuleEntry::severity(Severity::Error));
    }
    for rule_id in [
        "lint/boolean-equality",
        "lint/quotes",
        "lint/explicit-types",
        "lint/max-line-length",
        "gas/custom-errors",
        "gas/indexed-events",
        "best-practices/reason-string",
    ] {
        strict.insert(rule_id.to_string(), RuleEntry::severity(Severity::Warning));
    }
    presets.insert("solidity:strict".to_string(), strict);

    let mut minimal = RuleTable::new();
    for rule_id in [
        "gas/custom-errors",
        "gas/indexed-events",
        "gas/length-in-loops",
        "gas/strict-inequalities",
        "gas/small-strings",
        "gas/calldata-parameters",
        "gas/increment-by-one",
        "lint/boolean-equality",
        "lint/no-empty-blocks",
        "lint/no-unused-vars",
        "lint/quotes",
        "lint/no-console",
        "lint/max-line-length",
        "lint/code-complexity",
        "lint/function-max-lines",
        "lint/explicit-types",
        "best-practices/use-forbidden-name",
        "best-practices/max-states-count",
        "best-practices/no-global-import",
        "best-practices/payable-fallback",
        "best-practices/reason-string",
        "best-practices/contract-name-capwords",
        "best-practices/func-name-mixedcase",
        "best-practices/var-name-mixedcase",
        "best-practices/const-name-snakecase",
        "best-practices/event-name-capwords",
    ] {
        minimal.insert(rule_id.to_string(), RuleEntry::severity(Severity::Off));
    }
    presets.insert("solidity:minimal".to_string(), minimal);

    presets
}
