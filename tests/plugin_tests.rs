// SPDX-License-Identifier: MIT

use solidity_analyzer::{
    config::{AnalyzerConfig, RuleEntry, RuleTable, builtin_presets},
    context::{AnalysisContext, IssueDraft},
    engine::{AnalysisEngine, CancellationToken},
    error::AppResult,
    plugin::{PluginBundle, PluginLoader},
    rules::{Rule, RuleCategory, RuleMeta, RuleRegistry, Severity}
};

struct NoSelfdestruct;

impl Rule for NoSelfdestruct {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id:             "no-selfdestruct",
            title:          "No selfdestruct",
            description:    "Flags selfdestruct calls",
            recommendation: "Remove the selfdestruct",
            severity:       Severity::Error,
            category:       RuleCategory::Security,
            fixable:        false
        }
    }

    fn analyze(&self, context: &mut AnalysisContext<'_>) -> AppResult<()> {
        let mut drafts = Vec::new();
        solidity_analyzer::walker::for_each_node(context.ast(), |node, _| {
            if node.is_call_to("selfdestruct") {
                drafts.push(IssueDraft::for_node(node, "selfdestruct call"));
            }
            solidity_analyzer::walker::VisitControl::Continue
        });
        for draft in drafts {
            context.report(draft)?;
        }
        Ok(())
    }
}

fn no_selfdestruct() -> Box<dyn Rule> {
    Box::new(NoSelfdestruct)
}

#[test]
fn test_plugin_rule_runs_under_namespaced_id() {
    let mut registry = RuleRegistry::with_builtin_rules();
    let mut presets = builtin_presets();
    let mut loader = PluginLoader::new();
    loader
        .load(
            PluginBundle::new("hardening", "1.2.3").with_rule("no-selfdestruct", no_selfdestruct),
            &mut registry,
            &mut presets
        )
        .unwrap();

    let engine = AnalysisEngine::new().with_registry(registry);
    let config = AnalyzerConfig::default();
    let report = engine.analyze_source(
        "test.sol",
        "contract X { function f(address payable a) public { selfdestruct(a); } }\n",
        &config,
        0,
        0,
        &CancellationToken::new()
    );

    let finding = report
        .issues
        .iter()
        .find(|i| i.rule_id == "hardening/no-selfdestruct")
        .expect("plugin finding under namespaced id");
    assert_eq!(finding.severity, Severity::Error);
}

#[test]
fn test_plugin_preset_extends() {
    let mut registry = RuleRegistry::with_builtin_rules();
    let mut presets = builtin_presets();
    let mut loader = PluginLoader::new();

    let mut quiet = RuleTable::new();
    quiet.insert(
        "security/state-visibility".to_string(),
        RuleEntry::severity(Severity::Off)
    );
    loader
        .load(
            PluginBundle::new("hardening", "1.2.3").with_preset("quiet", quiet),
            &mut registry,
            &mut presets
        )
        .unwrap();

    let config = AnalyzerConfig::from_json_value(
        &serde_json::json!({ "extends": "hardening/quiet" }),
        &presets
    )
    .unwrap();
    assert_eq!(
        config.severity_for("security/state-visibility", Severity::Warning),
        Severity::Off
    );
}

#[test]
fn test_plugin_severity_configurable_like_builtin() {
    let mut registry = RuleRegistry::with_builtin_rules();
    let mut presets = builtin_presets();
    let mut loader = PluginLoader::new();
    loader
        .load(
            PluginBundle::new("hardening", "1.2.3").with_rule("no-selfdestruct", no_selfdestruct),
            &mut registry,
            &mut presets
        )
        .unwrap();

    let engine = AnalysisEngine::new().with_registry(registry);
    let config = AnalyzerConfig::from_json_value(
        &serde_json::json!({ "rules": { "hardening/no-selfdestruct": "warning" } }),
        &presets
    )
    .unwrap();
    let report = engine.analyze_source(
        "test.sol",
        "contract X { function f(address payable a) public { selfdestruct(a); } }\n",
        &config,
        0,
        0,
        &CancellationToken::new()
    );
    let finding = report
        .issues
        .iter()
        .find(|i| i.rule_id == "hardening/no-selfdestruct")
        .expect("plugin finding");
    assert_eq!(finding.severity, Severity::Warning);
}
