//! Plugin bundles: externally authored rules and presets.
//!
//! A plugin is a declarative [`PluginBundle`] value carrying metadata, rule
//! constructors and configuration presets, registered in-process. The
//! loader validates the bundle shape, namespaces every contributed rule id
//! as `"<plugin>/<rule>"` and every preset as `"<plugin>/<preset>"`, and
//! merges the result into the registry and preset map.
//!
//! In strict mode (the default) any validation error aborts the bundle
//! without registering anything. In lenient mode only the offending
//! entries are dropped and the errors are recorded on the load report.
//! Optional `setup`/`teardown` hooks run around the plugin lifetime:
//! `setup` before registration, `teardown` when the loader shuts down.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::{
    config::{PresetMap, RuleTable},
    error::{AppResult, plugin_error},
    rules::{Rule, RuleRegistry}
};

static VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+\.\d+$").expect("valid version pattern"));

static KEBAB_CASE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9]*(-[a-z0-9]+)*$").expect("valid kebab pattern"));

/// Constructor for one plugin-contributed rule.
pub type RuleConstructor = fn() -> Box<dyn Rule>;

/// A rule contributed by a plugin, keyed by its kebab-case id.
pub struct PluginRule {
    pub id:          String,
    pub constructor: RuleConstructor
}

/// A rule/preset bundle contributed by an external plugin.
pub struct PluginBundle {
    /// Plugin name; becomes the namespace of contributed ids
    pub name:     String,
    /// Semantic version, `major.minor.patch`
    pub version:  String,
    pub rules:    Vec<PluginRule>,
    /// Presets addressable as `"<plugin>/<preset>"` from `extends`
    pub presets:  IndexMap<String, RuleTable>,
    /// Invoked once before the bundle's rules are registered
    pub setup:    Option<fn() -> AppResult<()>>,
    /// Invoked when the loader shuts down
    pub teardown: Option<fn()>
}

impl PluginBundle {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name:     name.into(),
            version:  version.into(),
            rules:    Vec::new(),
            presets:  IndexMap::new(),
            setup:    None,
            teardown: None
        }
    }

    pub fn with_rule(mut self, id: impl Into<String>, constructor: RuleConstructor) -> Self {
        self.rules.push(PluginRule {
            id: id.into(),
            constructor
        });
        self
    }

    pub fn with_preset(mut self, name: impl Into<String>, rules: RuleTable) -> Self {
        self.presets.insert(name.into(), rules);
        self
    }
}

/// What one [`PluginLoader::load`] call registered.
#[derive(Debug, Clone, Default)]
pub struct PluginLoadReport {
    pub plugin:  String,
    /// Effective (namespaced) rule ids registered
    pub rules:   Vec<String>,
    /// Effective (namespaced) preset names registered
    pub presets: Vec<String>,
    /// Entries dropped in lenient mode, with reasons
    pub errors:  Vec<String>
}

/// Validates and merges plugin bundles.
pub struct PluginLoader {
    strict:    bool,
    loaded:    Vec<String>,
    teardowns: Vec<fn()>
}

impl Default for PluginLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginLoader {
    /// Strict loader: any validation error aborts the bundle.
    pub fn new() -> Self {
        Self {
            strict:    true,
            loaded:    Vec::new(),
            teardowns: Vec::new()
        }
    }

    /// Lenient loader: invalid entries are dropped and recorded.
    pub fn lenient() -> Self {
        Self {
            strict:    false,
            loaded:    Vec::new(),
            teardowns: Vec::new()
        }
    }

    /// Names of successfully loaded plugins, in load order.
    pub fn loaded(&self) -> &[String] {
        &self.loaded
    }

    /// Validate a bundle and merge its rules and presets.
    ///
    /// # Errors
    ///
    /// Bundle-level problems (empty name, bad version, duplicate plugin
    /// name, failed `setup`) always fail. Entry-level problems fail in
    /// strict mode and are recorded on the report in lenient mode.
    pub fn load(
        &mut self,
        bundle: PluginBundle,
        registry: &mut RuleRegistry,
        presets: &mut PresetMap
    ) -> AppResult<PluginLoadReport> {
        if bundle.name.trim().is_empty() {
            return Err(plugin_error("<unnamed>", "plugin name must be a non-empty string"));
        }
        if self.loaded.iter().any(|name| name == &bundle.name) {
            return Err(plugin_error(&bundle.name, "plugin is already loaded"));
        }
        if !VERSION_PATTERN.is_match(&bundle.version) {
            return Err(plugin_error(
                &bundle.name,
                format!("version '{}' must match <major>.<minor>.<patch>", bundle.version)
            ));
        }

        let mut report = PluginLoadReport {
            plugin: bundle.name.clone(),
            ..PluginLoadReport::default()
        };
        let mut valid_rules: Vec<(String, Box<dyn Rule>)> = Vec::new();
        let mut valid_presets: Vec<(String, RuleTable)> = Vec::new();

        for rule in &bundle.rules {
            match self.validate_rule(&bundle.name, rule, registry) {
                Ok(entry) => valid_rules.push(entry),
                Err(error) => {
                    if self.strict {
                        return Err(error);
                    }
                    report.errors.push(error.to_string());
                }
            }
        }

        for (preset_name, table) in &bundle.presets {
            if !KEBAB_CASE_PATTERN.is_match(preset_name) {
                let error = plugin_error(
                    &bundle.name,
                    format!("preset name '{}' must be kebab-case", preset_name)
                );
                if self.strict {
                    return Err(error);
                }
                report.errors.push(error.to_string());
                continue;
            }
            valid_presets.push((
                format!("{}/{}", bundle.name, preset_name),
                table.clone()
            ));
        }

        if let Some(setup) = bundle.setup {
            setup().map_err(|e| plugin_error(&bundle.name, format!("setup failed: {}", e)))?;
        }

        for (effective_id, rule) in valid_rules {
            registry.register_as(effective_id.clone(), rule)?;
            report.rules.push(effective_id);
        }
        for (effective_name, table) in valid_presets {
            presets.insert(effective_name.clone(), table);
            report.presets.push(effective_name);
        }

        if let Some(teardown) = bundle.teardown {
            self.teardowns.push(teardown);
        }
        self.loaded.push(bundle.name);
        Ok(report)
    }

    fn validate_rule(
        &self,
        plugin_name: &str,
        rule: &PluginRule,
        registry: &RuleRegistry
    ) -> AppResult<(String, Box<dyn Rule>)> {
        if !KEBAB_CASE_PATTERN.is_match(&rule.id) {
            return Err(plugin_error(
                plugin_name,
                format!("rule id '{}' must be kebab-case", rule.id)
            ));
        }
        let instance = (rule.constructor)();
        if instance.meta().id.trim().is_empty() {
            return Err(plugin_error(
                plugin_name,
                format!("rule '{}' exposes no metadata id", rule.id)
            ));
        }
        let effective_id = format!("{}/{}", plugin_name, rule.id);
        if registry.get(&effective_id).is_some() {
            return Err(plugin_error(
                plugin_name,
                format!("rule '{}' is already registered", effective_id)
            ));
        }
        Ok((effective_id, instance))
    }

    /// Run every registered teardown hook, once.
    pub fn shutdown(&mut self) {
        for teardown in self.teardowns.drain(..) {
            teardown();
        }
    }
}

impl Drop for PluginLoader {
    fn drop(&mut self) {
        self.shutdown();
    }
}
