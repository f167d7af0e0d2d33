//! Static analysis rule engine for Solidity sources.
//!
//! This module provides the rule abstraction and the ordered registry the
//! analysis engine runs. Rules are implemented as types that implement the
//! [`Rule`] trait and report findings through the per-file
//! [`AnalysisContext`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌─────────────┐
//! │  Solidity   │────▶│   Engine     │────▶│   Report    │
//! │   files     │     │ (per file)   │     │ (aggregate) │
//! └─────────────┘     └──────────────┘     └─────────────┘
//!                            │
//!                     ┌──────┴──────┐
//!                     │  Registry   │
//!                     │ (in order)  │
//!                     └─────────────┘
//! ```
//!
//! The registry preserves registration order; the engine runs rules in that
//! order per file, so results are deterministic.
//!
//! # Rule Categories
//!
//! - **Security** (`security/*`) - Dangerous constructs and authorization
//! - **Gas** (`gas/*`) - Avoidable gas costs
//! - **Lint** (`lint/*`) - Stylistic and correctness lints
//! - **Best practices** (`best-practices/*`) - Idiomatic Solidity
//!
//! # Implementing Custom Rules
//!
//! ```ignore
//! use solidity_analyzer::{
//!     context::{AnalysisContext, IssueDraft},
//!     error::AppResult,
//!     rules::{Rule, RuleCategory, RuleMeta, Severity}
//! };
//!
//! pub struct MyRule;
//!
//! impl Rule for MyRule {
//!     fn meta(&self) -> RuleMeta {
//!         RuleMeta {
//!             id:             "custom/my-rule",
//!             title:          "My custom rule",
//!             description:    "Detects something project-specific",
//!             recommendation: "Do the other thing",
//!             severity:       Severity::Warning,
//!             category:       RuleCategory::Lint,
//!             fixable:        false
//!         }
//!     }
//!
//!     fn analyze(&self, context: &mut AnalysisContext<'_>) -> AppResult<()> {
//!         // Walk context.ast(), call context.report(...) for findings.
//!         Ok(())
//!     }
//! }
//! ```

mod best_practices;
mod gas;
mod lint;
mod security;
mod types;

use compact_str::CompactString;
use indexmap::IndexMap;
pub use types::{
    AnalysisReport, FileReport, Fix, Issue, ReportSummary, RuleCategory, RuleMeta, Severity
};

use crate::{
    context::AnalysisContext,
    error::{AppResult, duplicate_rule_error}
};

/// Trait for implementing Solidity analysis rules.
///
/// Rules are stateless analyzers that examine a single file through its
/// [`AnalysisContext`] and report any findings. They must be `Send + Sync`
/// because the engine shares the registry across its worker pool; a single
/// file's rules always run sequentially.
pub trait Rule: Send + Sync {
    /// Returns metadata about this rule. Frozen at construction.
    fn meta(&self) -> RuleMeta;

    /// Analyzes one file, reporting findings through the context.
    ///
    /// # Errors
    ///
    /// An error (or panic) aborts only this rule for this file; the engine
    /// records an internal-rule-error diagnostic and continues.
    fn analyze(&self, context: &mut AnalysisContext<'_>) -> AppResult<()>;
}

/// Ordered catalog of rule instances keyed by effective rule id.
///
/// Iteration order equals registration order. Plugin rules register under
/// their namespaced id (`"<plugin>/<rule>"`).
pub struct RuleRegistry {
    rules: IndexMap<CompactString, Box<dyn Rule>>
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::with_builtin_rules()
    }
}

impl RuleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            rules: IndexMap::new()
        }
    }

    /// Create a registry containing every built-in rule.
    ///
    /// Individual registration failures are logged and skipped; they do not
    /// abort startup.
    pub fn with_builtin_rules() -> Self {
        let mut registry = Self::new();
        for rule in builtin_rules() {
            let id = rule.meta().id;
            if let Err(error) = registry.register(rule) {
                eprintln!("warning: skipping rule '{}': {}", id, error);
            }
        }
        registry
    }

    /// Register a rule under its metadata id.
    ///
    /// # Errors
    ///
    /// Fails if the id is already registered.
    pub fn register(&mut self, rule: Box<dyn Rule>) -> AppResult<()> {
        let id = CompactString::new(rule.meta().id);
        self.register_as(id, rule)
    }

    /// Register a rule under an explicit effective id (plugin namespacing).
    ///
    /// # Errors
    ///
    /// Fails if the id is already registered.
    pub fn register_as(&mut self, id: impl Into<CompactString>, rule: Box<dyn Rule>) -> AppResult<()> {
        let id = id.into();
        if self.rules.contains_key(&id) {
            return Err(duplicate_rule_error(&id));
        }
        self.rules.insert(id, rule);
        Ok(())
    }

    pub fn get(&self, rule_id: &str) -> Option<&dyn Rule> {
        self.rules.get(rule_id).map(Box::as_ref)
    }

    /// Rules in registration order with their effective ids.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn Rule)> {
        self.rules.iter().map(|(id, rule)| (id.as_str(), rule.as_ref()))
    }

    pub fn all_by_category(&self, category: RuleCategory) -> Vec<&dyn Rule> {
        self.rules
            .values()
            .map(Box::as_ref)
            .filter(|rule| rule.meta().category == category)
            .collect()
    }

    pub fn all_by_severity(&self, severity: Severity) -> Vec<&dyn Rule> {
        self.rules
            .values()
            .map(Box::as_ref)
            .filter(|rule| rule.meta().severity == severity)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// All built-in rules in their canonical registration order.
fn builtin_rules() -> Vec<Box<dyn Rule>> {
    vec![
        // Security rules
        Box::new(security::TxOrigin),
        Box::new(security::AvoidLowLevelCalls),
        Box::new(security::AvoidSha3),
        Box::new(security::AvoidSuicide),
        Box::new(security::AvoidThrow),
        Box::new(security::NoInlineAssembly),
        Box::new(security::NotRelyOnTime),
        Box::new(security::NotRelyOnBlockHash),
        Box::new(security::CheckSendResult),
        Box::new(security::AvoidCallValue),
        Box::new(security::StateVisibility),
        Box::new(security::FuncVisibility),
        Box::new(security::MultipleSends),
        Box::new(security::NoComplexFallback),
        Box::new(security::Reentrancy),
        Box::new(security::CompilerVersion),
        // Gas rules
        Box::new(gas::CustomErrors),
        Box::new(gas::IndexedEvents),
        Box::new(gas::LengthInLoops),
        Box::new(gas::StrictInequalities),
        Box::new(gas::SmallStrings),
        Box::new(gas::CalldataParameters),
        Box::new(gas::IncrementByOne),
        // Lint rules
        Box::new(lint::BooleanEquality),
        Box::new(lint::NoEmptyBlocks),
        Box::new(lint::NoUnusedVars),
        Box::new(lint::Quotes),
        Box::new(lint::NoConsole),
        Box::new(lint::MaxLineLength),
        Box::new(lint::CodeComplexity),
        Box::new(lint::FunctionMaxLines),
        Box::new(lint::ExplicitTypes),
        // Best practice rules
        Box::new(best_practices::UseForbiddenName),
        Box::new(best_practices::MaxStatesCount),
        Box::new(best_practices::NoGlobalImport),
        Box::new(best_practices::PayableFallback),
        Box::new(best_practices::ReasonString),
        Box::new(best_practices::ContractNameCapwords),
        Box::new(best_practices::FuncNameMixedcase),
        Box::new(best_practices::VarNameMixedcase),
        Box::new(best_practices::ConstNameSnakecase),
        Box::new(best_practices::EventNameCapwords),
    ]
}
