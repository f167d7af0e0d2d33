//! # Solidity Analyzer
//!
//! Static analysis for Solidity smart contracts.
//!
//! `solidity-analyzer` parses Solidity sources into an AST, runs an ordered
//! registry of independent rules against each file, aggregates structured
//! issues into a deterministic report, and can apply the textual fixes that
//! fixable rules attach to their findings.
//!
//! # Architecture
//!
//! The pipeline per file: **cache probe → parse → per-rule analyze →
//! sorted issues → cache store**. Files run on a bounded worker pool;
//! rules within one file run sequentially in registry order, so output is
//! identical across concurrency settings. Failures stay contained: a file
//! that does not parse is reported with its parse errors and no issues, a
//! rule that fails produces one internal diagnostic and the next rule still
//! runs.
//!
//! # Quick Start
//!
//! ```bash
//! # Analyze a project
//! solidity-analyzer check contracts/
//!
//! # CI integration with JSON output
//! solidity-analyzer check contracts/ -f json > findings.json
//!
//! # Preview and apply fixable issues
//! solidity-analyzer check contracts/ --diff
//! solidity-analyzer check contracts/ --fix --backup
//!
//! # List the rule catalog
//! solidity-analyzer rules
//! ```
//!
//! # Configuration
//!
//! A `.solidity-analyzer.json` file in the project root configures rule
//! severities, optionally starting from a preset:
//!
//! ```json
//! {
//!     "extends": "solidity:recommended",
//!     "rules": {
//!         "security/tx-origin": "error",
//!         "lint/max-line-length": ["info", { "maxLength": 100 }],
//!         "gas/strict-inequalities": "off"
//!     }
//! }
//! ```
//!
//! Severity spellings: `"off"`/`0`, `"warn"`/`"warning"`/`1`, `"error"`/`2`,
//! `"info"`. Presets: `solidity:recommended`, `solidity:strict`,
//! `solidity:minimal`.
//!
//! # Rule Categories
//!
//! | Prefix | Focus |
//! |--------|-------|
//! | `security/` | Dangerous constructs: `tx.origin`, low-level calls, reentrancy, timestamp dependence |
//! | `gas/` | Avoidable costs: revert strings, unindexed events, length reads in loops |
//! | `lint/` | Correctness and style: boolean equality, unused variables, complexity |
//! | `best-practices/` | Idiomatic Solidity: naming conventions, import hygiene, payable fallbacks |
//!
//! Plugins can contribute further rules and presets, namespaced as
//! `"<plugin>/<rule>"`; see [`plugin`].
//!
//! # Exit Codes
//!
//! - `0` - no findings at `ERROR` severity
//! - `1` - at least one `ERROR` finding
//! - `2` - invalid usage, or inputs that only produced parse errors
//!
//! # Modules
//!
//! - [`engine`] - orchestration: parsing, rule dispatch, aggregation
//! - [`rules`] - rule contract, registry and the built-in rule library
//! - [`context`] - per-file state handed to each rule
//! - [`ast`] / [`walker`] - the analyzed tree and its traversal
//! - [`parser`] - external parser interface and the bundled implementation
//! - [`fix`] - non-overlapping textual fix application
//! - [`cache`] - fingerprinted result cache
//! - [`plugin`] - external rule/preset bundles
//! - [`config`] - effective configuration and presets
//! - [`output`] - report formatting
//! - [`error`] - error types and constructors

pub mod app;
pub mod ast;
pub mod cache;
pub mod cli;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod fix;
pub mod output;
pub mod parser;
pub mod plugin;
pub mod rules;
pub mod source;
pub mod walker;
