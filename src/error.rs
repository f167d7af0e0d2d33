//! Error types and constructors for the Solidity analyzer.
//!
//! This module provides error construction functions that create properly
//! formatted [`AppError`] instances with context-specific messages.
//!
//! # Error Categories
//!
//! - **File errors**: IO failures when reading source or config files
//! - **Config errors**: Invalid configuration files or severity values
//! - **Registry errors**: Duplicate rule registration
//! - **Lifecycle errors**: Misuse of the per-file analysis context
//! - **Plugin errors**: Bundle validation or instantiation failures
//! - **Cache errors**: Snapshot IO failures
//! - **Fix errors**: Failures while writing fixed sources back to disk
//!
//! Parse failures and rule execution failures are deliberately *not*
//! represented here: both are recorded on the per-file report and never
//! propagate across files or rules.

pub use masterror::{AppError, AppResult};

/// Create file read error with path context.
///
/// # Arguments
///
/// * `path` - The file path that failed to read
/// * `source` - The underlying IO error
pub fn file_read_error(path: &str, source: std::io::Error) -> AppError {
    AppError::internal(format!("Failed to read file '{}': {}", path, source))
}

/// Create config error
pub fn config_error(message: impl Into<String>) -> AppError {
    AppError::bad_request(message.into())
}

/// Create error for registering a rule id that is already present
pub fn duplicate_rule_error(rule_id: &str) -> AppError {
    AppError::bad_request(format!("Rule '{}' is already registered", rule_id))
}

/// Create error for `report` calls outside an active `analyze` invocation
pub fn rule_lifecycle_error(message: impl Into<String>) -> AppError {
    AppError::internal(message.into())
}

/// Create plugin validation or instantiation error with bundle context
pub fn plugin_error(plugin_name: &str, message: impl Into<String>) -> AppError {
    AppError::bad_request(format!("Plugin '{}': {}", plugin_name, message.into()))
}

/// Create cache error
pub fn cache_error(message: impl Into<String>) -> AppError {
    AppError::service(message.into())
}

/// Create error for fix application or write-back failures
pub fn fix_error(path: &str, message: impl Into<String>) -> AppError {
    AppError::internal(format!("Failed to fix '{}': {}", path, message.into()))
}
