//! errors.rs - Custom error types for the redactgate-core library.
//!
//! This module defines a structured error enum for the library, providing
//! specific, actionable error types that can be handled programmatically.
//!
//! License: MIT OR Apache-2.0

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// This enum represents all possible error types in the `redactgate-core` library.
///
/// By using `#[non_exhaustive]`, we signal to consumers of this library that
/// new variants may be added in future versions. This prevents them from
/// matching all variants exhaustively, thus avoiding breaking changes.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RedactGateError {
    /// A rule or rule set payload failed validation. Nothing was changed.
    #[error("Validation failed for `{field}`: {reason}")]
    Validation { field: String, reason: String },

    #[error("Rule '{0}' not found")]
    RuleNotFound(String),

    #[error("Rule set '{0}' not found or disabled")]
    RuleSetNotFound(String),

    /// A mutation could not be made durable. The in-memory state was rolled
    /// back, so the caller may safely retry.
    #[error("Failed to persist rule registry at {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A persisted registry document could not be decoded, or violates an
    /// invariant the store enforces on every write (for example a stored
    /// condition that no longer compiles).
    #[error("Rule registry is invalid: {0}")]
    Registry(String),
}

impl RedactGateError {
    pub(crate) fn validation(field: &str, reason: impl Into<String>) -> Self {
        RedactGateError::Validation {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Failure of a single rule during a redaction run.
///
/// These never abort a `process` call: the engine skips the rule and records
/// the failure in the match report.
#[derive(Error, Debug)]
pub enum RuleExecutionError {
    #[error("scan exceeded the {}ms execution budget", .0.as_millis())]
    Timeout(Duration),
}
