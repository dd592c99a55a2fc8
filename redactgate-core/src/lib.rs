// redactgate-core/src/lib.rs
//! # RedactGate Core Library
//!
//! `redactgate-core` provides the rule store and redaction engine behind RedactGate.
//! It defines the data structures for redaction rules and rule sets, manages their
//! persistence through a pluggable `StorageBackend` trait, and implements the
//! sequential engine that applies an ordered rule set to text.
//!
//! The library is transport-agnostic. It knows nothing about CLIs, servers, or
//! terminals; callers hand it text and rule identifiers and receive structured
//! results back.
//!
//! ## Modules
//!
//! * `rules`: Defines `Rule`, `RuleSet`, and the `RuleRegistry` document, plus
//!   identifier and placeholder derivation.
//! * `storage`: The `StorageBackend` trait with JSON-file and in-memory
//!   implementations.
//! * `store`: The `RuleStore`, a thread-safe registry with compiled-pattern
//!   caching and atomic persistence.
//! * `engine`: The `RedactionEngine` that applies resolved rules to text in
//!   priority order.
//! * `report`: Result and report types describing what the engine did.
//! * `service`: The `RedactionService` facade bundling a store and an engine.
//! * `errors`: The `RedactGateError` taxonomy shared by every fallible operation.
//!
//! ## Public API
//!
//! **Rules & Registry**
//!
//! * [`Rule`] / [`RuleSet`]: A single redaction rule and a named, ordered grouping.
//! * [`RuleSpec`] / [`RuleSetSpec`]: Caller-supplied creation payloads.
//! * [`RulePatch`] / [`RuleSetPatch`]: Partial updates for existing entries.
//! * [`RuleStore`]: Validated, persisted registry access.
//!
//! **Engine & Results**
//!
//! * [`RedactionEngine`]: Applies a rule set to text, one rule at a time.
//! * [`RedactionResult`]: The redacted text plus per-match report entries.
//! * [`EngineOptions`]: Tunables such as the per-rule execution budget.
//!
//! **Service Facade**
//!
//! * [`RedactionService`]: One handle exposing store management and text
//!   processing together.
//!
//! ## Usage Example
//!
//! ```rust
//! use redactgate_core::{MemoryBackend, RedactionService};
//!
//! fn main() -> Result<(), redactgate_core::RedactGateError> {
//!     // 1. Open a service over an in-memory backend. An empty backend is
//!     //    seeded with the built-in default rules.
//!     let service = RedactionService::open(Box::new(MemoryBackend::new()))?;
//!
//!     // 2. Process some text against the default rule set.
//!     let result = service.process_text(
//!         "My email is test@example.com and my SSN is 123-45-6789.",
//!         None,
//!     )?;
//!
//!     assert_eq!(
//!         result.redacted_text,
//!         "My email is <EMAIL> and my SSN is <SSN>.",
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`RedactGateError`], which distinguishes
//! validation failures, missing rules or rule sets, and persistence problems.
//! A rule that exceeds its execution budget during processing is reported
//! inside the [`RedactionResult`] rather than failing the whole request.
//!
//! ---
//! License: MIT OR Apache-2.0

pub mod engine;
pub mod errors;
pub mod report;
pub mod rules;
pub mod service;
pub mod storage;
pub mod store;

/// Re-exports the engine and its options.
pub use engine::{EngineOptions, RedactionEngine};

/// Re-exports the shared error taxonomy.
pub use errors::{RedactGateError, RuleExecutionError};

/// Re-exports result and report types produced by the engine.
pub use report::{redact_sensitive, RedactionMatch, RedactionResult, ReportEntry, RuleFailure};

/// Re-exports rule and rule-set types together with the helpers that derive
/// identifiers and placeholders from rule names.
pub use rules::{
    compile_condition,
    default_placeholder,
    derive_id,
    Rule,
    RuleAction,
    RulePatch,
    RuleRegistry,
    RuleSet,
    RuleSetPatch,
    RuleSetSpec,
    RuleSpec,
    MAX_PATTERN_LENGTH,
    MAX_PRIORITY,
};

/// Re-exports the service facade for embedding callers.
pub use service::{Health, RedactionService};

/// Re-exports the storage backends and the path helper for the default
/// registry location.
pub use storage::{default_registry_path, JsonFileBackend, MemoryBackend, StorageBackend};

/// Re-exports the rule store and its resolved-rule view.
pub use store::{ActiveRule, RuleStore};
