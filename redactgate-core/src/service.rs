// redactgate-core/src/service.rs
//! `service.rs`
//! One-stop facade over the store and engine for embedding callers.
//! A transport (CLI, RPC server) holds one `RedactionService` and maps its
//! requests onto these methods one-to-one.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::engine::{EngineOptions, RedactionEngine};
use crate::errors::RedactGateError;
use crate::report::RedactionResult;
use crate::rules::{Rule, RulePatch, RuleSet, RuleSetPatch, RuleSetSpec, RuleSpec};
use crate::storage::StorageBackend;
use crate::store::RuleStore;

/// Service health document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub version: String,
}

/// Facade bundling a [`RuleStore`] with a [`RedactionEngine`].
pub struct RedactionService {
    store: Arc<RuleStore>,
    engine: RedactionEngine,
}

impl RedactionService {
    /// Opens the service over a storage backend with default engine options.
    pub fn open(backend: Box<dyn StorageBackend>) -> Result<Self, RedactGateError> {
        Self::with_options(backend, EngineOptions::default())
    }

    pub fn with_options(
        backend: Box<dyn StorageBackend>,
        options: EngineOptions,
    ) -> Result<Self, RedactGateError> {
        let store = Arc::new(RuleStore::open(backend)?);
        let engine = RedactionEngine::with_options(Arc::clone(&store), options);
        Ok(Self { store, engine })
    }

    /// Redacts `text` against a rule set (`None` selects the default set).
    pub fn process_text(
        &self,
        text: &str,
        rule_set_id: Option<&str>,
    ) -> Result<RedactionResult, RedactGateError> {
        self.engine.process(text, rule_set_id)
    }

    pub fn list_rules(&self) -> Vec<Rule> {
        self.store.list_rules()
    }

    pub fn get_rule(&self, id: &str) -> Result<Rule, RedactGateError> {
        self.store.get_rule(id)
    }

    pub fn add_rule(&self, spec: RuleSpec) -> Result<Rule, RedactGateError> {
        self.store.add_rule(spec)
    }

    pub fn update_rule(&self, id: &str, patch: RulePatch) -> Result<Rule, RedactGateError> {
        self.store.update_rule(id, patch)
    }

    pub fn delete_rule(&self, id: &str) -> Result<(), RedactGateError> {
        self.store.delete_rule(id)
    }

    pub fn toggle_rule(&self, id: &str, enabled: bool) -> Result<Rule, RedactGateError> {
        self.store.toggle_rule(id, enabled)
    }

    pub fn list_rule_sets(&self) -> Vec<RuleSet> {
        self.store.list_rule_sets()
    }

    pub fn get_rule_set(&self, id: &str) -> Result<RuleSet, RedactGateError> {
        self.store.get_rule_set(id)
    }

    pub fn add_rule_set(&self, spec: RuleSetSpec) -> Result<RuleSet, RedactGateError> {
        self.store.add_rule_set(spec)
    }

    pub fn update_rule_set(
        &self,
        id: &str,
        patch: RuleSetPatch,
    ) -> Result<RuleSet, RedactGateError> {
        self.store.update_rule_set(id, patch)
    }

    pub fn delete_rule_set(&self, id: &str) -> Result<(), RedactGateError> {
        self.store.delete_rule_set(id)
    }

    /// The rule set applied when a request names none.
    pub fn default_rule_set(&self) -> Result<RuleSet, RedactGateError> {
        let id = self.store.default_rule_set_id();
        self.store.get_rule_set(&id)
    }

    pub fn default_rule_set_id(&self) -> String {
        self.store.default_rule_set_id()
    }

    pub fn set_default_rule_set(&self, id: &str) -> Result<(), RedactGateError> {
        self.store.set_default_rule_set(id)
    }

    pub fn health(&self) -> Health {
        Health {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Direct access to the shared store, for callers that build their own
    /// engines on top of it.
    pub fn store(&self) -> &Arc<RuleStore> {
        &self.store
    }
}
