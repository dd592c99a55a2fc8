//! store.rs - The rule store: owns the registry and keeps it consistent.
//!
//! All rule and rule-set mutations go through here. Every mutation is applied
//! to a scratch copy of the registry, persisted through the injected backend,
//! and only then committed to memory, all under the write lock; a persistence
//! failure therefore rolls back by never committing. Reads take a brief read
//! lock and work on cloned snapshots, so redaction runs never hold the lock
//! while scanning.
//!
//! Compiled patterns are cached alongside the registry and handed out as
//! `Arc<Regex>` so snapshots stay cheap.
//!
//! License: MIT OR Apache-2.0

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use regex::Regex;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, RwLock};

use crate::errors::RedactGateError;
use crate::rules::{
    self, compile_condition, derive_id, Rule, RulePatch, RuleRegistry, RuleSet, RuleSetPatch,
    RuleSetSpec, RuleSpec,
};
use crate::storage::StorageBackend;

/// A rule ready for matching: its metadata plus the precompiled pattern.
#[derive(Debug, Clone)]
pub struct ActiveRule {
    pub rule: Rule,
    pub regex: Arc<Regex>,
}

struct StoreState {
    registry: RuleRegistry,
    compiled: HashMap<String, Arc<Regex>>,
}

/// Thread-safe store for rules and rule sets, persisted through an injected
/// [`StorageBackend`]. Multiple engines may share one store behind an `Arc`.
pub struct RuleStore {
    backend: Box<dyn StorageBackend>,
    state: RwLock<StoreState>,
}

// The boxed backend rules out `derive(Debug)`; format a registry summary.
impl fmt::Debug for RuleStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read().unwrap();
        f.debug_struct("RuleStore")
            .field("rules", &state.registry.rules.len())
            .field("rule_sets", &state.registry.rule_sets.len())
            .field("default_rule_set", &state.registry.default_rule_set)
            .finish_non_exhaustive()
    }
}

/// Shape of the embedded default-rules catalog.
#[derive(Debug, Deserialize)]
struct SeedCatalog {
    rules: Vec<RuleSpec>,
    rule_set: RuleSetSpec,
}

impl RuleStore {
    /// Opens the store over the given backend. An empty backend is seeded
    /// with the built-in default rules; an existing document is validated
    /// (every stored condition must still compile) before it is served.
    pub fn open(backend: Box<dyn StorageBackend>) -> Result<Self, RedactGateError> {
        let registry = match backend.load()? {
            Some(registry) => {
                info!(
                    "Loaded rule registry: {} rules, {} rule sets.",
                    registry.rules.len(),
                    registry.rule_sets.len()
                );
                validate_registry(&registry)?;
                registry
            }
            None => {
                info!("No rule registry found; seeding built-in default rules.");
                let registry = default_registry()?;
                backend.persist(&registry)?;
                registry
            }
        };

        let compiled = compile_registry(&registry)?;
        Ok(Self {
            backend,
            state: RwLock::new(StoreState { registry, compiled }),
        })
    }

    /// Runs a mutation against a scratch copy of the state, persists the
    /// result, and commits it. Nothing changes if either step fails.
    fn mutate<T>(
        &self,
        apply: impl FnOnce(&mut RuleRegistry, &mut HashMap<String, Arc<Regex>>) -> Result<T, RedactGateError>,
    ) -> Result<T, RedactGateError> {
        let mut state = self.state.write().unwrap();
        let mut registry = state.registry.clone();
        let mut compiled = state.compiled.clone();

        let out = apply(&mut registry, &mut compiled)?;
        self.backend.persist(&registry)?;

        state.registry = registry;
        state.compiled = compiled;
        Ok(out)
    }

    /// Adds a rule. The id is taken from the spec when supplied (and must be
    /// unused) or derived from the name; the new rule also joins the default
    /// rule set so it participates in default processing.
    pub fn add_rule(&self, spec: RuleSpec) -> Result<Rule, RedactGateError> {
        self.mutate(|registry, compiled| {
            let now = Utc::now();
            let (rule, regex) = materialize_rule(registry, spec, now)?;

            let default_id = registry.default_rule_set.clone();
            if let Some(set) = registry.rule_sets.get_mut(&default_id) {
                // A deleted rule leaves its reference behind; re-adding the
                // same id must not double it.
                if !set.rules.contains(&rule.id) {
                    set.rules.push(rule.id.clone());
                    set.updated_at = now;
                }
            }

            compiled.insert(rule.id.clone(), Arc::new(regex));
            registry.rules.insert(rule.id.clone(), rule.clone());
            info!("Added rule '{}' ({}).", rule.name, rule.id);
            Ok(rule)
        })
    }

    /// Applies the supplied fields of `patch` to an existing rule. A changed
    /// condition must compile and a changed priority must be in range, or the
    /// whole update is rejected.
    pub fn update_rule(&self, id: &str, patch: RulePatch) -> Result<Rule, RedactGateError> {
        self.mutate(|registry, compiled| {
            let rule = registry
                .rules
                .get_mut(id)
                .ok_or_else(|| RedactGateError::RuleNotFound(id.to_string()))?;

            if let Some(name) = patch.name {
                rules::validate_name(&name)?;
                rule.name = name;
            }
            if let Some(description) = patch.description {
                rule.description = description;
            }
            if let Some(condition) = patch.condition {
                let regex = compile_condition(&condition)?;
                compiled.insert(id.to_string(), Arc::new(regex));
                rule.condition = condition;
            }
            if let Some(action) = patch.action {
                rule.action = action;
            }
            if let Some(replacement) = patch.replacement {
                rule.replacement = replacement;
            }
            if let Some(parameters) = patch.parameters {
                rule.parameters = parameters;
            }
            if let Some(enabled) = patch.enabled {
                rule.enabled = enabled;
            }
            if let Some(priority) = patch.priority {
                rules::validate_priority(priority)?;
                rule.priority = priority;
            }
            rule.updated_at = Utc::now();
            debug!("Updated rule '{}'.", id);
            Ok(rule.clone())
        })
    }

    /// Deletes a rule. Rule sets keep their reference to the id; resolution
    /// skips references with no backing rule.
    pub fn delete_rule(&self, id: &str) -> Result<(), RedactGateError> {
        self.mutate(|registry, compiled| {
            if registry.rules.remove(id).is_none() {
                return Err(RedactGateError::RuleNotFound(id.to_string()));
            }
            compiled.remove(id);
            info!("Deleted rule '{}'.", id);
            Ok(())
        })
    }

    pub fn get_rule(&self, id: &str) -> Result<Rule, RedactGateError> {
        let state = self.state.read().unwrap();
        state
            .registry
            .rules
            .get(id)
            .cloned()
            .ok_or_else(|| RedactGateError::RuleNotFound(id.to_string()))
    }

    /// Snapshot of every rule, ordered by priority (descending) and id.
    pub fn list_rules(&self) -> Vec<Rule> {
        let state = self.state.read().unwrap();
        let mut rules: Vec<Rule> = state.registry.rules.values().cloned().collect();
        rules.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id)));
        rules
    }

    /// Enables or disables a rule. Disabled rules are retained and listed but
    /// never matched.
    pub fn toggle_rule(&self, id: &str, enabled: bool) -> Result<Rule, RedactGateError> {
        self.mutate(|registry, _| {
            let rule = registry
                .rules
                .get_mut(id)
                .ok_or_else(|| RedactGateError::RuleNotFound(id.to_string()))?;
            rule.enabled = enabled;
            rule.updated_at = Utc::now();
            debug!(
                "Rule '{}' is now {}.",
                id,
                if enabled { "enabled" } else { "disabled" }
            );
            Ok(rule.clone())
        })
    }

    /// Adds a rule set. References to unknown rule ids are accepted with a
    /// warning; they are skipped at resolve time until a matching rule
    /// appears.
    pub fn add_rule_set(&self, spec: RuleSetSpec) -> Result<RuleSet, RedactGateError> {
        self.mutate(|registry, _| {
            rules::validate_name(&spec.name)?;
            let id = match spec.id {
                Some(id) => {
                    let id = id.trim().to_string();
                    if id.is_empty() {
                        return Err(RedactGateError::validation("id", "must not be empty"));
                    }
                    if registry.rule_sets.contains_key(&id) {
                        return Err(RedactGateError::validation(
                            "id",
                            format!("rule set id '{id}' already exists"),
                        ));
                    }
                    id
                }
                None => next_free_id(derive_id(&spec.name), |candidate| {
                    registry.rule_sets.contains_key(candidate)
                }),
            };

            for rule_id in &spec.rules {
                if !registry.rules.contains_key(rule_id) {
                    warn!("Rule set '{}' references unknown rule '{}'.", id, rule_id);
                }
            }

            let now = Utc::now();
            let set = RuleSet {
                id: id.clone(),
                name: spec.name,
                description: spec.description,
                rules: spec.rules,
                enabled: spec.enabled,
                created_at: now,
                updated_at: now,
            };
            registry.rule_sets.insert(id.clone(), set.clone());
            info!("Added rule set '{}' ({}).", set.name, set.id);
            Ok(set)
        })
    }

    pub fn update_rule_set(&self, id: &str, patch: RuleSetPatch) -> Result<RuleSet, RedactGateError> {
        self.mutate(|registry, _| {
            let set = registry
                .rule_sets
                .get_mut(id)
                .ok_or_else(|| RedactGateError::RuleSetNotFound(id.to_string()))?;

            if let Some(name) = patch.name {
                rules::validate_name(&name)?;
                set.name = name;
            }
            if let Some(description) = patch.description {
                set.description = description;
            }
            if let Some(rule_ids) = patch.rules {
                set.rules = rule_ids;
            }
            if let Some(enabled) = patch.enabled {
                set.enabled = enabled;
            }
            set.updated_at = Utc::now();
            debug!("Updated rule set '{}'.", id);
            Ok(set.clone())
        })
    }

    /// Deletes a rule set. The default rule set cannot be deleted; point the
    /// default elsewhere first.
    pub fn delete_rule_set(&self, id: &str) -> Result<(), RedactGateError> {
        self.mutate(|registry, _| {
            if !registry.rule_sets.contains_key(id) {
                return Err(RedactGateError::RuleSetNotFound(id.to_string()));
            }
            if registry.default_rule_set == id {
                return Err(RedactGateError::validation(
                    "id",
                    format!("cannot delete the default rule set '{id}'"),
                ));
            }
            registry.rule_sets.remove(id);
            info!("Deleted rule set '{}'.", id);
            Ok(())
        })
    }

    pub fn get_rule_set(&self, id: &str) -> Result<RuleSet, RedactGateError> {
        let state = self.state.read().unwrap();
        state
            .registry
            .rule_sets
            .get(id)
            .cloned()
            .ok_or_else(|| RedactGateError::RuleSetNotFound(id.to_string()))
    }

    /// Snapshot of every rule set, ordered by id.
    pub fn list_rule_sets(&self) -> Vec<RuleSet> {
        let state = self.state.read().unwrap();
        let mut sets: Vec<RuleSet> = state.registry.rule_sets.values().cloned().collect();
        sets.sort_by(|a, b| a.id.cmp(&b.id));
        sets
    }

    pub fn default_rule_set_id(&self) -> String {
        self.state.read().unwrap().registry.default_rule_set.clone()
    }

    pub fn set_default_rule_set(&self, id: &str) -> Result<(), RedactGateError> {
        self.mutate(|registry, _| {
            if !registry.rule_sets.contains_key(id) {
                return Err(RedactGateError::RuleSetNotFound(id.to_string()));
            }
            registry.default_rule_set = id.to_string();
            info!("Default rule set is now '{}'.", id);
            Ok(())
        })
    }

    /// Resolves a rule set into the ordered list of rules a redaction run
    /// applies: enabled rules only, priority descending, ties broken by id.
    /// `None` selects the default set. Unknown and disabled sets both fail;
    /// references to missing rules are skipped, and an id listed twice is
    /// applied once.
    pub fn resolve_rule_set(&self, id: Option<&str>) -> Result<Vec<ActiveRule>, RedactGateError> {
        let state = self.state.read().unwrap();
        let registry = &state.registry;
        let set_id = id.unwrap_or(&registry.default_rule_set);

        let set = registry
            .rule_sets
            .get(set_id)
            .ok_or_else(|| RedactGateError::RuleSetNotFound(set_id.to_string()))?;
        if !set.enabled {
            return Err(RedactGateError::RuleSetNotFound(set_id.to_string()));
        }

        let mut seen = HashSet::new();
        let mut active = Vec::with_capacity(set.rules.len());
        for rule_id in &set.rules {
            if !seen.insert(rule_id.as_str()) {
                continue;
            }
            let Some(rule) = registry.rules.get(rule_id) else {
                debug!(
                    "Rule set '{}' references missing rule '{}'; skipping.",
                    set_id, rule_id
                );
                continue;
            };
            if !rule.enabled {
                continue;
            }
            let regex = state.compiled.get(rule_id).cloned().ok_or_else(|| {
                RedactGateError::Registry(format!("no compiled pattern for rule '{rule_id}'"))
            })?;
            active.push(ActiveRule {
                rule: rule.clone(),
                regex,
            });
        }

        active.sort_by(|a, b| {
            b.rule
                .priority
                .cmp(&a.rule.priority)
                .then_with(|| a.rule.id.cmp(&b.rule.id))
        });
        Ok(active)
    }
}

/// Builds a `Rule` from a creation payload, validating as it goes. Returns
/// the rule together with its compiled condition.
fn materialize_rule(
    registry: &RuleRegistry,
    spec: RuleSpec,
    now: DateTime<Utc>,
) -> Result<(Rule, Regex), RedactGateError> {
    rules::validate_name(&spec.name)?;
    rules::validate_priority(spec.priority)?;
    let regex = compile_condition(&spec.condition)?;

    let id = match spec.id {
        Some(id) => {
            let id = id.trim().to_string();
            if id.is_empty() {
                return Err(RedactGateError::validation("id", "must not be empty"));
            }
            if registry.rules.contains_key(&id) {
                return Err(RedactGateError::validation(
                    "id",
                    format!("rule id '{id}' already exists"),
                ));
            }
            id
        }
        None => next_free_id(derive_id(&spec.name), |candidate| {
            registry.rules.contains_key(candidate)
        }),
    };

    let rule = Rule {
        id,
        name: spec.name,
        description: spec.description,
        condition: spec.condition,
        action: spec.action,
        replacement: spec.replacement,
        parameters: spec.parameters,
        enabled: spec.enabled,
        priority: spec.priority,
        created_at: now,
        updated_at: now,
    };
    Ok((rule, regex))
}

/// Finds the first unused id for a derived slug: the slug itself, then
/// `slug_2`, `slug_3`, and so on.
fn next_free_id(base: String, taken: impl Fn(&str) -> bool) -> String {
    if !taken(&base) {
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{base}_{n}");
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Compiles every stored condition, failing with a `Registry` error if any
/// no longer compiles.
fn compile_registry(
    registry: &RuleRegistry,
) -> Result<HashMap<String, Arc<Regex>>, RedactGateError> {
    let mut compiled = HashMap::with_capacity(registry.rules.len());
    for (id, rule) in &registry.rules {
        let regex = compile_condition(&rule.condition).map_err(|e| {
            RedactGateError::Registry(format!("stored rule '{id}' has an invalid condition: {e}"))
        })?;
        compiled.insert(id.clone(), Arc::new(regex));
    }
    debug!("Compiled {} stored rule pattern(s).", compiled.len());
    Ok(compiled)
}

/// Structural checks on a loaded document, beyond per-rule compilation.
fn validate_registry(registry: &RuleRegistry) -> Result<(), RedactGateError> {
    for (id, rule) in &registry.rules {
        if rule.id != *id {
            return Err(RedactGateError::Registry(format!(
                "rule keyed as '{}' carries id '{}'",
                id, rule.id
            )));
        }
        if rule.priority > rules::MAX_PRIORITY {
            return Err(RedactGateError::Registry(format!(
                "rule '{}' has priority {} outside the allowed range 0-{}",
                id,
                rule.priority,
                rules::MAX_PRIORITY
            )));
        }
    }
    for (id, set) in &registry.rule_sets {
        if set.id != *id {
            return Err(RedactGateError::Registry(format!(
                "rule set keyed as '{}' carries id '{}'",
                id, set.id
            )));
        }
    }
    if !registry.rule_sets.contains_key(&registry.default_rule_set) {
        return Err(RedactGateError::Registry(format!(
            "default rule set '{}' does not exist",
            registry.default_rule_set
        )));
    }
    Ok(())
}

/// Builds the seed registry from the embedded catalog.
fn default_registry() -> Result<RuleRegistry, RedactGateError> {
    debug!("Loading default rules from embedded catalog...");
    let yaml = include_str!("../config/default_rules.yaml");
    let catalog: SeedCatalog = serde_yml::from_str(yaml).map_err(|e| {
        RedactGateError::Registry(format!("failed to parse embedded default rules: {e}"))
    })?;

    let now = Utc::now();
    let mut registry = RuleRegistry::default();
    let mut member_ids = Vec::with_capacity(catalog.rules.len());
    for spec in catalog.rules {
        let (rule, _) = materialize_rule(&registry, spec, now)?;
        member_ids.push(rule.id.clone());
        registry.rules.insert(rule.id.clone(), rule);
    }

    let set_spec = catalog.rule_set;
    let set_id = set_spec
        .id
        .unwrap_or_else(|| derive_id(&set_spec.name));
    let set = RuleSet {
        id: set_id.clone(),
        name: set_spec.name,
        description: set_spec.description,
        rules: member_ids,
        enabled: set_spec.enabled,
        created_at: now,
        updated_at: now,
    };
    registry.default_rule_set = set_id.clone();
    registry.rule_sets.insert(set_id, set);

    debug!("Seeded {} default rule(s).", registry.rules.len());
    Ok(registry)
}
