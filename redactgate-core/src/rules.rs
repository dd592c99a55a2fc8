//! Data model for redaction rules, rule sets, and the persisted registry.
//!
//! This module defines the core serde structures shared by the store, the
//! engine, and embedding callers, along with the id/placeholder derivation
//! helpers and pattern compilation used to validate rules.
//!
//! License: MIT OR Apache-2.0

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::errors::RedactGateError;

/// Maximum allowed length for a rule's regex pattern string.
pub const MAX_PATTERN_LENGTH: usize = 500;

/// Highest permitted rule priority. Valid priorities run `0..=MAX_PRIORITY`;
/// higher-priority rules are applied first.
pub const MAX_PRIORITY: u8 = 100;

/// Compiled regex size ceiling (10 MB).
const REGEX_SIZE_LIMIT: usize = 10 * (1 << 20);

static SLUG_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());
static PLACEHOLDER_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Z0-9]+").unwrap());

fn default_true() -> bool {
    true
}

/// What the engine does with text matched by a rule.
///
/// The set of actions is closed: unknown action strings fail to deserialize
/// instead of being carried around as free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    /// Replace every match with the rule's replacement text.
    #[default]
    Redact,
    /// Record matches in the report without altering the text.
    Flag,
    /// Record matches and mark the whole result as blocked. The engine still
    /// returns the processed text; refusing it is the caller's decision.
    Block,
    /// Rewrite matches like `Redact`; reported under its own action tag.
    Transform,
}

impl RuleAction {
    /// Whether this action rewrites the document text.
    pub fn rewrites_text(&self) -> bool {
        matches!(self, RuleAction::Redact | RuleAction::Transform)
    }
}

impl fmt::Display for RuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RuleAction::Redact => "redact",
            RuleAction::Flag => "flag",
            RuleAction::Block => "block",
            RuleAction::Transform => "transform",
        })
    }
}

/// A single redaction rule.
///
/// The `id` is assigned at creation and immutable thereafter; every other
/// field may change through [`RulePatch`]. The `condition` always compiles:
/// the store validates it on create, on update, and when loading a persisted
/// registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Regex pattern the rule matches against the (possibly already
    /// rewritten) document text. Matching is case-sensitive.
    pub condition: String,
    #[serde(default)]
    pub action: RuleAction,
    /// Replacement text for rewriting actions. Empty means "use the derived
    /// placeholder" (see [`default_placeholder`]).
    #[serde(default)]
    pub replacement: String,
    /// Open parameter bag reserved for future action types. The built-in
    /// actions do not read it.
    #[serde(default)]
    pub parameters: HashMap<String, serde_json::Value>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub priority: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Rule {
    /// Replacement text used by rewriting actions: the rule's own
    /// `replacement` when non-empty, otherwise the placeholder derived from
    /// its name.
    pub fn effective_replacement(&self) -> String {
        if self.replacement.is_empty() {
            default_placeholder(&self.name)
        } else {
            self.replacement.clone()
        }
    }
}

/// Payload for creating a rule. `name` and `condition` are required; all
/// other fields default (action `redact`, enabled, priority 0). When `id` is
/// omitted the store derives one from the name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSpec {
    pub id: Option<String>,
    pub name: String,
    pub description: String,
    pub condition: String,
    pub action: RuleAction,
    pub replacement: String,
    pub parameters: HashMap<String, serde_json::Value>,
    pub enabled: bool,
    pub priority: u8,
}

impl Default for RuleSpec {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            description: String::new(),
            condition: String::new(),
            action: RuleAction::default(),
            replacement: String::new(),
            parameters: HashMap::new(),
            enabled: true,
            priority: 0,
        }
    }
}

/// Partial update for a rule. Only the supplied fields are applied; the rule
/// id itself cannot be changed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RulePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub condition: Option<String>,
    pub action: Option<RuleAction>,
    pub replacement: Option<String>,
    pub parameters: Option<HashMap<String, serde_json::Value>>,
    pub enabled: Option<bool>,
    pub priority: Option<u8>,
}

/// A named, ordered collection of rule references.
///
/// The listed order is advisory; application order is always by priority
/// (descending) with the rule id as tie-break. References to rules that no
/// longer exist are kept in the document and skipped at resolve time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rules: Vec<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a rule set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSetSpec {
    pub id: Option<String>,
    pub name: String,
    pub description: String,
    pub rules: Vec<String>,
    pub enabled: bool,
}

impl Default for RuleSetSpec {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            description: String::new(),
            rules: Vec::new(),
            enabled: true,
        }
    }
}

/// Partial update for a rule set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSetPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub rules: Option<Vec<String>>,
    pub enabled: Option<bool>,
}

/// The persisted registry document: every rule, every rule set, and the id
/// of the default set, serialized as a single JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleRegistry {
    pub rules: HashMap<String, Rule>,
    pub rule_sets: HashMap<String, RuleSet>,
    pub default_rule_set: String,
}

/// Derives a stable rule/rule-set id from a human-readable name: lower-cased,
/// with runs of non-alphanumeric characters collapsed to `_`.
pub fn derive_id(name: &str) -> String {
    let lowered = name.to_lowercase();
    let slug = SLUG_CHARS.replace_all(&lowered, "_");
    let slug = slug.trim_matches('_');
    if slug.is_empty() {
        "rule".to_string()
    } else {
        slug.to_string()
    }
}

/// Derives the default placeholder for a rule with an empty replacement:
/// the name upper-cased, non-alphanumeric runs collapsed to `_`, wrapped in
/// angle brackets (`Credit Card` becomes `<CREDIT_CARD>`).
pub fn default_placeholder(name: &str) -> String {
    let upper = name.to_uppercase();
    let body = PLACEHOLDER_CHARS.replace_all(&upper, "_");
    let body = body.trim_matches('_');
    if body.is_empty() {
        "<REDACTED>".to_string()
    } else {
        format!("<{body}>")
    }
}

/// Compiles a rule condition, enforcing the pattern length cap and the
/// compiled-size limit. All store entry points go through this, so a rule
/// that exists always carries a compilable condition.
pub fn compile_condition(pattern: &str) -> Result<Regex, RedactGateError> {
    if pattern.is_empty() {
        return Err(RedactGateError::validation("condition", "must not be empty"));
    }
    if pattern.len() > MAX_PATTERN_LENGTH {
        return Err(RedactGateError::validation(
            "condition",
            format!(
                "pattern length {} exceeds the maximum of {}",
                pattern.len(),
                MAX_PATTERN_LENGTH
            ),
        ));
    }

    RegexBuilder::new(pattern)
        .size_limit(REGEX_SIZE_LIMIT)
        .build()
        .map_err(|e| RedactGateError::validation("condition", e.to_string()))
}

pub(crate) fn validate_priority(priority: u8) -> Result<(), RedactGateError> {
    if priority > MAX_PRIORITY {
        return Err(RedactGateError::validation(
            "priority",
            format!("{priority} is outside the allowed range 0-{MAX_PRIORITY}"),
        ));
    }
    Ok(())
}

pub(crate) fn validate_name(name: &str) -> Result<(), RedactGateError> {
    if name.trim().is_empty() {
        return Err(RedactGateError::validation("name", "must not be empty"));
    }
    Ok(())
}
