// redactgate-core/src/engine.rs
//! The redaction engine: applies a resolved rule set to input text.
//!
//! Rules run sequentially in priority order, each scanning the text as
//! rewritten by the rules before it. The engine holds no state between calls
//! and has no side effects; everything it learns about a run is returned in
//! the [`RedactionResult`].
//!
//! License: MIT OR Apache-2.0

use log::{debug, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::errors::{RedactGateError, RuleExecutionError};
use crate::report::{loggable, RedactionMatch, RedactionResult, ReportEntry, RuleFailure};
use crate::rules::RuleAction;
use crate::store::{ActiveRule, RuleStore};

/// Tunables for a redaction run.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Per-rule scan budget. A rule that exceeds it is skipped for the run
    /// and recorded as a `rule_error` report entry; it stays enabled for
    /// future calls.
    pub rule_timeout: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            rule_timeout: Duration::from_millis(250),
        }
    }
}

/// Applies rule sets from a shared [`RuleStore`] to text.
pub struct RedactionEngine {
    store: Arc<RuleStore>,
    options: EngineOptions,
}

/// Everything one rule did to the document. Committed only when the rule
/// finishes inside its budget, so a timed-out rule leaves no trace beyond
/// its failure entry.
struct RuleOutcome {
    entries: Vec<ReportEntry>,
    rewritten: Option<String>,
    block_reason: Option<String>,
}

impl RedactionEngine {
    pub fn new(store: Arc<RuleStore>) -> Self {
        Self::with_options(store, EngineOptions::default())
    }

    pub fn with_options(store: Arc<RuleStore>, options: EngineOptions) -> Self {
        Self { store, options }
    }

    /// Processes `text` against a rule set (`None` selects the default set).
    ///
    /// Rules apply cumulatively: each rule scans the text as rewritten by all
    /// higher-priority rules. Matching is case-sensitive and non-overlapping
    /// within a rule. A failing rule is skipped and reported; an unknown or
    /// disabled rule set fails the whole call.
    pub fn process(
        &self,
        text: &str,
        rule_set_id: Option<&str>,
    ) -> Result<RedactionResult, RedactGateError> {
        let active = self.store.resolve_rule_set(rule_set_id)?;
        debug!(
            "Processing {} byte(s) against {} active rule(s).",
            text.len(),
            active.len()
        );

        let mut redacted = text.to_string();
        let mut matches = Vec::new();
        let mut blocked = false;
        let mut block_reason = None;

        for active_rule in &active {
            match apply_rule(active_rule, &redacted, self.options.rule_timeout) {
                Ok(outcome) => {
                    if !outcome.entries.is_empty() {
                        debug!(
                            "Rule '{}' produced {} match(es).",
                            active_rule.rule.id,
                            outcome.entries.len()
                        );
                    }
                    matches.extend(outcome.entries);
                    if let Some(reason) = outcome.block_reason {
                        blocked = true;
                        if block_reason.is_none() {
                            block_reason = Some(reason);
                        }
                    }
                    if let Some(rewritten) = outcome.rewritten {
                        redacted = rewritten;
                    }
                }
                Err(err) => {
                    warn!("Rule '{}' skipped: {}", active_rule.rule.id, err);
                    matches.push(ReportEntry::RuleError(RuleFailure {
                        rule_id: active_rule.rule.id.clone(),
                        rule_name: active_rule.rule.name.clone(),
                        reason: err.to_string(),
                    }));
                }
            }
        }

        Ok(RedactionResult {
            redacted_text: redacted,
            matches,
            blocked,
            block_reason,
        })
    }
}

/// Runs one rule over the current document. The deadline is checked before
/// each match attempt; the regex crate guarantees linear-time scans, so the
/// budget bounds the whole pass.
fn apply_rule(
    active: &ActiveRule,
    text: &str,
    budget: Duration,
) -> Result<RuleOutcome, RuleExecutionError> {
    let rule = &active.rule;
    let rewrites = rule.action.rewrites_text();
    let replacement = rule.effective_replacement();
    let deadline = Instant::now() + budget;

    let mut entries = Vec::new();
    let mut block_reason = None;
    let mut rewritten = String::new();
    let mut last_end = 0usize;
    let mut at = 0usize;

    loop {
        if Instant::now() >= deadline {
            return Err(RuleExecutionError::Timeout(budget));
        }
        let Some(m) = active.regex.find_at(text, at) else {
            break;
        };
        let original = m.as_str().to_string();
        debug!("Rule '{}' matched: '{}'", rule.id, loggable(&original));

        let recorded_replacement = if rewrites {
            replacement.clone()
        } else {
            original.clone()
        };
        entries.push(ReportEntry::Match(RedactionMatch {
            rule_id: rule.id.clone(),
            rule_name: rule.name.clone(),
            action: rule.action,
            original,
            replacement: recorded_replacement,
        }));

        if rewrites {
            rewritten.push_str(&text[last_end..m.start()]);
            rewritten.push_str(&replacement);
            last_end = m.end();
        }
        if rule.action == RuleAction::Block && block_reason.is_none() {
            block_reason = Some(format!("Blocked by rule: {}", rule.name));
        }

        if m.end() > m.start() {
            at = m.end();
        } else {
            // Empty match: step over one character so the scan advances.
            match text[m.end()..].chars().next() {
                Some(c) => at = m.end() + c.len_utf8(),
                None => break,
            }
        }
    }

    let rewritten = if rewrites && !entries.is_empty() {
        rewritten.push_str(&text[last_end..]);
        Some(rewritten)
    } else {
        None
    };

    Ok(RuleOutcome {
        entries,
        rewritten,
        block_reason,
    })
}
