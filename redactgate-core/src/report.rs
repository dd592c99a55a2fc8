// redactgate-core/src/report.rs
//! Structured results for a redaction run, plus PII-safe helpers for
//! debug-logging matched content.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::rules::RuleAction;

lazy_static! {
    /// A static boolean that is initialized once to determine if PII is allowed in debug logs.
    static ref PII_DEBUG_ALLOWED: bool = {
        std::env::var("REDACTGATE_ALLOW_DEBUG_PII")
            .map(|s| s.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    };
}

/// The outcome of one redaction run: the (possibly rewritten) text, the match
/// report, and the block verdict. The engine never suppresses the text; a
/// blocked result still carries it, and refusing delivery is the caller's
/// decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedactionResult {
    pub redacted_text: String,
    #[serde(default)]
    pub matches: Vec<ReportEntry>,
    #[serde(default)]
    pub blocked: bool,
    #[serde(default)]
    pub block_reason: Option<String>,
}

/// One line of the match report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportEntry {
    /// A rule matched a span of the document.
    Match(RedactionMatch),
    /// A rule failed mid-run (for example by exceeding its execution budget)
    /// and was skipped.
    RuleError(RuleFailure),
}

/// A single matched span and what was done with it. For non-rewriting
/// actions (`flag`, `block`) the `replacement` field carries the original
/// text, since nothing was substituted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedactionMatch {
    pub rule_id: String,
    pub rule_name: String,
    pub action: RuleAction,
    pub original: String,
    pub replacement: String,
}

/// A rule that was skipped during a run, and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleFailure {
    pub rule_id: String,
    pub rule_name: String,
    pub reason: String,
}

/// Masks sensitive content for log output.
pub fn redact_sensitive(s: &str) -> String {
    const MAX_LEN: usize = 8;
    if s.len() <= MAX_LEN {
        "[REDACTED]".to_string()
    } else {
        format!("[REDACTED: {} chars]", s.len())
    }
}

/// Matched content as it may appear in debug logs: the original only when
/// `REDACTGATE_ALLOW_DEBUG_PII=true`, a masked form otherwise.
pub(crate) fn loggable(sensitive: &str) -> String {
    if *PII_DEBUG_ALLOWED {
        sensitive.to_string()
    } else {
        redact_sensitive(sensitive)
    }
}
