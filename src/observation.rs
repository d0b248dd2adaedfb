//! Step-scoped data model: what the mediation layer sees and what it records.
//!
//! Why this exists:
//! - Observations are attacker-influenced; keeping the raw and sanitized views
//!   side by side lets the risk detector inspect what sanitization removed.
//! - Evidence is the audit trail of every change sanitization made.

use serde::Serialize;

/// The textual views of the current page state, as extracted by the
/// browser-execution collaborator. Absent fields normalize to empty strings;
/// the blob is never mutated after construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContentBlob {
    pub pruned_html: String,
    pub axtree_txt: String,
}

impl ContentBlob {
    pub fn new(pruned_html: impl Into<String>, axtree_txt: impl Into<String>) -> Self {
        Self {
            pruned_html: pruned_html.into(),
            axtree_txt: axtree_txt.into(),
        }
    }

    /// Build from optional fields (environments omit fields they did not extract).
    pub fn from_optional(pruned_html: Option<&str>, axtree_txt: Option<&str>) -> Self {
        Self {
            pruned_html: pruned_html.unwrap_or_default().to_string(),
            axtree_txt: axtree_txt.unwrap_or_default().to_string(),
        }
    }

    /// Ordered field views, named for logging/inspection.
    pub fn fields(&self) -> [(&'static str, &str); 2] {
        [
            ("pruned_html", self.pruned_html.as_str()),
            ("axtree_txt", self.axtree_txt.as_str()),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.pruned_html.is_empty() && self.axtree_txt.is_empty()
    }
}

/// Structured record of what one sanitizer invocation changed and why.
///
/// Append-only during the invocation, read-only afterwards, discarded at the
/// end of the step. `redacted` holds iff at least one reason was appended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Evidence {
    pub redacted: bool,
    pub reasons: Vec<String>,
}

impl Evidence {
    pub(crate) fn note(&mut self, reason: &str) {
        self.redacted = true;
        self.reasons.push(reason.to_string());
    }

    /// Combine evidence from several sanitized fields into one record.
    pub fn merge(mut self, other: Evidence) -> Evidence {
        self.redacted |= other.redacted;
        self.reasons.extend(other.reasons);
        self
    }
}

/// One step's input to the mediation policy.
///
/// The raw blob MUST be retained even after sanitization: risk assessment runs
/// on it, because sanitization may have removed the very cues that prove the
/// page was hostile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Observation {
    pub raw: ContentBlob,
    pub sanitized: ContentBlob,
    pub evidence: Evidence,
}
