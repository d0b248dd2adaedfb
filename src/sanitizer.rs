//! Observation sanitizer: annotation removal, then secret redaction.
//!
//! Why this exists:
//! - Pages under test embed instructions for the agent in places a human never
//!   sees (markup comments, hidden fields). Dropping those regions before the
//!   delegate reads the page removes the bait without touching visible content.
//! - Inline secret-shaped tokens are masked so the delegate can never echo
//!   them back, even by accident.
//!
//! Order matters: removal runs before masking so already-masked content is
//! never re-matched. The whole pass is idempotent — `[REDACTED]` matches no
//! secret pattern and removed regions no longer exist to re-scan.

use crate::catalog::PatternCatalog;
use crate::hash_for_logs;
use crate::observation::{ContentBlob, Evidence, Observation};
use regex::{Captures, Regex};
use std::sync::Arc;
use tracing::warn;

pub const REDACTION_TOKEN: &str = "[REDACTED]";
pub const REASON_REMOVED_ANNOTATION: &str = "removed suspicious annotation";
pub const REASON_REDACTED_TOKENS: &str = "redacted secret-looking tokens";

pub struct Sanitizer {
    catalog: Arc<PatternCatalog>,
    annotation_re: Regex,
}

impl Sanitizer {
    pub fn new(catalog: Arc<PatternCatalog>) -> Self {
        // Dot must span newlines: injected comments are frequently multi-line.
        let annotation_re =
            Regex::new(r"(?s)<!--\s*(.*?)\s*-->").expect("annotation regex must compile");
        Self {
            catalog,
            annotation_re,
        }
    }

    /// Sanitize one text field. Total: malformed markup is plain text, empty
    /// input yields empty output with no reasons.
    pub fn sanitize(&self, text: &str) -> (String, Evidence) {
        let mut evidence = Evidence::default();
        if text.is_empty() {
            return (String::new(), evidence);
        }

        // Pass 1: drop comment-like regions whose body carries an injection
        // cue or a secret shape. Benign annotations stay untouched.
        let mut dropped = false;
        let stripped = self
            .annotation_re
            .replace_all(text, |caps: &Captures| {
                let body = caps.get(1).map_or("", |m| m.as_str());
                if self.is_suspicious_annotation(body) {
                    dropped = true;
                    String::new()
                } else {
                    caps[0].to_string()
                }
            })
            .into_owned();
        if dropped {
            evidence.note(REASON_REMOVED_ANNOTATION);
        }

        // Pass 2: mask remaining secret-shaped spans.
        let (masked, changed) = self.redact_secrets(&stripped);
        if changed {
            evidence.note(REASON_REDACTED_TOKENS);
        }

        if evidence.redacted {
            warn!(
                event = "observation_sanitized",
                input_hash = %hash_for_logs(text),
                reasons = ?evidence.reasons,
            );
        }

        (masked, evidence)
    }

    /// Sanitize every field of a raw blob into a full per-step observation,
    /// retaining the raw copy for downstream risk assessment.
    pub fn preprocess(&self, raw: ContentBlob) -> Observation {
        let (html, html_evidence) = self.sanitize(&raw.pruned_html);
        let (ax, ax_evidence) = self.sanitize(&raw.axtree_txt);
        Observation {
            sanitized: ContentBlob::new(html, ax),
            evidence: html_evidence.merge(ax_evidence),
            raw,
        }
    }

    fn is_suspicious_annotation(&self, body: &str) -> bool {
        !self.catalog.keyword_hits(body).is_empty() || self.catalog.matches_secret(body)
    }

    /// Replace every secret-pattern span with the redaction token.
    /// Overlapping spans from different patterns are merged so no fragment of
    /// a matched token survives.
    fn redact_secrets(&self, text: &str) -> (String, bool) {
        let spans = self.catalog.find_secret_spans(text);
        if spans.is_empty() {
            return (text.to_string(), false);
        }

        let mut merged: Vec<(usize, usize)> = Vec::with_capacity(spans.len());
        for (start, end) in spans {
            match merged.last_mut() {
                Some(last) if start <= last.1 => last.1 = last.1.max(end),
                _ => merged.push((start, end)),
            }
        }

        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        for (start, end) in merged {
            out.push_str(&text[cursor..start]);
            out.push_str(REDACTION_TOKEN);
            cursor = end;
        }
        out.push_str(&text[cursor..]);
        (out, true)
    }
}
