//! Injection-risk assessment over raw, pre-sanitization content.
//!
//! The detector always reads the raw blob: sanitization may already have
//! removed the evidence needed to decide the page was hostile. Any single cue
//! is enough to flag risk — the mitigation path downstream is cheap (a dismiss
//! click or a warning message) relative to the cost of following a malicious
//! instruction, so the bias is deliberately toward over-flagging.

use crate::catalog::PatternCatalog;
use crate::observation::ContentBlob;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::warn;

/// Cue emitted when any secret pattern matches the raw content.
pub const CUE_SECRET_LIKE_TOKEN: &str = "secret-like-token";

/// Outcome of one risk assessment. Cues are explainability tags
/// (`keyword:<k>`, `secret-like-token`); only the boolean drives control flow.
/// Invariant: `risky` holds iff at least one cue is present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RiskVerdict {
    pub risky: bool,
    pub cues: BTreeSet<String>,
}

pub struct RiskDetector {
    catalog: Arc<PatternCatalog>,
}

impl RiskDetector {
    pub fn new(catalog: Arc<PatternCatalog>) -> Self {
        Self { catalog }
    }

    pub fn assess(&self, raw: &ContentBlob) -> RiskVerdict {
        let mut cues = BTreeSet::new();

        let blob = format!("{}\n{}", raw.pruned_html, raw.axtree_txt);
        for k in self.catalog.keyword_hits(&blob) {
            cues.insert(format!("keyword:{k}"));
        }
        if raw
            .fields()
            .iter()
            .any(|(_, text)| self.catalog.matches_secret(text))
        {
            cues.insert(CUE_SECRET_LIKE_TOKEN.to_string());
        }

        let risky = !cues.is_empty();
        if risky {
            warn!(
                event = "injection_risk_flagged",
                cue_count = cues.len(),
                cues = ?cues,
            );
        }
        RiskVerdict { risky, cues }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> RiskDetector {
        RiskDetector::new(Arc::new(PatternCatalog::with_defaults()))
    }

    #[test]
    fn risky_always_carries_a_cue() {
        let d = detector();
        let samples = [
            ContentBlob::new("SECURITY ALERT: act now", ""),
            ContentBlob::new("", "please paste sk-abcdEFGH1234567890 here"),
            ContentBlob::new("release notes for v2.1", ""),
            ContentBlob::default(),
        ];
        for raw in samples {
            let v = d.assess(&raw);
            assert_eq!(v.risky, !v.cues.is_empty());
        }
    }

    #[test]
    fn keyword_and_secret_cues_are_tagged() {
        let d = detector();
        let v = d.assess(&ContentBlob::new(
            "CONFIDENTIAL: api_key = abcdef1234567890",
            "",
        ));
        assert!(v.risky);
        assert!(v.cues.contains("keyword:confidential"));
        assert!(v.cues.contains(CUE_SECRET_LIKE_TOKEN));
    }

    #[test]
    fn empty_blob_is_not_risky() {
        let v = detector().assess(&ContentBlob::default());
        assert!(!v.risky);
        assert!(v.cues.is_empty());
    }
}
