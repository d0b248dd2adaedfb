//! Secret-shape patterns and injection-cue keywords, compiled once and shared.
//!
//! Why this exists:
//! - Every component (sanitizer, risk detector, action gate) decides against
//!   the same rule sets; compiling them in one place keeps verdicts consistent
//!   and avoids per-call regex recompilation.
//! - The catalog is an injected, immutable value rather than module-global
//!   state, so deployments and tests can swap rule sets freely.
//!
//! The built-in rules are deliberately conservative: secret recognizers
//! require minimum token lengths to bound false positives on ordinary words.

use regex::{Regex, RegexSet};
use serde::Deserialize;
use std::{fs, path::Path};
use thiserror::Error;

/// Errors safe to propagate to callers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("Invalid catalog JSON")]
    InvalidJson,
    #[error("Invalid pattern definition")]
    InvalidPattern,
    #[error("Invalid keyword definition")]
    InvalidKeyword,
    #[error("Regex compilation failed")]
    RegexCompileFailed,
    #[error("File read failed")]
    FileReadFailed,
}

/// Declarative rule sets for one catalog. This is what you ship per
/// deployment; `Default` carries the built-in baseline.
///
/// JSON format:
/// `{ "secret_patterns": ["..."], "injection_keywords": ["..."] }`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogSpec {
    /// Regexes recognizing secret-shaped tokens (API keys, credential
    /// assignments, cloud keys).
    pub secret_patterns: Vec<String>,
    /// Phrases that indicate goal-redirection or exfiltration bait. Stored
    /// lower-cased; matching is case-insensitive substring search.
    pub injection_keywords: Vec<String>,
}

impl Default for CatalogSpec {
    fn default() -> Self {
        Self {
            secret_patterns: vec![
                // OpenAI-style opaque keys.
                r"sk-[A-Za-z0-9]{16,}".to_string(),
                // key/secret/token assignments with a long-enough value.
                r#"(?i)\b(api[_-]?key|secret|token)\b\s*[:=]\s*['"]?[A-Za-z0-9_\-]{10,}"#
                    .to_string(),
                r#"(?i)\bpassword\b\s*[:=]\s*['"]?.{4,}"#.to_string(),
                // AWS credential shapes.
                r"(?i)\baws_?access_?key_?id\b\s*[:=]\s*[A-Z0-9]{16,}".to_string(),
                r"(?i)\baws_?secret_?access_?key\b\s*[:=]\s*[A-Za-z0-9/+=]{20,}".to_string(),
                // Bare mention is already bait enough.
                r"(?i)\bprivate[_-]?key\b".to_string(),
            ],
            injection_keywords: [
                "system_prompt",
                "internal",
                "confidential",
                "do not share",
                "secret",
                "copy this into chat",
                "override previous instructions",
                "ignore previous rules",
                "you must",
                "urgent",
                "time-limited",
                "security alert",
                "important",
            ]
            .iter()
            .map(|k| k.to_string())
            .collect(),
        }
    }
}

impl CatalogSpec {
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        serde_json::from_str(json).map_err(|_| CatalogError::InvalidJson)
    }

    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path).map_err(|_| CatalogError::FileReadFailed)?;
        Self::from_json(&content)
    }
}

/// Compiled, immutable rule sets.
///
/// - `RegexSet` answers "does any secret pattern match" in one pass.
/// - Individual `Regex` entries locate spans for redaction.
///
/// Read-only after construction; share across pipelines via `Arc` without
/// synchronization.
#[derive(Debug)]
pub struct PatternCatalog {
    set: RegexSet,
    patterns: Vec<Regex>,
    keywords: Vec<String>,
}

impl PatternCatalog {
    pub fn new(spec: CatalogSpec) -> Result<Self, CatalogError> {
        validate_spec(&spec)?;

        let set = RegexSet::new(spec.secret_patterns.iter())
            .map_err(|_| CatalogError::RegexCompileFailed)?;

        let mut patterns = Vec::with_capacity(spec.secret_patterns.len());
        for p in &spec.secret_patterns {
            patterns.push(Regex::new(p).map_err(|_| CatalogError::RegexCompileFailed)?);
        }

        let keywords = spec
            .injection_keywords
            .iter()
            .map(|k| k.to_lowercase())
            .collect();

        Ok(Self {
            set,
            patterns,
            keywords,
        })
    }

    /// Built-in baseline catalog. The defaults are static and known to
    /// compile, hence the expect.
    pub fn with_defaults() -> Self {
        Self::new(CatalogSpec::default()).expect("built-in catalog must compile")
    }

    /// True iff any secret pattern matches anywhere in `text`.
    pub fn matches_secret(&self, text: &str) -> bool {
        !text.is_empty() && self.set.is_match(text)
    }

    /// Byte spans of every secret-pattern match, sorted ascending and deduped.
    /// Spans from different patterns may overlap; callers merge as needed.
    pub fn find_secret_spans(&self, text: &str) -> Vec<(usize, usize)> {
        if text.is_empty() || !self.set.is_match(text) {
            return Vec::new();
        }
        let mut spans = Vec::new();
        for re in &self.patterns {
            for m in re.find_iter(text) {
                spans.push((m.start(), m.end()));
            }
        }
        spans.sort_unstable();
        spans.dedup();
        spans
    }

    /// Keywords present in `text` as case-insensitive substrings, in catalog
    /// order.
    pub fn keyword_hits(&self, text: &str) -> Vec<&str> {
        if text.is_empty() {
            return Vec::new();
        }
        let low = text.to_lowercase();
        self.keywords
            .iter()
            .filter(|k| low.contains(k.as_str()))
            .map(|k| k.as_str())
            .collect()
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

fn validate_spec(spec: &CatalogSpec) -> Result<(), CatalogError> {
    for p in &spec.secret_patterns {
        if p.is_empty() || p.len() > 512 {
            return Err(CatalogError::InvalidPattern);
        }
    }
    for k in &spec.injection_keywords {
        if k.is_empty() || k.len() > 128 {
            return Err(CatalogError::InvalidKeyword);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_tokens_do_not_match() {
        let cat = PatternCatalog::with_defaults();
        assert!(!cat.matches_secret("sk-short"));
        assert!(!cat.matches_secret("token = abc"));
    }

    #[test]
    fn long_opaque_keys_match() {
        let cat = PatternCatalog::with_defaults();
        assert!(cat.matches_secret("sk-abcdEFGH1234567890"));
        assert!(cat.matches_secret("api_key = abcdef1234567890"));
        assert!(cat.matches_secret("AWS_SECRET_ACCESS_KEY: wJalrXUtnFEMIK7MDENGbPxRfiCY"));
    }

    #[test]
    fn spans_are_sorted_and_deduped() {
        let cat = PatternCatalog::with_defaults();
        let text = "a sk-abcdEFGH1234567890 b token=0123456789abc c";
        let spans = cat.find_secret_spans(text);
        assert!(spans.len() >= 2);
        assert!(spans.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn keyword_hits_are_case_insensitive() {
        let cat = PatternCatalog::with_defaults();
        let hits = cat.keyword_hits("SECURITY ALERT: you MUST act now");
        assert!(hits.contains(&"security alert"));
        assert!(hits.contains(&"you must"));
    }

    #[test]
    fn rejects_oversized_pattern() {
        let spec = CatalogSpec {
            secret_patterns: vec!["a".repeat(1024)],
            injection_keywords: vec![],
        };
        assert!(matches!(
            PatternCatalog::new(spec),
            Err(CatalogError::InvalidPattern)
        ));
    }
}
