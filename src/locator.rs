//! Best-effort dismiss-control lookup in accessibility-tree text dumps.
//!
//! The tree is a line-per-element dump; an interactive element line looks like
//! `[42] button 'Close'` (formatting varies per environment). We want the
//! first clickable control whose label reads like a dismissal. Not finding one
//! is a normal outcome, not an error.

use regex::Regex;
use tracing::debug;

/// Closed vocabulary of dismiss-semantics label fragments.
const DISMISS_TEXTS: [&str; 6] = ["close", "dismiss", "ok", "x", "got it", "i understand"];

pub struct ElementLocator {
    reference_re: Regex,
}

impl ElementLocator {
    pub fn new() -> Self {
        Self {
            reference_re: Regex::new(r"\[(\d+)\]\s*button").expect("reference regex must compile"),
        }
    }

    /// Scan lines for a clickable control with dismiss-semantics text; first
    /// match wins and its reference identifier is returned.
    pub fn find_dismiss_control(&self, structure_txt: &str) -> Option<String> {
        for line in structure_txt.lines() {
            let low = line.to_lowercase();
            if low.contains("button") && DISMISS_TEXTS.iter().any(|t| low.contains(t)) {
                if let Some(caps) = self.reference_re.captures(line) {
                    let reference = caps[1].to_string();
                    debug!(event = "dismiss_control_found", reference = %reference);
                    return Some(reference);
                }
            }
        }
        None
    }
}

impl Default for ElementLocator {
    fn default() -> Self {
        Self::new()
    }
}
