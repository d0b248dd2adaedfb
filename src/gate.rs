//! Post-decision veto: block candidate actions carrying secret-shaped literals.
//!
//! Actions are opaque command strings to this layer (`fill('123', '...')`,
//! `send_msg_to_user("...")`). We only inspect their quoted argument literals
//! — a coarse syntactic scan, by design, not a parse of the action grammar.

use crate::catalog::PatternCatalog;
use crate::hash_for_logs;
use regex::Regex;
use std::sync::Arc;
use tracing::warn;

pub struct ActionGate {
    catalog: Arc<PatternCatalog>,
    literal_re: Regex,
}

impl ActionGate {
    pub fn new(catalog: Arc<PatternCatalog>) -> Self {
        Self {
            catalog,
            literal_re: Regex::new(r#"['"]([^'"]{4,})['"]"#).expect("literal regex must compile"),
        }
    }

    /// True iff the action must be vetoed: some quoted literal in the payload
    /// matches a secret pattern. Empty actions are never vetoed.
    pub fn check(&self, action: &str) -> bool {
        if action.is_empty() {
            return false;
        }
        for caps in self.literal_re.captures_iter(action) {
            let literal = &caps[1];
            if self.catalog.matches_secret(literal) {
                warn!(
                    event = "secret_action_vetoed",
                    input_hash = %hash_for_logs(action),
                    literal_len = literal.len(),
                );
                return true;
            }
        }
        false
    }
}
