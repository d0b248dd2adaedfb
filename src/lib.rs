pub mod catalog;
pub mod observation;
pub mod sanitizer;
pub mod risk;
pub mod locator;
pub mod gate;
pub mod policy;

pub use catalog::{CatalogError, CatalogSpec, PatternCatalog};
pub use gate::ActionGate;
pub use locator::ElementLocator;
pub use observation::{ContentBlob, Evidence, Observation};
pub use policy::{
    ActionInfo, ActionStats, Decision, DecisionMaker, MediationError, MediatorConfig, Mitigation,
    SecurityMediator,
};
pub use risk::{RiskDetector, RiskVerdict};
pub use sanitizer::Sanitizer;

/// Initialize JSON logging (call once early in your binary).
///
/// Why:
/// - Makes logs SIEM-friendly.
/// - Prevents “someone changed the formatter” surprises.
pub fn init_json_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .with_current_span(true)
        .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE)
        .try_init();
}

/// Hash input for logs without leaking contents.
pub(crate) fn hash_for_logs(input: &str) -> String {
    blake3::hash(input.as_bytes()).to_hex().to_string()
}
