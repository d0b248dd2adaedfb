//! The mediation policy: one step in, one action out.
//!
//! Why this exists:
//! - The wrapped decision-maker is good at pursuing the goal and bad at
//!   distrusting the page. This layer decides, per step and from scratch,
//!   whether the page gets to reach the delegate at all, and whether the
//!   delegate's chosen action is safe to release.
//! - Memoryless on purpose: every step re-evaluates from the current
//!   observation only, trading adaptiveness for predictability and testability.

use crate::catalog::PatternCatalog;
use crate::gate::ActionGate;
use crate::locator::ElementLocator;
use crate::observation::{ContentBlob, Evidence, Observation};
use crate::risk::{RiskDetector, RiskVerdict};
use crate::sanitizer::Sanitizer;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Fixed wording for the Mitigate-Notify action.
pub const NOTIFY_MESSAGE: &str = "This page shows content that looks like a prompt-injection \
or secret bait. I'll ignore it, keep only to the user's goal, and avoid exposing secrets.";

/// Fixed wording for the safe refusal substituted for a vetoed action.
pub const REFUSAL_MESSAGE: &str = "Refusing to type or repeat secret-looking values. \
Please provide non-sensitive input or confirm alternative steps.";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MediationError {
    /// The wrapped decision-maker failed. Propagated unmodified — this layer
    /// cannot safely guess an action on behalf of a failed delegate, and
    /// masking the failure would hide real operational problems.
    #[error("delegate decision-maker failed")]
    Delegate(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Automatic defensive action substituted for normal delegation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mitigation {
    Close,
    Notify,
}

/// Observability counters attached to every decision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActionStats {
    pub security_cues: Vec<String>,
    pub mitigation: Option<Mitigation>,
    pub blocked_secret_action: bool,
}

/// Rationale and metadata travelling with an action. Used for audit and
/// logging only, never re-read for control flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActionInfo {
    /// Human-readable rationale, naming the cues for mitigations/refusals.
    pub think: String,
    pub stats: ActionStats,
    /// Sanitization evidence for the step that produced this decision.
    pub security: Evidence,
    /// Original metadata of a vetoed delegate decision, kept for audit.
    pub audit: Option<Box<ActionInfo>>,
}

/// One chosen action: an opaque command string plus its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub action: String,
    pub info: ActionInfo,
}

impl Decision {
    pub fn new(action: impl Into<String>, info: ActionInfo) -> Self {
        Self {
            action: action.into(),
            info,
        }
    }
}

/// Narrow capability interface to the wrapped decision-maker. The mediator
/// depends on nothing else about the delegate; calls are synchronous and may
/// block on backend I/O.
pub trait DecisionMaker {
    fn decide(
        &mut self,
        obs: &Observation,
    ) -> Result<Decision, Box<dyn std::error::Error + Send + Sync>>;
}

/// Mitigation knobs. All substitutions are opt-out; disabling both mitigation
/// paths makes risky steps fall through to delegation with the risk merely
/// flagged — a deliberate configuration option, not a bug.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MediatorConfig {
    /// Attempt a dismiss click when risk is flagged.
    pub risk_close_modal: bool,
    /// Emit the fixed warning message when nothing can be dismissed.
    pub risk_send_message: bool,
    /// Run the action gate over delegate decisions.
    pub refuse_secret_fill: bool,
    pub agent_name: String,
}

impl Default for MediatorConfig {
    fn default() -> Self {
        Self {
            risk_close_modal: true,
            risk_send_message: true,
            refuse_secret_fill: true,
            agent_name: "security_guard".to_string(),
        }
    }
}

/// The per-step decision engine wrapping a delegate decision-maker.
///
/// Control flow per step: sanitize → assess raw → mitigate, or delegate on the
/// sanitized view → gate the candidate → release. No state survives the step;
/// the shared catalog is immutable.
pub struct SecurityMediator<D> {
    delegate: D,
    config: MediatorConfig,
    sanitizer: Sanitizer,
    detector: RiskDetector,
    locator: ElementLocator,
    gate: ActionGate,
}

impl<D: DecisionMaker> SecurityMediator<D> {
    pub fn new(delegate: D, config: MediatorConfig, catalog: Arc<PatternCatalog>) -> Self {
        Self {
            delegate,
            config,
            sanitizer: Sanitizer::new(catalog.clone()),
            detector: RiskDetector::new(catalog.clone()),
            locator: ElementLocator::new(),
            gate: ActionGate::new(catalog),
        }
    }

    /// Default config and built-in catalog.
    pub fn with_defaults(delegate: D) -> Self {
        Self::new(
            delegate,
            MediatorConfig::default(),
            Arc::new(PatternCatalog::with_defaults()),
        )
    }

    /// Standalone pre-pass: sanitize a raw blob into a full observation.
    /// Exposed independently for inspection and testing.
    pub fn preprocess(&self, raw: ContentBlob) -> Observation {
        self.sanitizer.preprocess(raw)
    }

    /// One mediation step: consume the current raw page content, produce the
    /// action to execute.
    pub fn step(&mut self, raw: ContentBlob) -> Result<Decision, MediationError> {
        let obs = self.preprocess(raw);
        let verdict = self.detector.assess(&obs.raw);

        debug!(
            event = "mediation_step",
            agent = %self.config.agent_name,
            risky = verdict.risky,
            sanitized = obs.evidence.redacted,
        );

        if verdict.risky {
            if self.config.risk_close_modal {
                // Locate against the raw tree: sanitization may have redacted
                // the very line that names the control.
                if let Some(reference) = self.locator.find_dismiss_control(&obs.raw.axtree_txt) {
                    info!(
                        event = "mitigation_close",
                        reference = %reference,
                        cues = ?verdict.cues,
                    );
                    return Ok(mitigate_close(&reference, &verdict, &obs.evidence));
                }
            }
            if self.config.risk_send_message {
                info!(event = "mitigation_notify", cues = ?verdict.cues);
                return Ok(mitigate_notify(&verdict, &obs.evidence));
            }
            // Risk flagged but no automatic mitigation configured.
            warn!(event = "risk_unmitigated", cues = ?verdict.cues);
        }

        let candidate = self
            .delegate
            .decide(&obs)
            .map_err(MediationError::Delegate)?;

        if self.config.refuse_secret_fill && self.gate.check(&candidate.action) {
            info!(event = "candidate_blocked", agent = %self.config.agent_name);
            return Ok(block_candidate(candidate, &obs.evidence));
        }

        Ok(candidate)
    }

    pub fn config(&self) -> &MediatorConfig {
        &self.config
    }

    /// Read access to the wrapped delegate (inspection and tests).
    pub fn delegate_ref(&self) -> &D {
        &self.delegate
    }
}

fn cue_summary(verdict: &RiskVerdict) -> String {
    verdict.cues.iter().cloned().collect::<Vec<_>>().join(", ")
}

fn mitigate_close(reference: &str, verdict: &RiskVerdict, evidence: &Evidence) -> Decision {
    Decision::new(
        format!("click('{reference}')"),
        ActionInfo {
            think: format!(
                "Detected likely prompt-injection ({}). Attempting to close modal via button {}.",
                cue_summary(verdict),
                reference
            ),
            stats: ActionStats {
                security_cues: verdict.cues.iter().cloned().collect(),
                mitigation: Some(Mitigation::Close),
                blocked_secret_action: false,
            },
            security: evidence.clone(),
            audit: None,
        },
    )
}

fn mitigate_notify(verdict: &RiskVerdict, evidence: &Evidence) -> Decision {
    Decision::new(
        format!("send_msg_to_user(\"{NOTIFY_MESSAGE}\")"),
        ActionInfo {
            think: format!(
                "Detected likely prompt-injection ({}). Refusing to follow on-page \
instructions that override the goal.",
                cue_summary(verdict)
            ),
            stats: ActionStats {
                security_cues: verdict.cues.iter().cloned().collect(),
                mitigation: Some(Mitigation::Notify),
                blocked_secret_action: false,
            },
            security: evidence.clone(),
            audit: None,
        },
    )
}

/// Replace a vetoed candidate with the fixed safe refusal, keeping the
/// delegate's metadata under `audit`.
fn block_candidate(candidate: Decision, evidence: &Evidence) -> Decision {
    Decision::new(
        format!("send_msg_to_user(\"{REFUSAL_MESSAGE}\")"),
        ActionInfo {
            think: "Blocked an action that appears to include a secret value. \
Replacing with a safe user message."
                .to_string(),
            stats: ActionStats {
                security_cues: Vec::new(),
                mitigation: None,
                blocked_secret_action: true,
            },
            security: evidence.clone(),
            audit: Some(Box::new(candidate.info)),
        },
    )
}
