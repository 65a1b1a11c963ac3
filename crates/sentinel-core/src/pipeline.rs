//! Pipeline orchestrator
//!
//! Maps workflow signals onto agent status transitions and activity events.
//! Each signal's effects are planned from a fixed table and applied as one
//! store transaction, so a handoff (one agent completing while the next
//! starts) is never interleaved with other dispatches.
//!
//! | Signal | Effects |
//! |---|---|
//! | interview started | Voice Interviewer Running |
//! | interview completed | Voice Interviewer Completed |
//! | phase `upload` | Document Auditor Running |
//! | phase `scan` | Document Auditor Completed (+ PII event if enabled) |
//! | phase `shield` | Cross-Verifier Running |
//! | phase `verify` | Cross-Verifier Completed, Financial Analyst Running |
//! | phase `complete` | Financial Analyst Completed, ZK-Cryptographer Running |

use chrono::Utc;
use sentinel_state::{
    validate_transition, Action, ActivityEvent, ActivityType, AgentId, AgentPatch, AgentStatus,
    Settings, Severity, Store,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Workflow phases reported by the analysis flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Upload,
    Scan,
    Shield,
    Verify,
    Complete,
}

impl Phase {
    /// All phases in flow order
    pub const ALL: [Phase; 5] = [
        Phase::Upload,
        Phase::Scan,
        Phase::Shield,
        Phase::Verify,
        Phase::Complete,
    ];

    /// The phase that follows this one
    #[inline]
    #[must_use]
    pub fn next(&self) -> Option<Phase> {
        match self {
            Phase::Upload => Some(Phase::Scan),
            Phase::Scan => Some(Phase::Shield),
            Phase::Shield => Some(Phase::Verify),
            Phase::Verify => Some(Phase::Complete),
            Phase::Complete => None,
        }
    }
}

/// External signal driving the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineSignal {
    InterviewStarted,
    InterviewCompleted,
    Phase(Phase),
}

impl From<Phase> for PipelineSignal {
    fn from(phase: Phase) -> Self {
        PipelineSignal::Phase(phase)
    }
}

/// One planned effect
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Set an agent's status
    Transition { agent: AgentId, status: AgentStatus },
    /// Emit an Info/Analysis activity event
    Emit {
        title: &'static str,
        description: &'static str,
    },
}

impl Step {
    const fn transition(agent: AgentId, status: AgentStatus) -> Self {
        Step::Transition { agent, status }
    }

    const fn emit(title: &'static str, description: &'static str) -> Self {
        Step::Emit { title, description }
    }
}

/// Effects of `signal` under `settings`, in application order
#[must_use]
pub fn plan(signal: PipelineSignal, settings: &Settings) -> Vec<Step> {
    use AgentStatus::{Completed, Running};
    match signal {
        PipelineSignal::InterviewStarted => vec![
            Step::transition(AgentId::VoiceInterviewer, Running),
            Step::emit(
                "Voice Interview Started",
                "Voice Interviewer agent initiated identity verification",
            ),
        ],
        PipelineSignal::InterviewCompleted => vec![
            Step::transition(AgentId::VoiceInterviewer, Completed),
            Step::emit(
                "Voice Interview Completed",
                "Voice Interviewer agent finished identity verification",
            ),
        ],
        PipelineSignal::Phase(Phase::Upload) => vec![
            Step::transition(AgentId::DocumentAuditor, Running),
            Step::emit("Document Auditor Started", "Initiating document audit process"),
        ],
        PipelineSignal::Phase(Phase::Scan) => {
            let mut steps = vec![
                Step::transition(AgentId::DocumentAuditor, Completed),
                Step::emit(
                    "Document Auditor Completed",
                    "Document audit process finished successfully",
                ),
            ];
            if settings.enable_pii_detection {
                steps.push(Step::emit(
                    "PII Detection Completed",
                    "Personally Identifiable Information scanned and flagged",
                ));
            }
            steps
        }
        PipelineSignal::Phase(Phase::Shield) => vec![
            Step::transition(AgentId::CrossVerifier, Running),
            Step::emit("Cross-Verifier Started", "Initiating cross-reference verification"),
        ],
        PipelineSignal::Phase(Phase::Verify) => vec![
            Step::transition(AgentId::CrossVerifier, Completed),
            Step::emit("Cross-Verifier Completed", "Cross-reference verification finished"),
            Step::transition(AgentId::FinancialAnalyst, Running),
            Step::emit("Financial Analyst Started", "Beginning financial data analysis"),
        ],
        PipelineSignal::Phase(Phase::Complete) => vec![
            Step::transition(AgentId::FinancialAnalyst, Completed),
            Step::emit(
                "Financial Analyst Completed",
                "Financial analysis and risk assessment complete",
            ),
            Step::transition(AgentId::ZkCryptographer, Running),
            Step::emit(
                "ZK-Cryptographer Started",
                "Initiating zero-knowledge proof generation",
            ),
        ],
    }
}

/// Drives agent status from workflow signals
#[derive(Debug, Clone)]
pub struct PipelineOrchestrator {
    store: Store,
}

impl PipelineOrchestrator {
    /// Create new orchestrator over `store`
    #[inline]
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Apply the effects of `signal`
    ///
    /// Transitions outside the agent transition table are still applied so
    /// that no agent is left Running once its completing signal arrives;
    /// they are logged as warnings.
    ///
    /// # Returns
    /// The activity events emitted, in emission order
    pub fn handle(&self, signal: impl Into<PipelineSignal>) -> Vec<ActivityEvent> {
        let signal = signal.into();
        let now = Utc::now();
        let emitted = self.store.transact(|state| {
            let steps = plan(signal, &state.settings);
            let mut projected: HashMap<AgentId, AgentStatus> = HashMap::new();
            let mut actions = Vec::with_capacity(steps.len());
            let mut emitted = Vec::new();

            for step in steps {
                match step {
                    Step::Transition { agent, status } => {
                        let from = projected
                            .get(&agent)
                            .copied()
                            .unwrap_or_else(|| state.agent_status(agent));
                        if let Err(e) = validate_transition(from, status) {
                            tracing::warn!(
                                ?agent,
                                ?signal,
                                error = %e,
                                "out-of-order agent transition"
                            );
                        }
                        projected.insert(agent, status);
                        actions.push(Action::UpdateAgent {
                            id: agent,
                            patch: AgentPatch::new(status, now),
                        });
                    }
                    Step::Emit { title, description } => {
                        let event = ActivityEvent::analysis(title, description, now);
                        emitted.push(event.clone());
                        actions.push(Action::AddActivity(event));
                    }
                }
            }
            (actions, emitted)
        });

        tracing::info!(?signal, events = emitted.len(), "pipeline signal handled");
        emitted
    }

    /// Record an out-of-band failure of `agent`
    ///
    /// # Returns
    /// The Critical alert emitted
    pub fn report_agent_failure(&self, agent: AgentId, reason: &str) -> ActivityEvent {
        let now = Utc::now();
        let event = ActivityEvent::new(
            ActivityType::Alert,
            Severity::Critical,
            format!("{} Failed", agent.name()),
            reason.to_string(),
            now,
        );
        self.store.dispatch_all([
            Action::UpdateAgent {
                id: agent,
                patch: AgentPatch::new(AgentStatus::Error, now),
            },
            Action::AddActivity(event.clone()),
        ]);
        tracing::warn!(?agent, reason, "agent failure reported");
        event
    }
}
