//! Proof lifecycle controller
//!
//! NotGenerated -> Generating -> Generated -> Submitting -> Submitted.
//! Purely forward. Both `generate` and `submit` move to their in-progress
//! status immediately and finish after a fixed simulated delay.

use crate::error::{EngineError, ProofError, TimerError};
use crate::timer::TimerHandle;
use chrono::Utc;
use rand::Rng;
use sentinel_state::{
    Action, ActivityEvent, AgentId, AgentPatch, AgentStatus, ProofId, ProofStatus, Store,
    ZkProofPatch,
};
use std::time::Duration;
use tokio::runtime::Handle;

const PROOF_ID_PREFIX: &str = "zk_";
const PROOF_ID_LEN: usize = 9;
const PROOF_ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Fresh opaque proof token
#[must_use]
pub fn new_proof_id() -> ProofId {
    let mut rng = rand::rng();
    let suffix: String = (0..PROOF_ID_LEN)
        .map(|_| char::from(PROOF_ID_ALPHABET[rng.random_range(0..PROOF_ID_ALPHABET.len())]))
        .collect();
    ProofId(format!("{PROOF_ID_PREFIX}{suffix}"))
}

/// Proof controller settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofConfig {
    pub generation_delay: Duration,
    pub submission_delay: Duration,
    pub network: String,
}

/// Drives the singleton proof record
#[derive(Debug, Clone)]
pub struct ProofController {
    store: Store,
    config: ProofConfig,
}

impl ProofController {
    /// Create new controller over `store`
    #[inline]
    #[must_use]
    pub fn new(store: Store, config: ProofConfig) -> Self {
        Self { store, config }
    }

    /// Start proof generation
    ///
    /// # Returns
    /// Handle to the pending completion; awaiting it is optional
    ///
    /// # Errors
    /// - `ProofError::InvalidState` unless the proof is NotGenerated
    /// - `TimerError::NoRuntime` outside a tokio runtime
    pub fn generate(&self) -> Result<TimerHandle, EngineError> {
        let runtime = Handle::try_current().map_err(|_| TimerError::NoRuntime)?;
        let now = Utc::now();

        self.store.transact(|state| {
            let actual = state.zk_proof.status;
            if actual != ProofStatus::NotGenerated {
                return (Vec::new(), Err(invalid("generate", ProofStatus::NotGenerated, actual)));
            }
            let actions = vec![
                Action::UpdateZkProof(ZkProofPatch::status(ProofStatus::Generating)),
                Action::AddActivity(ActivityEvent::analysis(
                    "ZK Proof Generation Started",
                    "Generating zero-knowledge proof for verification",
                    now,
                )),
            ];
            (actions, Ok(()))
        })?;
        tracing::info!("proof generation started");

        let store = self.store.clone();
        Ok(TimerHandle::schedule_on(
            &runtime,
            self.config.generation_delay,
            move || finish_generation(&store),
        ))
    }

    /// Submit the generated proof to the credential network
    ///
    /// # Returns
    /// Handle to the pending completion; awaiting it is optional
    ///
    /// # Errors
    /// - `ProofError::InvalidState` unless the proof is Generated
    /// - `TimerError::NoRuntime` outside a tokio runtime
    pub fn submit(&self) -> Result<TimerHandle, EngineError> {
        let runtime = Handle::try_current().map_err(|_| TimerError::NoRuntime)?;
        let now = Utc::now();

        self.store.transact(|state| {
            let actual = state.zk_proof.status;
            if actual != ProofStatus::Generated {
                return (Vec::new(), Err(invalid("submit", ProofStatus::Generated, actual)));
            }
            let actions = vec![
                Action::UpdateZkProof(ZkProofPatch::status(ProofStatus::Submitting)),
                Action::UpdateAgent {
                    id: AgentId::OnChainNotary,
                    patch: AgentPatch::new(AgentStatus::Running, now),
                },
                Action::AddActivity(ActivityEvent::analysis(
                    "On-Chain Submission Started",
                    "Submitting credential to blockchain network",
                    now,
                )),
            ];
            (actions, Ok(()))
        })?;
        tracing::info!(network = %self.config.network, "proof submission started");

        let store = self.store.clone();
        let network = self.config.network.clone();
        Ok(TimerHandle::schedule_on(
            &runtime,
            self.config.submission_delay,
            move || finish_submission(&store, &network),
        ))
    }
}

fn invalid(operation: &'static str, required: ProofStatus, actual: ProofStatus) -> ProofError {
    ProofError::InvalidState {
        operation,
        required,
        actual,
    }
}

fn finish_generation(store: &Store) {
    let now = Utc::now();
    let proof_id = store.transact(|state| {
        if state.zk_proof.status != ProofStatus::Generating {
            return (Vec::new(), None);
        }
        let proof_id = new_proof_id();
        let actions = vec![
            Action::UpdateZkProof(ZkProofPatch::generated(proof_id.clone(), now)),
            Action::UpdateAgent {
                id: AgentId::ZkCryptographer,
                patch: AgentPatch::new(AgentStatus::Completed, now),
            },
            Action::AddActivity(ActivityEvent::analysis(
                "ZK Proof Generated",
                format!("Zero-knowledge proof {proof_id} generated successfully"),
                now,
            )),
        ];
        (actions, Some(proof_id))
    });
    if let Some(proof_id) = proof_id {
        tracing::info!(%proof_id, "proof generated");
    }
}

fn finish_submission(store: &Store, network: &str) {
    let now = Utc::now();
    let submitted = store.transact(|state| {
        if state.zk_proof.status != ProofStatus::Submitting {
            return (Vec::new(), false);
        }
        let actions = vec![
            Action::UpdateZkProof(ZkProofPatch::submitted(network, now)),
            Action::UpdateAgent {
                id: AgentId::OnChainNotary,
                patch: AgentPatch::new(AgentStatus::Completed, now),
            },
            Action::AddActivity(ActivityEvent::analysis(
                "Credential Issued",
                format!("Credential successfully issued on {network} network"),
                now,
            )),
        ];
        (actions, true)
    });
    if submitted {
        tracing::info!(network, "credential issued");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_state::AppState;
    use std::collections::HashSet;

    fn controller() -> (Store, ProofController) {
        let store = Store::new(AppState::default());
        let config = ProofConfig {
            generation_delay: Duration::from_secs(3),
            submission_delay: Duration::from_secs(4),
            network: "Polygon Amoy".to_string(),
        };
        (store.clone(), ProofController::new(store, config))
    }

    #[test]
    fn proof_ids_are_opaque_and_distinct() {
        let ids: HashSet<_> = (0..200).map(|_| new_proof_id()).collect();
        assert_eq!(ids.len(), 200);
    }

    #[tokio::test(start_paused = true)]
    async fn generate_sets_generating_immediately() {
        let (store, proofs) = controller();
        let pending = proofs.generate().unwrap();

        let state = store.snapshot();
        assert_eq!(state.zk_proof.status, ProofStatus::Generating);
        assert!(state.zk_proof.proof_id.is_none());
        assert_eq!(state.activities[0].title, "ZK Proof Generation Started");

        assert!(pending.wait().await);
        let state = store.snapshot();
        assert_eq!(state.zk_proof.status, ProofStatus::Generated);
        assert!(state.zk_proof.generated_at.is_some());
        assert_eq!(state.agent_status(AgentId::ZkCryptographer), AgentStatus::Completed);
        let proof_id = state.zk_proof.proof_id.clone().unwrap();
        assert!(state.activities[0].description.contains(proof_id.as_str()));
    }

    #[tokio::test(start_paused = true)]
    async fn generate_twice_is_rejected() {
        let (_store, proofs) = controller();
        let _pending = proofs.generate().unwrap();
        let err = proofs.generate().unwrap_err();
        assert!(matches!(
            err,
            EngineError::Proof(ProofError::InvalidState {
                actual: ProofStatus::Generating,
                ..
            })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn submit_requires_generated_proof() {
        let (store, proofs) = controller();
        assert!(proofs.submit().is_err());
        assert_eq!(store.snapshot().zk_proof.status, ProofStatus::NotGenerated);
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn generate_outside_runtime_fails_without_side_effects() {
        let (store, proofs) = controller();
        assert!(matches!(
            proofs.generate(),
            Err(EngineError::Timer(TimerError::NoRuntime))
        ));
        assert_eq!(store.snapshot().zk_proof.status, ProofStatus::NotGenerated);
    }
}
