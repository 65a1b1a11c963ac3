mod common;

use common::engine;
use sentinel_core::{EngineError, ProofError};
use sentinel_state::{AgentId, AgentStatus, ProofStatus};
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_status_steps_through_every_stage_and_proof_id_stable() {
    let engine = engine();
    let mut rx = engine.store().subscribe();

    engine.proofs().generate().unwrap().wait().await;
    let generated_id = engine.store().snapshot().zk_proof.proof_id.clone().unwrap();
    assert!(generated_id.as_str().starts_with("zk_"));
    assert_eq!(generated_id.as_str().len(), 12);

    let submission = engine.proofs().submit().unwrap();
    let submitting = engine.store().snapshot();
    assert_eq!(submitting.zk_proof.status, ProofStatus::Submitting);
    assert_eq!(
        submitting.agent_status(AgentId::OnChainNotary),
        AgentStatus::Running
    );
    assert!(submission.wait().await);

    let mut statuses = vec![ProofStatus::NotGenerated];
    let mut seen_id = None;
    while let Ok(change) = rx.try_recv() {
        let proof = &change.state.zk_proof;
        let prev = statuses[statuses.len() - 1];
        if proof.status != prev {
            assert_eq!(
                prev.next(),
                Some(proof.status),
                "{:?} after {prev:?}",
                proof.status
            );
            statuses.push(proof.status);
        }
        if let Some(id) = &seen_id {
            assert_eq!(proof.proof_id.as_ref(), Some(id));
        }
        if proof.proof_id.is_some() {
            seen_id.clone_from(&proof.proof_id);
        }
    }
    assert_eq!(
        statuses,
        [
            ProofStatus::NotGenerated,
            ProofStatus::Generating,
            ProofStatus::Generated,
            ProofStatus::Submitting,
            ProofStatus::Submitted,
        ]
    );

    let state = engine.store().snapshot();
    assert_eq!(state.zk_proof.proof_id, Some(generated_id));
    assert!(state.zk_proof.submitted_at >= state.zk_proof.generated_at);
    assert_eq!(state.agent_status(AgentId::OnChainNotary), AgentStatus::Completed);
    assert_eq!(state.activities[0].title, "Credential Issued");
    assert_eq!(
        state.activities[0].description,
        "Credential successfully issued on Polygon Amoy network"
    );
}

#[tokio::test(start_paused = true)]
async fn test_submit_while_generating_is_rejected() {
    let engine = engine();
    let pending = engine.proofs().generate().unwrap();

    let err = engine.proofs().submit().unwrap_err();
    assert!(matches!(
        err,
        EngineError::Proof(ProofError::InvalidState {
            required: ProofStatus::Generated,
            actual: ProofStatus::Generating,
            ..
        })
    ));
    assert!(err.is_recoverable());

    assert!(pending.wait().await);
    assert!(engine.proofs().submit().is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_generation_completes_after_configured_delay() {
    let engine = engine();
    let _pending = engine.proofs().generate().unwrap();

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(
        engine.store().snapshot().zk_proof.status,
        ProofStatus::Generating
    );

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(
        engine.store().snapshot().zk_proof.status,
        ProofStatus::Generated
    );
}

#[tokio::test(start_paused = true)]
async fn test_submitted_proof_cannot_restart() {
    let engine = engine();
    engine.proofs().generate().unwrap().wait().await;
    engine.proofs().submit().unwrap().wait().await;

    assert!(engine.proofs().generate().is_err());
    assert!(engine.proofs().submit().is_err());
    assert_eq!(
        engine.store().snapshot().zk_proof.status,
        ProofStatus::Submitted
    );
}
