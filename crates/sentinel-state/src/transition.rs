//! Agent status transition table
//!
//! The pipeline normally walks each agent Idle -> Running -> Completed.
//! Completed and Error agents may be restarted by a new run.

use crate::error::IllegalTransition;
use crate::types::AgentStatus;

/// Validates an agent status transition.
pub fn validate_transition(from: AgentStatus, to: AgentStatus) -> Result<(), IllegalTransition> {
    if allowed(from, to) {
        Ok(())
    } else {
        Err(IllegalTransition { from, to })
    }
}

#[must_use]
pub fn allowed_transitions(from: AgentStatus) -> Vec<AgentStatus> {
    use AgentStatus::*;
    match from {
        Idle => vec![Running, Error],
        Running => vec![Completed, Error],
        Completed => vec![Running],
        Error => vec![Running],
    }
}

fn allowed(from: AgentStatus, to: AgentStatus) -> bool {
    allowed_transitions(from).into_iter().any(|s| s == to)
}
