//! Sentinel State - domain model and single-writer store
//!
//! The single source of truth for the verifiable-identity demo:
//! - Documents, activity history, the six pipeline agents
//! - The zero-knowledge-proof lifecycle record
//! - Policy settings and the user session
//!
//! All mutation goes through a closed set of [`Action`]s applied by the pure
//! [`reduce`] function inside a [`Store`].
//!
//! # Example
//!
//! ```rust
//! use sentinel_state::{Action, AppState, Store};
//!
//! let store = Store::new(AppState::default());
//! store.dispatch(Action::SetHasLaunched(true));
//! assert!(store.snapshot().has_launched);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod action;
pub mod entities;
pub mod error;
pub mod patch;
pub mod store;
pub mod transition;
pub mod types;

// Re-exports for convenience
pub use action::{reduce, Action};
pub use entities::{
    file_extension, ActivityEvent, Agent, AppState, Document, Settings, User, ZkProof,
    ACTIVITY_LOG_CAPACITY, DEFAULT_NETWORK,
};
pub use error::{IllegalTransition, ValidationError};
pub use patch::{AgentPatch, DocumentPatch, SettingsPatch, UserPatch, ZkProofPatch};
pub use store::{StateChange, Store};
pub use transition::{allowed_transitions, validate_transition};
pub use types::{
    ActivityId, ActivityType, AgentId, AgentStatus, DocumentId, DocumentStatus, Percentage,
    ProofId, ProofStatus, RedactionLevel, RetentionPeriod, Severity, Timestamp, UserId,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
