//! Sentinel Core - workflow engine over the Sentinel state store
//!
//! Everything that drives state forward:
//! - Retention scheduling with cancellable per-document timers
//! - The six-agent pipeline, advanced by workflow phase signals
//! - The zero-knowledge-proof lifecycle with simulated delays
//! - Session login/logout with durable persistence
//! - Document intake and the credit analysis backend boundary
//!
//! # Example
//!
//! ```rust,no_run
//! use sentinel_core::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), EngineError> {
//! let config = EngineConfig::new();
//! let engine = SentinelEngine::start(
//!     config.clone(),
//!     session_backend_for(&config),
//!     Arc::new(DigestBackend),
//! )?;
//!
//! let doc = engine.documents().upload_document("statement.pdf", b"%PDF-1.7")?;
//! engine.pipeline().handle(Phase::Upload);
//! engine.proofs().generate()?.wait().await;
//! # let _ = doc;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod analysis;
pub mod config;
pub mod documents;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod proof;
pub mod retention;
pub mod session;
pub mod timer;

// Re-exports for convenience
pub use analysis::{
    AnalysisBackend, CreditAssessment, CreditScorer, DigestBackend, FixedScoreBackend,
    OfflineBackend, ScoreSource, MAX_CREDIT_SCORE, MIN_CREDIT_SCORE,
};
pub use config::EngineConfig;
pub use documents::{AnalysisOutcome, DocumentService};
pub use engine::{session_backend_for, SentinelEngine};
pub use error::{AnalysisError, ConfigError, EngineError, ProofError, SessionError, TimerError};
pub use pipeline::{plan, Phase, PipelineOrchestrator, PipelineSignal, Step};
pub use proof::{new_proof_id, ProofConfig, ProofController};
pub use retention::{expire, RetentionScheduler};
pub use session::{
    Credentials, FileSessionStore, MemorySessionStore, PersistedSession, SessionManager,
    SessionStore, SignupForm, SESSION_KEY,
};
pub use timer::TimerHandle;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving the engine
    pub use crate::{
        session_backend_for, AnalysisOutcome, Credentials, DigestBackend, EngineConfig,
        EngineError, Phase, PipelineSignal, SentinelEngine, SessionStore, SignupForm,
    };
    pub use sentinel_state::{Action, AgentId, AppState, SettingsPatch, Store};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
