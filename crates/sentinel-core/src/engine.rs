//! Engine facade
//!
//! [`SentinelEngine`] wires every component to one [`Store`]. Components hold
//! clones of the store handle; there is no other shared mutable state.

use crate::analysis::{AnalysisBackend, CreditScorer};
use crate::config::EngineConfig;
use crate::documents::DocumentService;
use crate::error::EngineError;
use crate::pipeline::PipelineOrchestrator;
use crate::proof::{ProofConfig, ProofController};
use crate::retention::RetentionScheduler;
use crate::session::{FileSessionStore, MemorySessionStore, SessionManager, SessionStore};
use chrono::Utc;
use sentinel_state::{Action, AppState, Settings, SettingsPatch, Store};
use std::sync::Arc;

/// Session backend selected by `config.session_path`
#[must_use]
pub fn session_backend_for(config: &EngineConfig) -> Arc<dyn SessionStore> {
    match &config.session_path {
        Some(dir) => Arc::new(FileSessionStore::new(dir.clone())),
        None => Arc::new(MemorySessionStore::new()),
    }
}

/// The running engine
#[derive(Debug)]
pub struct SentinelEngine {
    config: EngineConfig,
    store: Store,
    documents: DocumentService,
    pipeline: PipelineOrchestrator,
    proofs: ProofController,
    session: SessionManager,
    scorer: CreditScorer,
}

impl SentinelEngine {
    /// Build the engine and restore any persisted session
    ///
    /// The session is restored before this returns, so the first snapshot
    /// already reflects it.
    ///
    /// # Errors
    /// - `EngineError::Config` if `config` is out of range
    /// - `EngineError::Session` if the session backend cannot be read
    pub fn start(
        config: EngineConfig,
        session_backend: Arc<dyn SessionStore>,
        analysis_backend: Arc<dyn AnalysisBackend>,
    ) -> Result<Self, EngineError> {
        config
            .validate()
            .map_err(|e| EngineError::Config(e.into()))?;

        let initial = AppState::initial(config.settings.clone(), config.network.clone(), Utc::now())
            .with_activity_capacity(config.activity_capacity);
        let store = Store::new(initial);

        let retention = RetentionScheduler::new(store.clone(), config.retention_day());
        let documents = DocumentService::new(store.clone(), retention);
        let pipeline = PipelineOrchestrator::new(store.clone());
        let proofs = ProofController::new(
            store.clone(),
            ProofConfig {
                generation_delay: config.proof_generation_delay(),
                submission_delay: config.proof_submission_delay(),
                network: config.network.clone(),
            },
        );
        let session = SessionManager::new(store.clone(), session_backend);
        let scorer = CreditScorer::new(
            store.clone(),
            analysis_backend,
            config.fallback_credit_score,
        );

        let restored = session.restore()?;
        tracing::info!(
            network = %config.network,
            restored_session = restored,
            "engine started"
        );

        Ok(Self {
            config,
            store,
            documents,
            pipeline,
            proofs,
            session,
            scorer,
        })
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    #[inline]
    #[must_use]
    pub fn documents(&self) -> &DocumentService {
        &self.documents
    }

    #[inline]
    #[must_use]
    pub fn pipeline(&self) -> &PipelineOrchestrator {
        &self.pipeline
    }

    #[inline]
    #[must_use]
    pub fn proofs(&self) -> &ProofController {
        &self.proofs
    }

    #[inline]
    #[must_use]
    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    #[inline]
    #[must_use]
    pub fn scorer(&self) -> &CreditScorer {
        &self.scorer
    }

    /// Merge `patch` into the policy settings
    ///
    /// Already-armed retention timers keep the window they were armed with.
    pub fn update_settings(&self, patch: SettingsPatch) -> Settings {
        let state = self.store.dispatch(Action::UpdateSettings(patch));
        tracing::info!(
            auto_delete = state.settings.auto_delete_expired,
            retention_days = state.settings.retention_duration.days(),
            "settings updated"
        );
        state.settings.clone()
    }

    /// Record that the user has passed the launch screen
    #[inline]
    pub fn set_has_launched(&self, launched: bool) {
        self.store.dispatch(Action::SetHasLaunched(launched));
    }
}
