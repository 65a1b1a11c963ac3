//! Credit analysis backend
//!
//! The scoring service sits behind [`AnalysisBackend`]. When it fails, the
//! scorer substitutes the configured fallback score, and the substitution is
//! reported both in the returned [`CreditAssessment`] and as a Warning alert
//! in the activity log.

use crate::error::AnalysisError;
use chrono::Utc;
use sentinel_state::{Action, ActivityEvent, ActivityType, Severity, Store};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Lowest score a backend may report
pub const MIN_CREDIT_SCORE: u32 = 300;
/// Highest score a backend may report
pub const MAX_CREDIT_SCORE: u32 = 850;

/// Remote credit scoring service
#[async_trait::async_trait]
pub trait AnalysisBackend: Send + Sync + std::fmt::Debug {
    /// Score the given document content
    async fn score(&self, content: &[u8]) -> Result<u32, AnalysisError>;
}

/// Backend answering every request with the same score
#[derive(Debug, Clone, Copy)]
pub struct FixedScoreBackend(pub u32);

#[async_trait::async_trait]
impl AnalysisBackend for FixedScoreBackend {
    async fn score(&self, _content: &[u8]) -> Result<u32, AnalysisError> {
        Ok(self.0)
    }
}

/// Backend that is never reachable
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineBackend;

#[async_trait::async_trait]
impl AnalysisBackend for OfflineBackend {
    async fn score(&self, _content: &[u8]) -> Result<u32, AnalysisError> {
        Err(AnalysisError::Unavailable("backend offline".to_string()))
    }
}

/// Deterministic local scorer keyed on the content digest
#[derive(Debug, Clone, Copy, Default)]
pub struct DigestBackend;

#[async_trait::async_trait]
impl AnalysisBackend for DigestBackend {
    async fn score(&self, content: &[u8]) -> Result<u32, AnalysisError> {
        if content.is_empty() {
            return Err(AnalysisError::Rejected("empty document".to_string()));
        }
        let digest = Sha256::digest(content);
        let seed = u32::from(u16::from_be_bytes([digest[0], digest[1]]));
        Ok(MIN_CREDIT_SCORE + seed % (MAX_CREDIT_SCORE - MIN_CREDIT_SCORE + 1))
    }
}

/// Where a score came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreSource {
    Backend,
    Fallback,
}

/// Result of a credit assessment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditAssessment {
    pub score: u32,
    pub source: ScoreSource,
}

impl CreditAssessment {
    #[inline]
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.source == ScoreSource::Fallback
    }
}

/// Scores documents, substituting a fallback when the backend fails
#[derive(Debug, Clone)]
pub struct CreditScorer {
    store: Store,
    backend: Arc<dyn AnalysisBackend>,
    fallback: u32,
}

impl CreditScorer {
    #[inline]
    #[must_use]
    pub fn new(store: Store, backend: Arc<dyn AnalysisBackend>, fallback: u32) -> Self {
        Self {
            store,
            backend,
            fallback,
        }
    }

    /// Score `content`
    ///
    /// Never fails: backend errors yield the fallback score.
    pub async fn score_with_fallback(&self, content: &[u8]) -> CreditAssessment {
        match self.backend.score(content).await {
            Ok(score) => {
                tracing::debug!(score, "credit score from backend");
                CreditAssessment {
                    score,
                    source: ScoreSource::Backend,
                }
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    fallback = self.fallback,
                    "analysis backend failed; using fallback score"
                );
                self.store.dispatch(Action::AddActivity(ActivityEvent::new(
                    ActivityType::Alert,
                    Severity::Warning,
                    "Analysis Backend Unavailable",
                    format!("Credit score defaulted to {} ({e})", self.fallback),
                    Utc::now(),
                )));
                CreditAssessment {
                    score: self.fallback,
                    source: ScoreSource::Fallback,
                }
            }
        }
    }
}
