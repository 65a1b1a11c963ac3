//! Partial updates merged into entities by the reducer
//!
//! A `None` field leaves the target untouched.

use crate::entities::{Agent, Document, Settings, User, ZkProof};
use crate::types::{
    AgentStatus, DocumentStatus, Percentage, ProofId, ProofStatus, RedactionLevel,
    RetentionPeriod, Severity, Timestamp,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Partial [`Document`] update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentPatch {
    pub status: Option<DocumentStatus>,
    pub risk_score: Option<Percentage>,
    pub sensitive_data: Option<BTreeSet<String>>,
    pub expired: Option<bool>,
}

impl DocumentPatch {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: DocumentStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_risk_score(mut self, score: Percentage) -> Self {
        self.risk_score = Some(score);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_sensitive_data(mut self, labels: BTreeSet<String>) -> Self {
        self.sensitive_data = Some(labels);
        self
    }

    #[inline]
    #[must_use]
    pub fn expired() -> Self {
        Self {
            expired: Some(true),
            ..Self::default()
        }
    }

    pub(crate) fn apply(&self, doc: &mut Document) {
        if let Some(status) = self.status {
            doc.status = status;
        }
        if let Some(score) = self.risk_score {
            doc.risk_score = score;
        }
        if let Some(labels) = &self.sensitive_data {
            doc.sensitive_data.clone_from(labels);
        }
        if let Some(expired) = self.expired {
            doc.expired = expired;
        }
    }
}

/// Partial [`Agent`] update. Only status and timestamp are mutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentPatch {
    pub status: AgentStatus,
    pub last_updated: Timestamp,
}

impl AgentPatch {
    #[inline]
    #[must_use]
    pub fn new(status: AgentStatus, last_updated: Timestamp) -> Self {
        Self {
            status,
            last_updated,
        }
    }

    pub(crate) fn apply(&self, agent: &mut Agent) {
        agent.status = self.status;
        agent.last_updated = self.last_updated;
    }
}

/// Partial [`ZkProof`] update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZkProofPatch {
    pub status: Option<ProofStatus>,
    pub proof_id: Option<ProofId>,
    pub generated_at: Option<Timestamp>,
    pub submitted_at: Option<Timestamp>,
    pub network: Option<String>,
}

impl ZkProofPatch {
    #[inline]
    #[must_use]
    pub fn status(status: ProofStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    #[inline]
    #[must_use]
    pub fn generated(proof_id: ProofId, at: Timestamp) -> Self {
        Self {
            status: Some(ProofStatus::Generated),
            proof_id: Some(proof_id),
            generated_at: Some(at),
            ..Self::default()
        }
    }

    #[inline]
    #[must_use]
    pub fn submitted(network: impl Into<String>, at: Timestamp) -> Self {
        Self {
            status: Some(ProofStatus::Submitted),
            submitted_at: Some(at),
            network: Some(network.into()),
            ..Self::default()
        }
    }

    /// Merge into `proof`. A proof id, once assigned, is never replaced.
    pub(crate) fn apply(&self, proof: &mut ZkProof) {
        if let Some(status) = self.status {
            proof.status = status;
        }
        if let Some(id) = &self.proof_id {
            if proof.proof_id.is_none() {
                proof.proof_id = Some(id.clone());
            } else {
                tracing::warn!(
                    existing = ?proof.proof_id,
                    rejected = %id,
                    "proof id already assigned"
                );
            }
        }
        if let Some(at) = self.generated_at {
            proof.generated_at = Some(at);
        }
        if let Some(at) = self.submitted_at {
            proof.submitted_at = Some(at);
        }
        if let Some(network) = &self.network {
            proof.network = Some(network.clone());
        }
    }
}

/// Partial [`Settings`] update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsPatch {
    pub enable_pii_detection: Option<bool>,
    pub auto_encrypt: Option<bool>,
    pub risk_threshold: Option<Percentage>,
    pub redaction_level: Option<RedactionLevel>,
    pub allowed_file_types: Option<BTreeSet<String>>,
    pub retention_duration: Option<RetentionPeriod>,
    pub auto_delete_expired: Option<bool>,
    pub email_alerts: Option<bool>,
    pub dashboard_alerts: Option<bool>,
    pub min_severity: Option<Severity>,
}

impl SettingsPatch {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn with_pii_detection(mut self, enabled: bool) -> Self {
        self.enable_pii_detection = Some(enabled);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_auto_delete(mut self, enabled: bool) -> Self {
        self.auto_delete_expired = Some(enabled);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_retention(mut self, period: RetentionPeriod) -> Self {
        self.retention_duration = Some(period);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_risk_threshold(mut self, threshold: Percentage) -> Self {
        self.risk_threshold = Some(threshold);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_min_severity(mut self, severity: Severity) -> Self {
        self.min_severity = Some(severity);
        self
    }

    /// Allowed extensions are normalised to upper case
    #[must_use]
    pub fn with_allowed_file_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed_file_types = Some(
            types
                .into_iter()
                .map(|t| t.as_ref().to_ascii_uppercase())
                .collect(),
        );
        self
    }

    pub(crate) fn apply(&self, settings: &mut Settings) {
        if let Some(v) = self.enable_pii_detection {
            settings.enable_pii_detection = v;
        }
        if let Some(v) = self.auto_encrypt {
            settings.auto_encrypt = v;
        }
        if let Some(v) = self.risk_threshold {
            settings.risk_threshold = v;
        }
        if let Some(v) = self.redaction_level {
            settings.redaction_level = v;
        }
        if let Some(v) = &self.allowed_file_types {
            settings.allowed_file_types.clone_from(v);
        }
        if let Some(v) = self.retention_duration {
            settings.retention_duration = v;
        }
        if let Some(v) = self.auto_delete_expired {
            settings.auto_delete_expired = v;
        }
        if let Some(v) = self.email_alerts {
            settings.email_alerts = v;
        }
        if let Some(v) = self.dashboard_alerts {
            settings.dashboard_alerts = v;
        }
        if let Some(v) = self.min_severity {
            settings.min_severity = v;
        }
    }
}

/// Partial [`User`] update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPatch {
    pub email: Option<String>,
    pub phone: Option<String>,
    /// `Some(None)` clears the avatar
    pub avatar_url: Option<Option<String>>,
}

impl UserPatch {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_avatar(mut self, url: Option<String>) -> Self {
        self.avatar_url = Some(url);
        self
    }

    /// Merge into a copy of `user`
    #[must_use]
    pub fn merged(&self, user: &User) -> User {
        let mut next = user.clone();
        if let Some(email) = &self.email {
            next.email = Some(email.clone());
        }
        if let Some(phone) = &self.phone {
            next.phone = Some(phone.clone());
        }
        if let Some(avatar) = &self.avatar_url {
            next.avatar_url.clone_from(avatar);
        }
        next
    }
}
