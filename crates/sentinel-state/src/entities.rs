//! Domain entities and the `AppState` aggregate root
//!
//! Every entity is exclusively owned by [`AppState`]; the only way to change
//! one is to dispatch an [`crate::Action`] through the [`crate::Store`].

use crate::types::{
    ActivityId, ActivityType, AgentId, AgentStatus, DocumentId, DocumentStatus, Percentage,
    ProofId, ProofStatus, RedactionLevel, RetentionPeriod, Severity, Timestamp, UserId,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};

/// Default bound on the activity log
pub const ACTIVITY_LOG_CAPACITY: usize = 100;

/// Default credential network label
pub const DEFAULT_NETWORK: &str = "Polygon Amoy";

/// One uploaded artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DocumentId,
    pub filename: String,
    /// File kind, e.g. `PDF`
    #[serde(rename = "type")]
    pub file_kind: String,
    pub upload_timestamp: Timestamp,
    pub status: DocumentStatus,
    pub risk_score: Percentage,
    /// Detected sensitive-data category labels
    pub sensitive_data: BTreeSet<String>,
    /// Size in bytes
    pub file_size: u64,
    /// Hex SHA-256 digest of the raw content
    pub content_hash: String,
    #[serde(default)]
    pub expired: bool,
}

impl Document {
    /// Create a pending document with a fresh id
    #[must_use]
    pub fn new(
        filename: impl Into<String>,
        file_kind: impl Into<String>,
        file_size: u64,
        content_hash: impl Into<String>,
        upload_timestamp: Timestamp,
    ) -> Self {
        Self {
            id: DocumentId::new(),
            filename: filename.into(),
            file_kind: file_kind.into(),
            upload_timestamp,
            status: DocumentStatus::Pending,
            risk_score: Percentage::default(),
            sensitive_data: BTreeSet::new(),
            file_size,
            content_hash: content_hash.into(),
            expired: false,
        }
    }

    /// Human-readable size, e.g. `1.2 MB`
    #[must_use]
    pub fn display_size(&self) -> String {
        const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
        #[allow(clippy::cast_precision_loss)]
        let mut size = self.file_size as f64;
        let mut unit = 0;
        while size >= 1024.0 && unit < UNITS.len() - 1 {
            size /= 1024.0;
            unit += 1;
        }
        if unit == 0 {
            format!("{} B", self.file_size)
        } else {
            format!("{size:.1} {}", UNITS[unit])
        }
    }
}

/// Immutable audit-log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEvent {
    pub id: ActivityId,
    pub timestamp: Timestamp,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub severity: Severity,
}

impl ActivityEvent {
    /// Create new event with a fresh id
    #[must_use]
    pub fn new(
        activity_type: ActivityType,
        severity: Severity,
        title: impl Into<String>,
        description: impl Into<String>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id: ActivityId::new(),
            timestamp,
            title: title.into(),
            description: description.into(),
            activity_type,
            severity,
        }
    }

    /// Info-level analysis event (the pipeline default)
    #[inline]
    #[must_use]
    pub fn analysis(
        title: impl Into<String>,
        description: impl Into<String>,
        timestamp: Timestamp,
    ) -> Self {
        Self::new(ActivityType::Analysis, Severity::Info, title, description, timestamp)
    }
}

/// A named pipeline stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub role: String,
    pub status: AgentStatus,
    pub last_updated: Timestamp,
}

impl Agent {
    /// Idle agent with its fixed name and role
    #[inline]
    #[must_use]
    pub fn idle(id: AgentId, now: Timestamp) -> Self {
        Self {
            id,
            name: id.name().to_string(),
            role: id.role().to_string(),
            status: AgentStatus::Idle,
            last_updated: now,
        }
    }
}

/// Singleton proof lifecycle record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZkProof {
    pub status: ProofStatus,
    pub proof_id: Option<ProofId>,
    pub generated_at: Option<Timestamp>,
    pub submitted_at: Option<Timestamp>,
    pub network: Option<String>,
}

impl ZkProof {
    #[inline]
    #[must_use]
    pub fn new(network: impl Into<String>) -> Self {
        Self {
            status: ProofStatus::NotGenerated,
            proof_id: None,
            generated_at: None,
            submitted_at: None,
            network: Some(network.into()),
        }
    }
}

impl Default for ZkProof {
    fn default() -> Self {
        Self::new(DEFAULT_NETWORK)
    }
}

/// Policy configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[allow(clippy::struct_excessive_bools)]
pub struct Settings {
    #[serde(rename = "enablePIIDetection")]
    pub enable_pii_detection: bool,
    pub auto_encrypt: bool,
    pub risk_threshold: Percentage,
    pub redaction_level: RedactionLevel,
    /// Upper-case extensions
    pub allowed_file_types: BTreeSet<String>,
    pub retention_duration: RetentionPeriod,
    pub auto_delete_expired: bool,
    pub email_alerts: bool,
    pub dashboard_alerts: bool,
    pub min_severity: Severity,
}

impl Settings {
    /// Whether `filename`'s extension is in the allowed set
    #[must_use]
    pub fn allows_file(&self, filename: &str) -> bool {
        file_extension(filename).is_some_and(|ext| self.allowed_file_types.contains(&ext))
    }

    /// Whether `event` should surface as a dashboard notification
    #[inline]
    #[must_use]
    pub fn should_notify(&self, event: &ActivityEvent) -> bool {
        self.dashboard_alerts && event.severity >= self.min_severity
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enable_pii_detection: true,
            auto_encrypt: true,
            risk_threshold: Percentage::new(70).unwrap_or_default(),
            redaction_level: RedactionLevel::Partial,
            allowed_file_types: ["PDF", "CSV", "JSON", "TXT"]
                .into_iter()
                .map(String::from)
                .collect(),
            retention_duration: RetentionPeriod::Days90,
            auto_delete_expired: true,
            email_alerts: true,
            dashboard_alerts: true,
            min_severity: Severity::Info,
        }
    }
}

/// Upper-cased extension of `filename`, if it has one
#[must_use]
pub fn file_extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_uppercase())
}

/// Session identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub created_at: Timestamp,
    pub avatar_url: Option<String>,
}

impl User {
    /// Build a user from a login identifier: email if it contains `@`,
    /// phone otherwise.
    #[must_use]
    pub fn from_identifier(id: UserId, identifier: &str, created_at: Timestamp) -> Self {
        let (email, phone) = if identifier.contains('@') {
            (Some(identifier.to_string()), None)
        } else {
            (None, Some(identifier.to_string()))
        };
        Self {
            id,
            email,
            phone,
            created_at,
            avatar_url: None,
        }
    }

    /// Email, then phone, then a generic label
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.email
            .as_deref()
            .or(self.phone.as_deref())
            .unwrap_or("User")
    }
}

/// Aggregate root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    /// Insertion order
    pub documents: Vec<Document>,
    /// Newest first, bounded by `activity_capacity`
    pub activities: VecDeque<ActivityEvent>,
    pub settings: Settings,
    /// Always exactly the six agents, in pipeline order
    pub agents: Vec<Agent>,
    pub zk_proof: ZkProof,
    pub has_launched: bool,
    pub is_authenticated: bool,
    pub user: Option<User>,
    #[serde(skip, default = "default_capacity")]
    pub(crate) activity_capacity: usize,
}

fn default_capacity() -> usize {
    ACTIVITY_LOG_CAPACITY
}

impl AppState {
    /// Initial state: no documents, idle agents, proof not generated
    #[must_use]
    pub fn initial(settings: Settings, network: impl Into<String>, now: Timestamp) -> Self {
        Self {
            documents: Vec::new(),
            activities: VecDeque::new(),
            settings,
            agents: AgentId::ALL.iter().map(|id| Agent::idle(*id, now)).collect(),
            zk_proof: ZkProof::new(network),
            has_launched: false,
            is_authenticated: false,
            user: None,
            activity_capacity: ACTIVITY_LOG_CAPACITY,
        }
    }

    /// Override the activity log bound (at least one entry)
    #[inline]
    #[must_use]
    pub fn with_activity_capacity(mut self, capacity: usize) -> Self {
        self.activity_capacity = capacity.max(1);
        self
    }

    #[inline]
    #[must_use]
    pub fn activity_capacity(&self) -> usize {
        self.activity_capacity
    }

    #[inline]
    #[must_use]
    pub fn document(&self, id: DocumentId) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    #[inline]
    #[must_use]
    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id == id)
    }

    /// Status of `id`; `Idle` if somehow absent
    #[inline]
    #[must_use]
    pub fn agent_status(&self, id: AgentId) -> AgentStatus {
        self.agent(id).map_or(AgentStatus::Idle, |a| a.status)
    }

    /// Agents currently running
    pub fn running_agents(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.agents
            .iter()
            .filter(|a| a.status == AgentStatus::Running)
            .map(|a| a.id)
    }

    /// Activity entries at or above `severity`, newest first
    pub fn activities_at_least(&self, severity: Severity) -> impl Iterator<Item = &ActivityEvent> {
        self.activities.iter().filter(move |a| a.severity >= severity)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::initial(Settings::default(), DEFAULT_NETWORK, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_has_six_idle_agents() {
        let state = AppState::default();
        assert_eq!(state.agents.len(), 6);
        assert!(state.agents.iter().all(|a| a.status == AgentStatus::Idle));
        assert_eq!(state.agents[4].name, "ZK-Cryptographer");
        assert_eq!(state.zk_proof.status, ProofStatus::NotGenerated);
        assert_eq!(state.zk_proof.network.as_deref(), Some(DEFAULT_NETWORK));
        assert!(!state.is_authenticated);
        assert!(state.user.is_none());
    }

    #[test]
    fn default_settings_match_policy_defaults() {
        let settings = Settings::default();
        assert!(settings.enable_pii_detection);
        assert_eq!(settings.risk_threshold.value(), 70);
        assert_eq!(settings.retention_duration, RetentionPeriod::Days90);
        assert!(settings.auto_delete_expired);
        assert_eq!(settings.allowed_file_types.len(), 4);
    }

    #[test]
    fn allowed_file_types_match_case_insensitively() {
        let settings = Settings::default();
        assert!(settings.allows_file("statement.pdf"));
        assert!(settings.allows_file("ledger.CSV"));
        assert!(!settings.allows_file("photo.png"));
        assert!(!settings.allows_file("README"));
        assert!(!settings.allows_file(".pdf"));
    }

    #[test]
    fn notification_respects_min_severity() {
        let mut settings = Settings::default();
        settings.min_severity = Severity::Warning;
        let now = Utc::now();
        let info = ActivityEvent::analysis("a", "b", now);
        let alert = ActivityEvent::new(ActivityType::Alert, Severity::Critical, "c", "d", now);
        assert!(!settings.should_notify(&info));
        assert!(settings.should_notify(&alert));

        settings.dashboard_alerts = false;
        assert!(!settings.should_notify(&alert));
    }

    #[test]
    fn user_from_identifier_picks_contact_kind() {
        let now = Utc::now();
        let by_email = User::from_identifier(UserId::new("1"), "a@b.io", now);
        assert_eq!(by_email.email.as_deref(), Some("a@b.io"));
        assert!(by_email.phone.is_none());

        let by_phone = User::from_identifier(UserId::new("2"), "+15550100", now);
        assert_eq!(by_phone.phone.as_deref(), Some("+15550100"));
        assert_eq!(by_phone.display_name(), "+15550100");
    }

    #[test]
    fn display_size_uses_binary_units() {
        let doc = Document::new("a.pdf", "PDF", 1_258_291, "00", Utc::now());
        assert_eq!(doc.display_size(), "1.2 MB");
        let small = Document::new("a.txt", "TXT", 12, "00", Utc::now());
        assert_eq!(small.display_size(), "12 B");
    }

    #[test]
    fn settings_serialize_with_wire_names() {
        let json = serde_json::to_value(Settings::default()).unwrap();
        assert_eq!(json["enablePIIDetection"], true);
        assert_eq!(json["retentionDuration"], 90);
        assert_eq!(json["riskThreshold"], 70);
    }
}
