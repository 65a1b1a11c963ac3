//! Core value types for the Sentinel domain
//!
//! Identifiers, closed status enums and range-checked scalars shared by
//! every entity in the model.

use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use ulid::Ulid;

/// Instant type used throughout the model
pub type Timestamp = DateTime<Utc>;

/// Unique document identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub Ulid);

impl DocumentId {
    /// Generate new document ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique activity event identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActivityId(pub Ulid);

impl ActivityId {
    /// Generate new activity ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for ActivityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ActivityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User identifier as issued by the login method
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque proof token. Never parse it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProofId(pub String);

impl ProofId {
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProofId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The six fixed pipeline agents, in pipeline order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgentId {
    /// Stage 1
    VoiceInterviewer,
    /// Stage 2
    DocumentAuditor,
    /// Stage 3
    CrossVerifier,
    /// Stage 4
    FinancialAnalyst,
    /// Stage 5
    ZkCryptographer,
    /// Stage 6
    OnChainNotary,
}

impl AgentId {
    /// All agents in pipeline order
    pub const ALL: [AgentId; 6] = [
        AgentId::VoiceInterviewer,
        AgentId::DocumentAuditor,
        AgentId::CrossVerifier,
        AgentId::FinancialAnalyst,
        AgentId::ZkCryptographer,
        AgentId::OnChainNotary,
    ];

    /// 1-based pipeline position
    #[inline]
    #[must_use]
    pub fn ordinal(&self) -> u8 {
        match self {
            AgentId::VoiceInterviewer => 1,
            AgentId::DocumentAuditor => 2,
            AgentId::CrossVerifier => 3,
            AgentId::FinancialAnalyst => 4,
            AgentId::ZkCryptographer => 5,
            AgentId::OnChainNotary => 6,
        }
    }

    /// Display name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            AgentId::VoiceInterviewer => "Voice Interviewer",
            AgentId::DocumentAuditor => "Document Auditor",
            AgentId::CrossVerifier => "Cross-Verifier",
            AgentId::FinancialAnalyst => "Financial Analyst",
            AgentId::ZkCryptographer => "ZK-Cryptographer",
            AgentId::OnChainNotary => "On-Chain Notary",
        }
    }

    /// Role description
    #[inline]
    #[must_use]
    pub fn role(&self) -> &'static str {
        match self {
            AgentId::VoiceInterviewer => "Conducts voice-based identity verification interviews",
            AgentId::DocumentAuditor => "Audits and validates financial documents",
            AgentId::CrossVerifier => "Cross-references data across multiple sources",
            AgentId::FinancialAnalyst => "Analyzes financial data and risk assessment",
            AgentId::ZkCryptographer => "Generates zero-knowledge proofs",
            AgentId::OnChainNotary => "Records proofs on blockchain",
        }
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Agent execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentStatus {
    Idle,
    Running,
    Completed,
    Error,
}

/// Document analysis status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DocumentStatus {
    #[default]
    Pending,
    Analyzed,
    Failed,
}

/// Activity event category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityType {
    Upload,
    Analysis,
    Alert,
    #[serde(rename = "Policy Action")]
    PolicyAction,
}

/// Activity severity, ordered from least to most severe
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Critical,
}

/// Zero-knowledge proof lifecycle status
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum ProofStatus {
    #[default]
    NotGenerated,
    Generating,
    Generated,
    Submitting,
    Submitted,
}

impl ProofStatus {
    /// The status that follows this one, if any
    #[inline]
    #[must_use]
    pub fn next(&self) -> Option<Self> {
        match self {
            ProofStatus::NotGenerated => Some(ProofStatus::Generating),
            ProofStatus::Generating => Some(ProofStatus::Generated),
            ProofStatus::Generated => Some(ProofStatus::Submitting),
            ProofStatus::Submitting => Some(ProofStatus::Submitted),
            ProofStatus::Submitted => None,
        }
    }
}

/// How aggressively detected PII is redacted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RedactionLevel {
    None,
    #[default]
    Partial,
    Full,
}

/// Document retention window
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum RetentionPeriod {
    Days30,
    #[default]
    Days90,
    Days180,
}

impl RetentionPeriod {
    /// Number of days in the window
    #[inline]
    #[must_use]
    pub fn days(&self) -> u32 {
        match self {
            RetentionPeriod::Days30 => 30,
            RetentionPeriod::Days90 => 90,
            RetentionPeriod::Days180 => 180,
        }
    }

    /// Window length given the length of one day
    ///
    /// `None` if the window does not fit in a `Duration`.
    #[inline]
    #[must_use]
    pub fn as_duration(&self, day: Duration) -> Option<Duration> {
        day.checked_mul(self.days())
    }
}

impl TryFrom<u32> for RetentionPeriod {
    type Error = ValidationError;

    fn try_from(days: u32) -> Result<Self, Self::Error> {
        match days {
            30 => Ok(RetentionPeriod::Days30),
            90 => Ok(RetentionPeriod::Days90),
            180 => Ok(RetentionPeriod::Days180),
            other => Err(ValidationError::UnsupportedRetention(other)),
        }
    }
}

impl From<RetentionPeriod> for u32 {
    fn from(period: RetentionPeriod) -> Self {
        period.days()
    }
}

/// Integer percentage in 0..=100 (risk scores and thresholds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Percentage(u8);

impl Percentage {
    /// Create a checked percentage
    ///
    /// # Errors
    /// - `ValidationError::PercentageOutOfRange` if `value > 100`
    #[inline]
    pub fn new(value: u32) -> Result<Self, ValidationError> {
        match u8::try_from(value) {
            Ok(v) if v <= 100 => Ok(Self(v)),
            _ => Err(ValidationError::PercentageOutOfRange(value)),
        }
    }

    #[inline]
    #[must_use]
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u32> for Percentage {
    type Error = ValidationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Percentage> for u32 {
    fn from(p: Percentage) -> Self {
        u32::from(p.0)
    }
}

impl std::fmt::Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_ordinals_follow_pipeline_order() {
        for (idx, agent) in AgentId::ALL.iter().enumerate() {
            assert_eq!(usize::from(agent.ordinal()), idx + 1);
        }
    }

    #[test]
    fn retention_period_accepts_only_enumerated_days() {
        assert_eq!(RetentionPeriod::try_from(30), Ok(RetentionPeriod::Days30));
        assert_eq!(RetentionPeriod::try_from(180), Ok(RetentionPeriod::Days180));
        assert_eq!(
            RetentionPeriod::try_from(60),
            Err(ValidationError::UnsupportedRetention(60))
        );
    }

    #[test]
    fn retention_period_scales_with_day_length() {
        let day = Duration::from_secs(1);
        assert_eq!(
            RetentionPeriod::Days90.as_duration(day),
            Some(Duration::from_secs(90))
        );
    }

    #[test]
    fn retention_period_overflow_is_none() {
        let day = Duration::from_secs(u64::MAX / 100);
        assert_eq!(RetentionPeriod::Days180.as_duration(day), None);
        assert!(RetentionPeriod::Days30.as_duration(day).is_some());
    }

    #[test]
    fn retention_period_serializes_as_days() {
        let json = serde_json::to_string(&RetentionPeriod::Days180).unwrap();
        assert_eq!(json, "180");
        assert!(serde_json::from_str::<RetentionPeriod>("45").is_err());
    }

    #[test]
    fn percentage_bounds() {
        assert_eq!(Percentage::new(100).unwrap().value(), 100);
        assert!(Percentage::new(101).is_err());
        assert!(Percentage::new(300).is_err());
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Critical);
    }

    #[test]
    fn proof_status_is_linear() {
        let mut status = ProofStatus::NotGenerated;
        let mut seen = vec![status];
        while let Some(next) = status.next() {
            assert!(next > status);
            status = next;
            seen.push(status);
        }
        assert_eq!(seen.len(), 5);
        assert_eq!(status, ProofStatus::Submitted);
    }

    #[test]
    fn policy_action_serializes_with_space() {
        let json = serde_json::to_string(&ActivityType::PolicyAction).unwrap();
        assert_eq!(json, "\"Policy Action\"");
    }
}
