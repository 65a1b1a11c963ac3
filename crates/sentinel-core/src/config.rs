//! Engine configuration
//!
//! Loadable from TOML. Every field has a default, so an empty file is a
//! valid configuration.

use crate::error::ConfigError;
use sentinel_state::{
    RetentionPeriod, Settings, ValidationError, ACTIVITY_LOG_CAPACITY, DEFAULT_NETWORK,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Length of one retention day in seconds
    pub retention_day_secs: u64,
    /// Simulated proof generation delay
    pub proof_generation_delay_ms: u64,
    /// Simulated on-chain submission delay
    pub proof_submission_delay_ms: u64,
    /// Credential network label
    pub network: String,
    /// Score used when the analysis backend fails
    pub fallback_credit_score: u32,
    /// Directory of the file-backed session store
    pub session_path: Option<PathBuf>,
    /// Activity log bound
    pub activity_capacity: usize,
    /// Initial policy settings
    pub settings: Settings,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML document
    ///
    /// # Errors
    /// - `ConfigError::Parse` on malformed TOML
    /// - `ConfigError::Invalid` if a value is out of range
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    /// - `ConfigError::Read` if the file cannot be read
    /// - see [`EngineConfig::from_toml_str`]
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Render as TOML
    ///
    /// # Errors
    /// Returns the serializer error if a value cannot be represented.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// - `ValidationError::ZeroCapacity` if `activity_capacity == 0`
    /// - `ValidationError::RetentionDayOutOfRange` if a day is zero, or the
    ///   longest retention window would overflow
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.activity_capacity == 0 {
            return Err(ValidationError::ZeroCapacity);
        }
        let longest = RetentionPeriod::Days180.as_duration(self.retention_day());
        if self.retention_day_secs == 0 || longest.is_none() {
            return Err(ValidationError::RetentionDayOutOfRange(
                self.retention_day_secs,
            ));
        }
        Ok(())
    }

    /// With a compressed retention day
    #[inline]
    #[must_use]
    pub fn with_retention_day(mut self, day: Duration) -> Self {
        self.retention_day_secs = day.as_secs();
        self
    }

    /// With proof delays
    #[inline]
    #[must_use]
    pub fn with_proof_delays(mut self, generation: Duration, submission: Duration) -> Self {
        self.proof_generation_delay_ms = duration_ms(generation);
        self.proof_submission_delay_ms = duration_ms(submission);
        self
    }

    /// With initial settings
    #[inline]
    #[must_use]
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// With a file-backed session directory
    #[inline]
    #[must_use]
    pub fn with_session_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_path = Some(path.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn retention_day(&self) -> Duration {
        Duration::from_secs(self.retention_day_secs)
    }

    #[inline]
    #[must_use]
    pub fn proof_generation_delay(&self) -> Duration {
        Duration::from_millis(self.proof_generation_delay_ms)
    }

    #[inline]
    #[must_use]
    pub fn proof_submission_delay(&self) -> Duration {
        Duration::from_millis(self.proof_submission_delay_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            retention_day_secs: 24 * 60 * 60,
            proof_generation_delay_ms: 3_000,
            proof_submission_delay_ms: 4_000,
            network: DEFAULT_NETWORK.to_string(),
            fallback_credit_score: 720,
            session_path: None,
            activity_capacity: ACTIVITY_LOG_CAPACITY,
            settings: Settings::default(),
        }
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
