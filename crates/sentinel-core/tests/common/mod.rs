#![allow(dead_code)]

use sentinel_core::{
    EngineConfig, FixedScoreBackend, MemorySessionStore, SentinelEngine, SessionStore,
};
use std::sync::Arc;
use std::time::Duration;

pub const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Time needed for a `days`-day retention window to elapse, plus slack
pub fn past(days: u32) -> Duration {
    DAY * days + Duration::from_secs(1)
}

pub fn config() -> EngineConfig {
    EngineConfig::default()
        .with_retention_day(DAY)
        .with_proof_delays(Duration::from_secs(3), Duration::from_secs(4))
}

pub fn engine() -> SentinelEngine {
    engine_with_session(Arc::new(MemorySessionStore::new()))
}

pub fn engine_with_session(backend: Arc<dyn SessionStore>) -> SentinelEngine {
    SentinelEngine::start(config(), backend, Arc::new(FixedScoreBackend(700)))
        .expect("default config starts")
}
