//! Configuration for Switchboard
//!
//! CLI arguments and environment variable handling using clap. The embedding
//! server parses `Args` once at startup and hands it to [`crate::AppState`].

use clap::Parser;
use std::time::Duration;

/// Switchboard - intent routing and live-data orchestration core
#[derive(Parser, Debug, Clone)]
#[command(name = "switchboard")]
#[command(about = "Intent routing core for the agency assistant backend")]
pub struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Maximum entries in the router response cache before LRU eviction
    #[arg(long, env = "CACHE_MAX_ENTRIES", default_value = "1000")]
    pub cache_max_entries: usize,

    /// Consecutive failures before the circuit breaker opens
    #[arg(long, env = "BREAKER_THRESHOLD", default_value = "5")]
    pub breaker_threshold: u32,

    /// Circuit breaker cooldown before a half-open probe is admitted
    #[arg(long, env = "BREAKER_COOLDOWN_SECS", default_value = "30")]
    pub breaker_cooldown_secs: u64,

    /// Wall-clock deadline for one orchestrated fetch (both adapters + merge)
    #[arg(long, env = "FETCH_TIMEOUT_MS", default_value = "5000")]
    pub fetch_timeout_ms: u64,

    /// TTL for the orchestrator's local result cache
    #[arg(long, env = "RESULT_CACHE_TTL_SECS", default_value = "300")]
    pub result_cache_ttl_secs: u64,

    /// Base URL of the primary business system ("case registry")
    #[arg(long, env = "CASE_REGISTRY_URL", default_value = "http://localhost:8090")]
    pub case_registry_url: String,

    /// Per-call timeout for case registry lookups
    #[arg(long, env = "CASE_REGISTRY_TIMEOUT_MS", default_value = "4000")]
    pub case_registry_timeout_ms: u64,

    /// Enable the core ledger adapter. When false the adapter always reports
    /// absent without error (e.g. when the driver library is unavailable).
    #[arg(
        long,
        env = "LEDGER_ENABLED",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub ledger_enabled: bool,

    /// Path to the core ledger SQLite database (required when enabled)
    #[arg(long, env = "LEDGER_PATH")]
    pub ledger_path: Option<String>,
}

impl Args {
    /// Orchestrated fetch deadline as a Duration
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Circuit breaker cooldown as a Duration
    pub fn breaker_cooldown(&self) -> Duration {
        Duration::from_secs(self.breaker_cooldown_secs)
    }

    /// Orchestrator result-cache TTL as a Duration
    pub fn result_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.result_cache_ttl_secs)
    }

    /// Case registry per-call timeout as a Duration
    pub fn case_registry_timeout(&self) -> Duration {
        Duration::from_millis(self.case_registry_timeout_ms)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.breaker_threshold == 0 {
            return Err("BREAKER_THRESHOLD must be at least 1".to_string());
        }

        if self.fetch_timeout_ms == 0 {
            return Err("FETCH_TIMEOUT_MS must be nonzero".to_string());
        }

        if self.cache_max_entries == 0 {
            return Err("CACHE_MAX_ENTRIES must be nonzero".to_string());
        }

        if self.ledger_enabled && self.ledger_path.is_none() {
            return Err("LEDGER_PATH is required when LEDGER_ENABLED is true".to_string());
        }

        Ok(())
    }
}
