//! Error types for Switchboard
//!
//! Nothing below the router is allowed to escape the router boundary: the
//! router converts every error into a fallback `RoutingResult`. These types
//! exist for the layers underneath it.

use thiserror::Error;

use crate::auth::Role;
use crate::intent::Intent;
use crate::sources::SourceId;

/// Error types for routing and orchestration
#[derive(Debug, Error)]
pub enum SwitchboardError {
    /// Circuit breaker is open; backend calls are refused until cooldown elapses
    #[error("circuit breaker open, retry in {retry_after_secs}s")]
    CircuitBreakerOpen { retry_after_secs: u64 },

    /// The guarded operation exceeded its wall-clock deadline
    #[error("operation timed out after {waited_ms}ms")]
    Timeout { waited_ms: u64 },

    /// A backend adapter failed (caught per-adapter, never aborts the sibling)
    #[error("{source_id} adapter failure: {message}")]
    Adapter { source_id: SourceId, message: String },

    /// Role is not permitted to access the intent (logged at debug only)
    #[error("role {role} is not permitted to access {intent}")]
    PermissionDenied { role: Role, intent: Intent },

    /// Invalid startup configuration
    #[error("configuration error: {0}")]
    Config(String),
}

impl SwitchboardError {
    /// Short stable label for structured logging and fallback payloads
    pub fn kind(&self) -> &'static str {
        match self {
            SwitchboardError::CircuitBreakerOpen { .. } => "circuit_breaker_open",
            SwitchboardError::Timeout { .. } => "timeout",
            SwitchboardError::Adapter { .. } => "adapter_failure",
            SwitchboardError::PermissionDenied { .. } => "permission_denied",
            SwitchboardError::Config(_) => "config",
        }
    }

    /// Transient failures should be presented as "data temporarily
    /// unavailable" rather than leaking the internal failure mode.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SwitchboardError::CircuitBreakerOpen { .. } | SwitchboardError::Timeout { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SwitchboardError>;
