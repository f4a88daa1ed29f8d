//! Logging infrastructure for Switchboard
//!
//! Tracing subscriber setup plus the structured diagnostic event emitted on
//! every failure transition (breaker open, timeout, adapter failure,
//! permission denial). The embedding process owns the logging sink; this
//! module only standardizes what gets sent to it.

use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::intent::Intent;

/// Initialize the tracing subscriber.
///
/// Safe to call more than once; subsequent calls are no-ops (the embedding
/// server may have installed its own subscriber already).
pub fn init(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("switchboard={},info", log_level).into());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Emit the structured diagnostic event required on every failure transition.
pub fn failure_event(kind: &str, intent: Intent, detail: &str) {
    warn!(
        kind = kind,
        intent = %intent,
        detail = detail,
        "switchboard failure"
    );
}
