//! Wall-clock deadline wrapper
//!
//! Races the wrapped operation against a deadline. On expiry the future is
//! dropped, so in-flight adapter calls unwind at their next `.await` point
//! and a timed-out result can never be observed - or cached - by the caller.

use std::future::Future;
use std::time::Duration;

use crate::error::{Result, SwitchboardError};

/// Run an operation with an enforced deadline.
///
/// Returns `SwitchboardError::Timeout` if the deadline passes first.
pub async fn with_deadline<T, F>(limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(SwitchboardError::Timeout {
            waited_ms: limit.as_millis() as u64,
        }),
    }
}
