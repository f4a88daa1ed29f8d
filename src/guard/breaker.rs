//! Circuit breaker for backend orchestration calls
//!
//! One instance is shared by every orchestration call in the process, so a
//! run of failures against the backends stops the whole process from piling
//! on. State machine:
//!
//! - CLOSED: calls pass through; `threshold` consecutive failures open it
//! - OPEN: calls are rejected immediately until the cooldown elapses
//! - HALF_OPEN: after the cooldown, a single probe call is attempted and
//!   concurrent callers are rejected while it is in flight; probe success
//!   closes the breaker and resets the failure count, failure re-opens it

use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::{Result, SwitchboardError};

/// Breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

struct BreakerInner {
    state: BreakerState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    /// A half-open probe is in flight; other callers are rejected until it
    /// records success or failure.
    probing: bool,
}

/// Shared failure-isolation wrapper around backend operations
pub struct CircuitBreaker {
    threshold: u32,
    cooldown: Duration,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    /// Create a breaker (default deployment: threshold 5, cooldown 30s)
    pub fn new(threshold: u32, cooldown: Duration) -> Self {
        Self {
            threshold,
            cooldown,
            inner: Mutex::new(BreakerInner {
                state: BreakerState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                probing: false,
            }),
        }
    }

    /// Run an operation through the breaker.
    ///
    /// Rejects with `CircuitBreakerOpen` without invoking the operation when
    /// the breaker is open and the cooldown has not elapsed.
    pub async fn call<F, Fut, T>(&self, op: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.admit()?;

        match op().await {
            Ok(value) => {
                self.record_success();
                Ok(value)
            }
            Err(err) => {
                self.record_failure(&err);
                Err(err)
            }
        }
    }

    /// Current state (after applying cooldown expiry)
    pub fn state(&self) -> BreakerState {
        self.lock().state
    }

    /// Consecutive failure count
    pub fn failure_count(&self) -> u32 {
        self.lock().consecutive_failures
    }

    fn admit(&self) -> Result<()> {
        let mut inner = self.lock();

        match inner.state {
            BreakerState::Closed => Ok(()),
            BreakerState::HalfOpen => {
                // One probe at a time. A probe abandoned without a recorded
                // outcome loses its claim after another cooldown window.
                let probe_age = inner
                    .opened_at
                    .map(|t| t.elapsed())
                    .unwrap_or(self.cooldown);

                if inner.probing && probe_age < self.cooldown {
                    let retry_after = self.cooldown - probe_age;
                    Err(SwitchboardError::CircuitBreakerOpen {
                        retry_after_secs: retry_after.as_secs().max(1),
                    })
                } else {
                    inner.probing = true;
                    inner.opened_at = Some(Instant::now());
                    Ok(())
                }
            }
            BreakerState::Open => {
                let since_open = inner
                    .opened_at
                    .map(|t| t.elapsed())
                    .unwrap_or(self.cooldown);

                if since_open >= self.cooldown {
                    debug!("circuit breaker cooldown elapsed, admitting half-open probe");
                    inner.state = BreakerState::HalfOpen;
                    inner.probing = true;
                    inner.opened_at = Some(Instant::now());
                    Ok(())
                } else {
                    let retry_after = self.cooldown - since_open;
                    Err(SwitchboardError::CircuitBreakerOpen {
                        retry_after_secs: retry_after.as_secs().max(1),
                    })
                }
            }
        }
    }

    fn record_success(&self) {
        let mut inner = self.lock();
        if inner.state != BreakerState::Closed {
            debug!("circuit breaker closed after successful probe");
        }
        inner.state = BreakerState::Closed;
        inner.consecutive_failures = 0;
        inner.opened_at = None;
        inner.probing = false;
    }

    fn record_failure(&self, err: &SwitchboardError) {
        let mut inner = self.lock();
        inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
        inner.probing = false;

        let should_open = inner.state == BreakerState::HalfOpen
            || inner.consecutive_failures >= self.threshold;

        if should_open && inner.state != BreakerState::Open {
            warn!(
                failures = inner.consecutive_failures,
                cooldown_secs = self.cooldown.as_secs(),
                error = %err,
                "circuit breaker opened"
            );
            inner.state = BreakerState::Open;
            inner.opened_at = Some(Instant::now());
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BreakerInner> {
        // A poisoned lock means a panic while holding it; the counters are
        // still usable, so recover rather than cascade the panic.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn adapter_err() -> SwitchboardError {
        SwitchboardError::Adapter {
            source_id: crate::sources::SourceId::Ledger,
            message: "connection refused".into(),
        }
    }

    #[tokio::test]
    async fn test_closed_passes_through() {
        let breaker = CircuitBreaker::new(5, Duration::from_secs(30));
        let result = breaker.call(|| async { Ok(42u32) }).await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(breaker.state(), BreakerState::Closed);
    }

    #[tokio::test]
    async fn test_opens_at_exactly_threshold() {
        let breaker = CircuitBreaker::new(3, Duration::from_secs(30));

        for i in 1..=2 {
            let _ = breaker
                .call(|| async { Err::<(), _>(adapter_err()) })
                .await;
            assert_eq!(breaker.state(), BreakerState::Closed, "after failure {i}");
        }

        let _ = breaker
            .call(|| async { Err::<(), _>(adapter_err()) })
            .await;
        assert_eq!(breaker.state(), BreakerState::Open);
        assert_eq!(breaker.failure_count(), 3);
    }

    #[tokio::test]
    async fn test_open_rejects_without_invoking() {
        let breaker = CircuitBreaker::new(1, Duration::from_secs(30));
        let _ = breaker
            .call(|| async { Err::<(), _>(adapter_err()) })
            .await;
        assert_eq!(breaker.state(), BreakerState::Open);

        let calls = AtomicU32::new(0);
        let result = breaker
            .call(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await;

        assert!(matches!(
            result,
            Err(SwitchboardError::CircuitBreakerOpen { .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_half_open_probe_after_cooldown_resets_on_success() {
        let breaker = CircuitBreaker::new(1, Duration::from_millis(20));
        let _ = breaker
            .call(|| async { Err::<(), _>(adapter_err()) })
            .await;
        assert_eq!(breaker.state(), BreakerState::Open);

        tokio::time::sleep(Duration::from_millis(30)).await;

        let calls = AtomicU32::new(0);
        let result = breaker
            .call(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(7u32)
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(breaker.state(), BreakerState::Closed);
        assert_eq!(breaker.failure_count(), 0);
    }

    #[tokio::test]
    async fn test_half_open_admits_one_probe_at_a_time() {
        let breaker = Arc::new(CircuitBreaker::new(1, Duration::from_millis(20)));
        let _ = breaker
            .call(|| async { Err::<(), _>(adapter_err()) })
            .await;
        assert_eq!(breaker.state(), BreakerState::Open);

        tokio::time::sleep(Duration::from_millis(30)).await;

        // Hold a probe in flight via a channel the test releases later.
        let (release, gate) = tokio::sync::oneshot::channel::<()>();
        let probe = {
            let breaker = breaker.clone();
            tokio::spawn(async move {
                breaker
                    .call(move || async move {
                        let _ = gate.await;
                        Ok(7u32)
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(breaker.state(), BreakerState::HalfOpen);

        // While the probe is pending, concurrent callers are rejected.
        let calls = AtomicU32::new(0);
        let result = breaker
            .call(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(0u32)
            })
            .await;
        assert!(matches!(
            result,
            Err(SwitchboardError::CircuitBreakerOpen { .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        release.send(()).unwrap();
        assert_eq!(probe.await.unwrap().unwrap(), 7);
        assert_eq!(breaker.state(), BreakerState::Closed);
    }

    #[tokio::test]
    async fn test_half_open_failure_reopens() {
        let breaker = CircuitBreaker::new(1, Duration::from_millis(20));
        let _ = breaker
            .call(|| async { Err::<(), _>(adapter_err()) })
            .await;

        tokio::time::sleep(Duration::from_millis(30)).await;

        let _ = breaker
            .call(|| async { Err::<(), _>(adapter_err()) })
            .await;
        assert_eq!(breaker.state(), BreakerState::Open);

        // And it rejects again until the next cooldown.
        let result = breaker.call(|| async { Ok(()) }).await;
        assert!(matches!(
            result,
            Err(SwitchboardError::CircuitBreakerOpen { .. })
        ));
    }

    #[tokio::test]
    async fn test_success_resets_failure_run() {
        let breaker = CircuitBreaker::new(3, Duration::from_secs(30));

        for _ in 0..2 {
            let _ = breaker
                .call(|| async { Err::<(), _>(adapter_err()) })
                .await;
        }
        breaker.call(|| async { Ok(()) }).await.unwrap();
        assert_eq!(breaker.failure_count(), 0);

        // Two more failures do not open it; the run was broken.
        for _ in 0..2 {
            let _ = breaker
                .call(|| async { Err::<(), _>(adapter_err()) })
                .await;
        }
        assert_eq!(breaker.state(), BreakerState::Closed);
    }
}
