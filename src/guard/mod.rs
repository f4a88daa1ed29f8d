//! Failure isolation for backend orchestration
//!
//! A process-wide circuit breaker plus a wall-clock deadline wrapper. The
//! orchestrator composes them as breaker -> deadline -> adapters; neither
//! layer retries - retry policy, if any, belongs above the router.

pub mod breaker;
pub mod timeout;

pub use breaker::{BreakerState, CircuitBreaker};
pub use timeout::with_deadline;
