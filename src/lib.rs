//! Switchboard - intent routing and live-data orchestration core
//!
//! Switchboard is the request-routing engine of the agency's conversational
//! assistant backend. It classifies free-text input into an intent, decides
//! whether the intent needs a live backend lookup or a static knowledge-base
//! answer, and when live data is needed fetches and merges records from two
//! independent backend systems under timeout and failure-isolation guarantees.
//!
//! ## Services
//!
//! - **Intent**: weighted keyword classification over a closed intent registry
//! - **Cache**: category-TTL response cache with LRU ceiling eviction
//! - **Guard**: shared circuit breaker and deadline wrapper for backend calls
//! - **Sources**: case-registry and core-ledger adapters plus the record merger
//! - **Orchestrator**: permission-gated dual-source fetch with a local result cache
//! - **Router**: top-level classify / cache / orchestrate pipeline
//!
//! The call graph is strictly one-directional: router -> {classifier, cache,
//! orchestrator}; orchestrator -> {breaker -> deadline -> sources -> merger}.
//! No component calls back into its invoker.

pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod guard;
pub mod intent;
pub mod logging;
pub mod orchestrator;
pub mod router;
pub mod sources;
pub mod state;

pub use config::Args;
pub use error::{Result, SwitchboardError};
pub use router::{Router, RouteSource, RoutingResult};
pub use state::AppState;
