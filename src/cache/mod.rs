//! Response caching for routed requests
//!
//! Two pieces: deterministic cache-key fingerprints over
//! (intent, role, user, message) and a category-TTL in-memory store with an
//! LRU ceiling. All state is ephemeral: cached payloads are derived data,
//! never source of truth, and are lost on restart.

pub mod keys;
pub mod store;

pub use keys::CacheKey;
pub use store::{CacheCategory, CacheStats, ResponseCache};
