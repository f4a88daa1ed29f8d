//! Category-TTL response cache with LRU ceiling eviction
//!
//! Entries expire lazily: a `get` on an expired entry deletes it and reports
//! a miss. Separately, when the entry count crosses the configured ceiling an
//! eviction pass removes the least-recently-used quarter of entries by
//! last-access timestamp. One instance is shared per process.

use dashmap::DashMap;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

/// Cache categories with their time-to-live table.
///
/// TTL is per category, not a single constant: claim data goes stale fast,
/// reference data barely moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheCategory {
    /// Claim status lookups
    ClaimStatus,
    /// Payment status, history, and pension amounts
    PaymentInfo,
    /// Beneficiary profile / account data
    ProfileInfo,
    /// Other live-data lookups
    LiveData,
    /// Static reference data (medical providers, offices)
    StaticReference,
    /// User-session-scoped payloads
    Session,
    /// Compliance/analytics aggregates
    Aggregate,
}

impl CacheCategory {
    /// Time-to-live for entries in this category
    pub fn ttl(&self) -> Duration {
        match self {
            CacheCategory::ClaimStatus => Duration::from_secs(300),
            CacheCategory::PaymentInfo => Duration::from_secs(600),
            CacheCategory::ProfileInfo => Duration::from_secs(1800),
            CacheCategory::LiveData => Duration::from_secs(300),
            CacheCategory::StaticReference => Duration::from_secs(3600),
            CacheCategory::Session => Duration::from_secs(1800),
            CacheCategory::Aggregate => Duration::from_secs(900),
        }
    }
}

/// A cached payload with its lifecycle timestamps
#[derive(Debug, Clone)]
struct CacheEntry {
    payload: Value,
    category: CacheCategory,
    created_at: Instant,
    last_access: Instant,
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub entry_count: usize,
    pub hit_count: u64,
    pub miss_count: u64,
    pub eviction_count: u64,
}

/// Shared in-memory response cache
pub struct ResponseCache {
    entries: DashMap<String, CacheEntry>,
    max_entries: usize,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
    eviction_count: AtomicU64,
}

impl ResponseCache {
    /// Create a cache with an entry ceiling (default deployment: 1000)
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries,
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
            eviction_count: AtomicU64::new(0),
        }
    }

    /// Look up a payload. Expired entries are deleted and report a miss.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.get_at(key, Instant::now())
    }

    /// Look up a payload at an explicit clock reading (exposed for tests,
    /// same shape as the store's internal expiry check).
    pub fn get_at(&self, key: &str, now: Instant) -> Option<Value> {
        let mut expired = false;
        let mut hit = None;

        if let Some(mut entry) = self.entries.get_mut(key) {
            let age = now.saturating_duration_since(entry.created_at);
            if age > entry.category.ttl() {
                expired = true;
            } else {
                entry.last_access = now;
                hit = Some(entry.payload.clone());
            }
        }

        if expired {
            // Guard dropped above; safe to remove now.
            self.entries.remove(key);
            self.eviction_count.fetch_add(1, Ordering::Relaxed);
        }

        match hit {
            Some(payload) => {
                self.hit_count.fetch_add(1, Ordering::Relaxed);
                Some(payload)
            }
            None => {
                self.miss_count.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a payload, overwriting any previous entry under the key.
    pub fn set(&self, key: &str, payload: Value, category: CacheCategory) {
        let now = Instant::now();
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                payload,
                category,
                created_at: now,
                last_access: now,
            },
        );

        if self.entries.len() > self.max_entries {
            self.evict_lru_quarter();
        }
    }

    /// Remove every entry whose storage key starts with the pattern.
    /// Returns the number of entries removed.
    pub fn invalidate(&self, pattern: &str) -> usize {
        let mut removed = 0;
        self.entries.retain(|key, _| {
            if key.starts_with(pattern) {
                removed += 1;
                false
            } else {
                true
            }
        });
        self.eviction_count
            .fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }

    /// Current statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.entries.len(),
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
            eviction_count: self.eviction_count.load(Ordering::Relaxed),
        }
    }

    /// Drop the least-recently-used quarter of entries by last-access time.
    fn evict_lru_quarter(&self) {
        let mut by_access: Vec<(String, Instant)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().last_access))
            .collect();

        by_access.sort_by_key(|(_, accessed)| *accessed);

        let to_remove = (by_access.len() / 4).max(1);
        for (key, _) in by_access.into_iter().take(to_remove) {
            self.entries.remove(&key);
            self.eviction_count.fetch_add(1, Ordering::Relaxed);
        }

        debug!(
            evicted = to_remove,
            remaining = self.entries.len(),
            "cache ceiling eviction pass"
        );
    }
}
