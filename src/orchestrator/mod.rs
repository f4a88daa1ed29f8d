//! Live-data orchestration
//!
//! Fetches and merges records from the case registry and the core ledger
//! for one live-data intent. Gate checks (live-data membership, permission
//! matrix, identity) run first; the backend fan-out is wrapped by the shared
//! circuit breaker and a wall-clock deadline. Adapter calls are
//! independently best-effort: one adapter failing never aborts the other.
//!
//! A local result cache (keyed by intent + identifier, 5-minute TTL)
//! short-circuits repeated fetches even when the router-level cache is
//! bypassed, e.g. on forced-intent re-routes after an authentication step
//! completes.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::auth::{permissions, Role, UserContext};
use crate::error::Result;
use crate::guard::{with_deadline, CircuitBreaker};
use crate::intent::Intent;
use crate::sources::{merge, DataSource, EntityKind, LookupQuery, MergedRecord, SourceRecord};

/// Orchestrator tuning knobs
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Deadline for one orchestrated fetch (both adapters + merge)
    pub fetch_timeout: Duration,
    /// TTL for the local result cache
    pub result_cache_ttl: Duration,
    /// Entry ceiling for the local result cache
    pub result_cache_max_entries: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(5),
            result_cache_ttl: Duration::from_secs(300),
            result_cache_max_entries: 1000,
        }
    }
}

struct CachedResult {
    record: MergedRecord,
    stored_at: Instant,
}

/// Permission-gated dual-source fetch engine
pub struct Orchestrator {
    case_registry: Arc<dyn DataSource>,
    ledger: Arc<dyn DataSource>,
    breaker: Arc<CircuitBreaker>,
    results: DashMap<String, CachedResult>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        case_registry: Arc<dyn DataSource>,
        ledger: Arc<dyn DataSource>,
        breaker: Arc<CircuitBreaker>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            case_registry,
            ledger,
            breaker,
            results: DashMap::new(),
            config,
        }
    }

    /// Fetch and merge live data for an intent.
    ///
    /// Returns `Ok(None)` when the intent is not a live-data intent, the
    /// permission matrix denies the role, or the user cannot be identified.
    /// Returns `Err` only for breaker-open and timeout conditions; no retry
    /// happens at this layer.
    pub async fn fetch(
        &self,
        intent: Intent,
        user: &UserContext,
        _message: &str,
    ) -> Result<Option<MergedRecord>> {
        let Some(entity) = EntityKind::for_intent(intent) else {
            return Ok(None);
        };

        if !self.admit(intent, user) {
            return Ok(None);
        }

        let Some(identifier) = user.stable_identifier().or_else(|| user.lookup_identifier())
        else {
            return Ok(None);
        };

        let result_key = format!("{}:{}", intent.as_str(), identifier);
        if let Some(record) = self.cached_result(&result_key) {
            debug!(intent = %intent, "orchestrator result cache hit");
            return Ok(Some(record));
        }

        let query = LookupQuery {
            national_id: user.national_id.clone(),
            display_name: user.display_name.clone(),
            entity,
        };

        let merged = self
            .breaker
            .call(|| {
                with_deadline(self.config.fetch_timeout, self.gather(intent, &query))
            })
            .await?;

        // A timed-out fetch errors out above and never reaches this store.
        if let Some(ref record) = merged {
            self.results.insert(
                result_key,
                CachedResult {
                    record: record.clone(),
                    stored_at: Instant::now(),
                },
            );
            if self.results.len() > self.config.result_cache_max_entries {
                self.evict_stale_results();
            }
        }

        Ok(merged)
    }

    /// Gate checks: permission matrix plus the claim-status
    /// progressive-disclosure exception for not-yet-authenticated users.
    fn admit(&self, intent: Intent, user: &UserContext) -> bool {
        let progressive_disclosure =
            intent == Intent::ClaimStatus && user.lookup_identifier().is_some();

        if user.role == Role::Guest || !user.authenticated {
            if progressive_disclosure {
                debug!(
                    intent = %intent,
                    "admitting pre-authentication claim status lookup"
                );
                return true;
            }
            debug!(role = %user.role, intent = %intent, "live data denied: unidentified user");
            return false;
        }

        if !permissions::is_intent_allowed(user.role, intent) {
            // Denials log at debug only; they are an expected outcome.
            debug!(role = %user.role, intent = %intent, "live data denied by permission matrix");
            return false;
        }

        true
    }

    /// Call both adapters best-effort and merge whatever came back.
    async fn gather(&self, intent: Intent, query: &LookupQuery) -> Result<Option<MergedRecord>> {
        let (case_result, ledger_result) = tokio::join!(
            Self::query_source(self.case_registry.as_ref(), query),
            Self::query_source(self.ledger.as_ref(), query),
        );

        if case_result.is_none() && ledger_result.is_none() {
            info!(intent = %intent, "no backend returned data for this lookup");
        }

        Ok(merge(case_result, ledger_result))
    }

    /// One adapter call; failures are logged and treated as absent so the
    /// sibling adapter's result still gets through.
    async fn query_source(source: &dyn DataSource, query: &LookupQuery) -> Option<SourceRecord> {
        match source.lookup(query).await {
            Ok(record) => record,
            Err(err) => {
                warn!(source = %source.id(), error = %err, "adapter failure contained");
                None
            }
        }
    }

    fn cached_result(&self, key: &str) -> Option<MergedRecord> {
        let mut expired = false;
        let mut hit = None;

        if let Some(entry) = self.results.get(key) {
            if entry.stored_at.elapsed() > self.config.result_cache_ttl {
                expired = true;
            } else {
                hit = Some(entry.record.clone());
            }
        }

        if expired {
            self.results.remove(key);
        }
        hit
    }

    /// Ceiling pass for the result cache: drop expired entries first, then
    /// the oldest quarter by store time if the map is still over the ceiling.
    /// Expiry on `get` alone never reclaims keys that are not probed again.
    fn evict_stale_results(&self) {
        let ttl = self.config.result_cache_ttl;
        self.results
            .retain(|_, entry| entry.stored_at.elapsed() <= ttl);

        if self.results.len() > self.config.result_cache_max_entries {
            let mut by_age: Vec<(String, Instant)> = self
                .results
                .iter()
                .map(|entry| (entry.key().clone(), entry.value().stored_at))
                .collect();
            by_age.sort_by_key(|(_, stored_at)| *stored_at);

            let to_remove = (by_age.len() / 4).max(1);
            for (key, _) in by_age.into_iter().take(to_remove) {
                self.results.remove(&key);
            }
        }

        debug!(
            remaining = self.results.len(),
            "result cache ceiling eviction pass"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::error::SwitchboardError;
    use crate::sources::{BeneficiaryProfile, ClaimRow, SourceId};

    struct MockSource {
        id: SourceId,
        record: Option<SourceRecord>,
        fail: bool,
        delay: Option<Duration>,
        calls: AtomicU32,
    }

    impl MockSource {
        fn with_claim(id: SourceId, claim_id: &str) -> Self {
            Self {
                id,
                record: Some(SourceRecord {
                    profile: Some(BeneficiaryProfile {
                        national_id: Some("123456789".into()),
                        full_name: Some(format!("{id} name")),
                        employer: None,
                    }),
                    claims: vec![ClaimRow {
                        claim_id: claim_id.into(),
                        status: "approved".into(),
                        injury_date: None,
                        description: None,
                    }],
                    payments: Vec::new(),
                    fetched_at: Utc::now(),
                }),
                fail: false,
                delay: None,
                calls: AtomicU32::new(0),
            }
        }

        fn absent(id: SourceId) -> Self {
            Self {
                id,
                record: None,
                fail: false,
                delay: None,
                calls: AtomicU32::new(0),
            }
        }

        fn failing(id: SourceId) -> Self {
            Self {
                id,
                record: None,
                fail: true,
                delay: None,
                calls: AtomicU32::new(0),
            }
        }

        fn slow(id: SourceId, delay: Duration) -> Self {
            let mut source = Self::with_claim(id, "WC-SLOW");
            source.delay = Some(delay);
            source
        }

        fn call_count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DataSource for MockSource {
        fn id(&self) -> SourceId {
            self.id
        }

        async fn lookup(&self, _query: &LookupQuery) -> Result<Option<SourceRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(SwitchboardError::Adapter {
                    source_id: self.id,
                    message: "synthetic failure".into(),
                });
            }
            Ok(self.record.clone())
        }
    }

    fn beneficiary() -> UserContext {
        UserContext {
            role: Role::Beneficiary,
            user_id: None,
            national_id: Some("123456789".into()),
            display_name: None,
            authenticated: true,
        }
    }

    fn orchestrator(
        case: Arc<MockSource>,
        ledger: Arc<MockSource>,
    ) -> Orchestrator {
        Orchestrator::new(
            case,
            ledger,
            Arc::new(CircuitBreaker::new(5, Duration::from_secs(30))),
            OrchestratorConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_fetch_merges_both_sources() {
        let case = Arc::new(MockSource::with_claim(SourceId::CaseRegistry, "WC-1"));
        let ledger = Arc::new(MockSource::with_claim(SourceId::Ledger, "CBS-77"));
        let orch = orchestrator(case.clone(), ledger.clone());

        let record = orch
            .fetch(Intent::ClaimStatus, &beneficiary(), "claim status")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(record.sources, vec![SourceId::CaseRegistry, SourceId::Ledger]);
        assert_eq!(record.claims.len(), 2);
        assert_eq!(case.call_count(), 1);
        assert_eq!(ledger.call_count(), 1);
    }

    #[tokio::test]
    async fn test_guest_denied_regardless_of_adapters() {
        let case = Arc::new(MockSource::with_claim(SourceId::CaseRegistry, "WC-1"));
        let ledger = Arc::new(MockSource::with_claim(SourceId::Ledger, "CBS-77"));
        let orch = orchestrator(case.clone(), ledger.clone());

        let guest = UserContext::guest();
        let record = orch
            .fetch(Intent::PaymentHistory, &guest, "payment history")
            .await
            .unwrap();

        assert!(record.is_none());
        assert_eq!(case.call_count(), 0);
        assert_eq!(ledger.call_count(), 0);
    }

    #[tokio::test]
    async fn test_progressive_disclosure_claim_status() {
        let case = Arc::new(MockSource::with_claim(SourceId::CaseRegistry, "WC-1"));
        let ledger = Arc::new(MockSource::absent(SourceId::Ledger));
        let orch = orchestrator(case.clone(), ledger);

        // Unauthenticated, but carrying a bare national id: claim status
        // may proceed, nothing else may.
        let user = UserContext {
            role: Role::Guest,
            user_id: None,
            national_id: Some("123456789".into()),
            display_name: None,
            authenticated: false,
        };

        let record = orch
            .fetch(Intent::ClaimStatus, &user, "where is my claim")
            .await
            .unwrap();
        assert!(record.is_some());

        let denied = orch
            .fetch(Intent::PaymentHistory, &user, "payment history")
            .await
            .unwrap();
        assert!(denied.is_none());
    }

    #[tokio::test]
    async fn test_adapter_failure_does_not_abort_sibling() {
        let case = Arc::new(MockSource::failing(SourceId::CaseRegistry));
        let ledger = Arc::new(MockSource::with_claim(SourceId::Ledger, "CBS-77"));
        let orch = orchestrator(case.clone(), ledger.clone());

        let record = orch
            .fetch(Intent::ClaimStatus, &beneficiary(), "claim status")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(record.sources, vec![SourceId::Ledger]);
        assert_eq!(case.call_count(), 1);
        assert_eq!(ledger.call_count(), 1);
    }

    #[tokio::test]
    async fn test_both_absent_is_none_not_error() {
        let case = Arc::new(MockSource::absent(SourceId::CaseRegistry));
        let ledger = Arc::new(MockSource::absent(SourceId::Ledger));
        let orch = orchestrator(case, ledger);

        let record = orch
            .fetch(Intent::ClaimStatus, &beneficiary(), "claim status")
            .await
            .unwrap();
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn test_result_cache_short_circuits_repeat_fetch() {
        let case = Arc::new(MockSource::with_claim(SourceId::CaseRegistry, "WC-1"));
        let ledger = Arc::new(MockSource::absent(SourceId::Ledger));
        let orch = orchestrator(case.clone(), ledger.clone());

        let user = beneficiary();
        orch.fetch(Intent::ClaimStatus, &user, "claim status")
            .await
            .unwrap()
            .unwrap();
        orch.fetch(Intent::ClaimStatus, &user, "claim status again")
            .await
            .unwrap()
            .unwrap();

        // Second fetch served from the local result cache.
        assert_eq!(case.call_count(), 1);
        assert_eq!(ledger.call_count(), 1);
    }

    #[tokio::test]
    async fn test_timed_out_fetch_populates_no_cache() {
        let case = Arc::new(MockSource::slow(
            SourceId::CaseRegistry,
            Duration::from_secs(60),
        ));
        let ledger = Arc::new(MockSource::slow(SourceId::Ledger, Duration::from_secs(60)));
        let breaker = Arc::new(CircuitBreaker::new(5, Duration::from_secs(30)));
        let orch = Orchestrator::new(
            case.clone(),
            ledger.clone(),
            breaker.clone(),
            OrchestratorConfig {
                fetch_timeout: Duration::from_millis(50),
                ..OrchestratorConfig::default()
            },
        );

        let result = orch
            .fetch(Intent::ClaimStatus, &beneficiary(), "claim status")
            .await;
        assert!(matches!(result, Err(SwitchboardError::Timeout { .. })));
        assert_eq!(breaker.failure_count(), 1);
        // The abandoned fetch stored nothing.
        assert_eq!(orch.results.len(), 0);

        // A retry goes back to the adapters rather than any cache.
        let retry = orch
            .fetch(Intent::ClaimStatus, &beneficiary(), "claim status")
            .await;
        assert!(retry.is_err());
        assert_eq!(case.call_count(), 2);
        assert_eq!(ledger.call_count(), 2);
    }

    #[tokio::test]
    async fn test_result_cache_respects_ceiling() {
        let case = Arc::new(MockSource::with_claim(SourceId::CaseRegistry, "WC-1"));
        let ledger = Arc::new(MockSource::absent(SourceId::Ledger));
        let orch = Orchestrator::new(
            case,
            ledger,
            Arc::new(CircuitBreaker::new(5, Duration::from_secs(30))),
            OrchestratorConfig {
                result_cache_max_entries: 4,
                ..OrchestratorConfig::default()
            },
        );

        // Six distinct users, none of whom return for a second probe.
        for i in 0..6 {
            let user = UserContext {
                role: Role::Beneficiary,
                user_id: Some(format!("u-{i}")),
                national_id: Some("123456789".into()),
                display_name: None,
                authenticated: true,
            };
            orch.fetch(Intent::ClaimStatus, &user, "claim status")
                .await
                .unwrap()
                .unwrap();
        }

        assert!(orch.results.len() <= 4);
    }

    #[tokio::test]
    async fn test_static_intent_is_rejected() {
        let case = Arc::new(MockSource::with_claim(SourceId::CaseRegistry, "WC-1"));
        let ledger = Arc::new(MockSource::absent(SourceId::Ledger));
        let orch = orchestrator(case.clone(), ledger);

        let record = orch
            .fetch(Intent::Greeting, &beneficiary(), "hello")
            .await
            .unwrap();
        assert!(record.is_none());
        assert_eq!(case.call_count(), 0);
    }
}
