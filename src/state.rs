//! Shared application state
//!
//! One [`AppState`] is built at startup from validated [`Args`] and owns the
//! long-lived services: the response cache, the circuit breaker, both backend
//! adapters, the orchestrator, and the router. The embedding server clones
//! the `Arc`s it needs; nothing here is global.

use std::sync::Arc;
use tracing::info;

use crate::cache::ResponseCache;
use crate::config::Args;
use crate::error::{Result, SwitchboardError};
use crate::guard::CircuitBreaker;
use crate::orchestrator::{Orchestrator, OrchestratorConfig};
use crate::router::Router;
use crate::auth;
use crate::sources::{CaseRegistryClient, LedgerClient};

/// Long-lived service container
pub struct AppState {
    pub cache: Arc<ResponseCache>,
    pub breaker: Arc<CircuitBreaker>,
    pub orchestrator: Arc<Orchestrator>,
    pub router: Arc<Router>,
}

impl AppState {
    /// Build the service graph from validated configuration.
    pub fn new(args: &Args) -> Result<Self> {
        args.validate().map_err(SwitchboardError::Config)?;
        auth::verify_matrix().map_err(SwitchboardError::Config)?;

        let cache = Arc::new(ResponseCache::new(args.cache_max_entries));
        let breaker = Arc::new(CircuitBreaker::new(
            args.breaker_threshold,
            args.breaker_cooldown(),
        ));

        let case_registry = Arc::new(CaseRegistryClient::new(
            &args.case_registry_url,
            args.case_registry_timeout(),
        )?);

        let ledger = if args.ledger_enabled {
            // validate() guarantees the path is present when enabled.
            match args.ledger_path.as_deref() {
                Some(path) => Arc::new(LedgerClient::open(path)?),
                None => Arc::new(LedgerClient::disabled()),
            }
        } else {
            Arc::new(LedgerClient::disabled())
        };

        let orchestrator = Arc::new(Orchestrator::new(
            case_registry,
            ledger,
            breaker.clone(),
            OrchestratorConfig {
                fetch_timeout: args.fetch_timeout(),
                result_cache_ttl: args.result_cache_ttl(),
                result_cache_max_entries: args.cache_max_entries,
            },
        ));

        let router = Arc::new(Router::new(orchestrator.clone(), cache.clone()));

        info!(
            cache_max_entries = args.cache_max_entries,
            breaker_threshold = args.breaker_threshold,
            fetch_timeout_ms = args.fetch_timeout_ms,
            ledger_enabled = args.ledger_enabled,
            "switchboard services initialized"
        );

        Ok(Self {
            cache,
            breaker,
            orchestrator,
            router,
        })
    }
}
