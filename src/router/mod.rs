//! Intent routing
//!
//! The single entry point for a user message: classify it, decide where the
//! answer comes from (cache, live backends, knowledge base, or a fallback),
//! and return a uniform [`RoutingResult`]. Routing never returns an error -
//! every failure downgrades to a fallback answer with the failure recorded
//! on the result.

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::UserContext;
use crate::cache::{CacheKey, ResponseCache};
use crate::intent::{classifier, Intent};
use crate::logging::failure_event;
use crate::orchestrator::Orchestrator;

/// Where a routed answer came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteSource {
    /// Served from the response cache
    Cache,
    /// Fetched from the backend data sources
    LiveData,
    /// Static knowledge-base answer
    KnowledgeBase,
    /// Degraded answer after a failure or an unroutable request
    Fallback,
}

/// Outcome of routing one message
#[derive(Debug, Clone)]
pub struct RoutingResult {
    /// Correlation id for this routed request
    pub request_id: Uuid,
    pub source: RouteSource,
    pub intent: Intent,
    /// Classification confidence (1.0 when the intent was forced)
    pub confidence: f64,
    pub payload: Value,
    pub cache_hit: bool,
    pub elapsed: Duration,
}

/// Message router over the classifier, response cache, and orchestrator
pub struct Router {
    orchestrator: Arc<Orchestrator>,
    cache: Arc<ResponseCache>,
}

impl Router {
    pub fn new(orchestrator: Arc<Orchestrator>, cache: Arc<ResponseCache>) -> Self {
        Self {
            orchestrator,
            cache,
        }
    }

    /// Route one message to an answer.
    ///
    /// `forced` overrides classification, used when an upstream flow (e.g. a
    /// just-completed authentication step) already knows the intent. A forced
    /// `Unknown` is ignored and the message is classified normally.
    pub async fn route(
        &self,
        message: &str,
        user: &UserContext,
        forced: Option<Intent>,
    ) -> RoutingResult {
        let started = Instant::now();
        let request_id = Uuid::new_v4();

        let (intent, confidence) = match forced.filter(|i| *i != Intent::Unknown) {
            Some(intent) => (intent, 1.0),
            None => classifier::classify(message),
        };

        debug!(
            request_id = %request_id,
            intent = %intent,
            confidence,
            role = %user.role,
            "routing message"
        );

        let (source, payload, cache_hit) = if intent.is_live_data() {
            self.route_live(intent, user, message).await
        } else if intent.is_static() {
            (RouteSource::KnowledgeBase, knowledge_base_answer(intent), false)
        } else {
            (RouteSource::Fallback, clarification_answer(), false)
        };

        let elapsed = started.elapsed();
        info!(
            request_id = %request_id,
            intent = %intent,
            source = ?source,
            cache_hit,
            elapsed_ms = elapsed.as_millis() as u64,
            "request routed"
        );

        RoutingResult {
            request_id,
            source,
            intent,
            confidence,
            payload,
            cache_hit,
            elapsed,
        }
    }

    /// Live-data leg: cache probe, then the orchestrated fetch. Failures
    /// downgrade to a fallback payload carrying the failure kind.
    async fn route_live(
        &self,
        intent: Intent,
        user: &UserContext,
        message: &str,
    ) -> (RouteSource, Value, bool) {
        // Cacheable only when the user has a stable identity (user id or
        // national id); display-name-only lookups are never cached.
        let storage_key = user
            .stable_identifier()
            .map(|id| CacheKey::new(intent, user.role, id, message).to_storage_key());

        if let Some(ref key) = storage_key {
            if let Some(payload) = self.cache.get(key) {
                return (RouteSource::Cache, payload, true);
            }
        }

        match self.orchestrator.fetch(intent, user, message).await {
            Ok(Some(record)) => {
                let payload = serde_json::to_value(&record).unwrap_or(Value::Null);
                if let Some(key) = storage_key {
                    self.cache
                        .set(&key, payload.clone(), intent.cache_category());
                }
                (RouteSource::LiveData, payload, false)
            }
            Ok(None) => (RouteSource::Fallback, no_data_answer(intent, user), false),
            Err(err) => {
                failure_event(err.kind(), intent, &err.to_string());
                (RouteSource::Fallback, degraded_answer(err.kind()), false)
            }
        }
    }
}

/// Canned knowledge-base answers for static intents
fn knowledge_base_answer(intent: Intent) -> Value {
    let text = match intent {
        Intent::Greeting => {
            "Hello! I can help you with claims, payments, pensions, and office information."
        }
        Intent::ClaimFiling => {
            "To file a claim, report the injury to your employer first, then submit the claim \
             form with a medical certificate at any branch office or online."
        }
        Intent::MedicalProviders => {
            "Treatment is covered at approved hospitals and clinics. I can list the approved \
             providers near you if you tell me your province."
        }
        Intent::OfficeLocations => {
            "Branch offices are open Monday to Friday, 08:30 to 16:30. Tell me your province \
             and I will point you to the nearest one."
        }
        Intent::Farewell => "You're welcome. Take care!",
        // Static set is closed; live and unknown intents never reach here.
        _ => "I can help with claims, payments, and general information.",
    };
    json!({ "message": text })
}

/// Answer for a live-data intent that produced no record: either the user is
/// not identified yet, or neither backend knows them.
fn no_data_answer(intent: Intent, user: &UserContext) -> Value {
    let text = if user.stable_identifier().is_none() && user.lookup_identifier().is_none() {
        "I need to verify your identity before I can look that up. Please sign in or provide \
         your national ID."
    } else {
        "I couldn't find any records for that request. Please check your details or contact \
         your branch office."
    };
    json!({ "message": text, "intent": intent.as_str() })
}

fn degraded_answer(kind: &str) -> Value {
    json!({
        "message": "I'm having trouble accessing your information right now. \
                    Please try again in a moment.",
        "reason": kind,
    })
}

fn clarification_answer() -> Value {
    json!({
        "message": "I'm not sure what you're asking about. You can ask about your claim, \
                    payments, pension, or how to file a new claim."
    })
}
