//! Backend data sources and record merging
//!
//! Two read-only adapters feed the orchestrator: the case registry (primary
//! business system, HTTP) and the core ledger (separate relational store).
//! Each call is independently best-effort; the merger unions whatever came
//! back, tagged with provenance.

pub mod case_registry;
pub mod ledger;
pub mod merge;

pub use case_registry::CaseRegistryClient;
pub use ledger::LedgerClient;
pub use merge::{merge, MergedRecord, TaggedClaim, TaggedPayment};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;
use crate::intent::Intent;

/// Provenance tag naming a backend system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    /// Primary business system (profiles + tracked claims)
    CaseRegistry,
    /// Core ledger system; authoritative for identity when both contribute
    Ledger,
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceId::CaseRegistry => f.write_str("case_registry"),
            SourceId::Ledger => f.write_str("ledger"),
        }
    }
}

/// What kind of records a lookup targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Claims,
    Payments,
    Profile,
    Documents,
}

impl EntityKind {
    /// Entity type matching a live-data intent
    pub fn for_intent(intent: Intent) -> Option<EntityKind> {
        match intent {
            Intent::ClaimStatus => Some(EntityKind::Claims),
            Intent::PaymentStatus | Intent::PaymentHistory | Intent::PensionInquiry => {
                Some(EntityKind::Payments)
            }
            Intent::AccountInfo | Intent::TechnicalHelp => Some(EntityKind::Profile),
            Intent::DocumentStatus => Some(EntityKind::Documents),
            _ => None,
        }
    }
}

/// A lookup request against a backend
#[derive(Debug, Clone)]
pub struct LookupQuery {
    pub national_id: Option<String>,
    pub display_name: Option<String>,
    pub entity: EntityKind,
}

impl LookupQuery {
    /// True when there is at least one usable identifier
    pub fn has_identifier(&self) -> bool {
        self.national_id.as_deref().map_or(false, |s| !s.is_empty())
            || self.display_name.as_deref().map_or(false, |s| !s.is_empty())
    }
}

/// Beneficiary identity fields as one backend knows them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeneficiaryProfile {
    pub national_id: Option<String>,
    pub full_name: Option<String>,
    pub employer: Option<String>,
}

/// One tracked claim
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimRow {
    pub claim_id: String,
    pub status: String,
    pub injury_date: Option<String>,
    pub description: Option<String>,
}

/// One payment-history entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRow {
    pub reference: String,
    pub amount: f64,
    pub currency: String,
    pub paid_at: Option<String>,
    pub method: Option<String>,
}

/// Everything one backend returned for a lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRecord {
    pub profile: Option<BeneficiaryProfile>,
    pub claims: Vec<ClaimRow>,
    pub payments: Vec<PaymentRow>,
    pub fetched_at: DateTime<Utc>,
}

impl SourceRecord {
    pub fn is_empty(&self) -> bool {
        self.profile.is_none() && self.claims.is_empty() && self.payments.is_empty()
    }
}

/// Read-only query capability exposed by each backend adapter
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Which backend this adapter fronts
    fn id(&self) -> SourceId;

    /// Look up records for an identifier. `Ok(None)` means the backend has
    /// nothing for this query (or the adapter is disabled); `Err` is a real
    /// adapter failure, which the orchestrator contains per-adapter.
    async fn lookup(&self, query: &LookupQuery) -> Result<Option<SourceRecord>>;
}
