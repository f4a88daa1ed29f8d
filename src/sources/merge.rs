//! Provenance-tagged record merging
//!
//! The two backends are not guaranteed to agree, and hiding a discrepancy
//! would be worse than surfacing both. Comparable entries (claims, payments)
//! are therefore concatenated with a source tag per entry, never
//! overwritten. Identity fields prefer the ledger when both backends
//! contribute - the ledger is the authoritative system of record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ClaimRow, PaymentRow, SourceId, SourceRecord};

/// A claim entry with its originating backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaggedClaim {
    pub source: SourceId,
    #[serde(flatten)]
    pub claim: ClaimRow,
}

/// A payment entry with its originating backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaggedPayment {
    pub source: SourceId,
    #[serde(flatten)]
    pub payment: PaymentRow,
}

/// Unified record aggregated from zero, one, or two backends
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedRecord {
    /// Every backend that contributed, in adapter order
    pub sources: Vec<SourceId>,
    /// Primary display identity (ledger-preferred)
    pub full_name: Option<String>,
    pub national_id: Option<String>,
    pub employer: Option<String>,
    pub claims: Vec<TaggedClaim>,
    pub payments: Vec<TaggedPayment>,
    pub merged_at: DateTime<Utc>,
}

/// Merge the case-registry and ledger results for one logical entity.
///
/// Returns `None` only when both inputs are absent.
pub fn merge(
    case_registry: Option<SourceRecord>,
    ledger: Option<SourceRecord>,
) -> Option<MergedRecord> {
    if case_registry.is_none() && ledger.is_none() {
        return None;
    }

    let mut sources = Vec::new();
    let mut claims = Vec::new();
    let mut payments = Vec::new();

    if let Some(ref record) = case_registry {
        sources.push(SourceId::CaseRegistry);
        claims.extend(record.claims.iter().cloned().map(|claim| TaggedClaim {
            source: SourceId::CaseRegistry,
            claim,
        }));
        payments.extend(record.payments.iter().cloned().map(|payment| TaggedPayment {
            source: SourceId::CaseRegistry,
            payment,
        }));
    }

    if let Some(ref record) = ledger {
        sources.push(SourceId::Ledger);
        claims.extend(record.claims.iter().cloned().map(|claim| TaggedClaim {
            source: SourceId::Ledger,
            claim,
        }));
        payments.extend(record.payments.iter().cloned().map(|payment| TaggedPayment {
            source: SourceId::Ledger,
            payment,
        }));
    }

    let ledger_profile = ledger.as_ref().and_then(|r| r.profile.as_ref());
    let case_profile = case_registry.as_ref().and_then(|r| r.profile.as_ref());

    // Field-wise ledger preference for the primary display identity.
    let pick = |f: fn(&super::BeneficiaryProfile) -> Option<&String>| {
        ledger_profile
            .and_then(f)
            .or_else(|| case_profile.and_then(f))
            .cloned()
    };

    Some(MergedRecord {
        sources,
        full_name: pick(|p| p.full_name.as_ref()),
        national_id: pick(|p| p.national_id.as_ref()),
        employer: pick(|p| p.employer.as_ref()),
        claims,
        payments,
        merged_at: Utc::now(),
    })
}
