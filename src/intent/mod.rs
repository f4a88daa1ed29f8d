//! Intent registry for the assistant
//!
//! Intents form a closed set partitioned into live-data intents (require a
//! backend lookup), static intents (answered from fixed knowledge-base
//! content downstream), and `Unknown` (no confident match).

pub mod classifier;

pub use classifier::{classify, ACCEPTANCE_THRESHOLD};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::cache::CacheCategory;

/// The closed intent registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    // Live-data intents: answered from a backend lookup
    ClaimStatus,
    PaymentStatus,
    PensionInquiry,
    AccountInfo,
    PaymentHistory,
    DocumentStatus,
    TechnicalHelp,

    // Static intents: answered from knowledge-base content downstream
    Greeting,
    ClaimFiling,
    MedicalProviders,
    OfficeLocations,
    Farewell,

    /// No confident match
    Unknown,
}

impl Intent {
    /// Every live-data intent. The permission matrix must cover this set.
    pub const LIVE_DATA: &'static [Intent] = &[
        Intent::ClaimStatus,
        Intent::PaymentStatus,
        Intent::PensionInquiry,
        Intent::AccountInfo,
        Intent::PaymentHistory,
        Intent::DocumentStatus,
        Intent::TechnicalHelp,
    ];

    /// Intents answered from static knowledge-base content
    pub const STATIC: &'static [Intent] = &[
        Intent::Greeting,
        Intent::ClaimFiling,
        Intent::MedicalProviders,
        Intent::OfficeLocations,
        Intent::Farewell,
    ];

    /// Whether answering this intent requires a live backend lookup
    pub fn is_live_data(&self) -> bool {
        Self::LIVE_DATA.contains(self)
    }

    /// Whether this intent is answered from the static knowledge base
    pub fn is_static(&self) -> bool {
        Self::STATIC.contains(self)
    }

    /// Cache category (and thereby TTL) for payloads produced by this intent
    pub fn cache_category(&self) -> CacheCategory {
        match self {
            Intent::ClaimStatus => CacheCategory::ClaimStatus,
            Intent::PaymentStatus | Intent::PaymentHistory | Intent::PensionInquiry => {
                CacheCategory::PaymentInfo
            }
            Intent::AccountInfo => CacheCategory::ProfileInfo,
            Intent::DocumentStatus | Intent::TechnicalHelp => CacheCategory::LiveData,
            Intent::MedicalProviders | Intent::OfficeLocations => CacheCategory::StaticReference,
            Intent::Greeting | Intent::ClaimFiling | Intent::Farewell | Intent::Unknown => {
                CacheCategory::Session
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::ClaimStatus => "claim_status",
            Intent::PaymentStatus => "payment_status",
            Intent::PensionInquiry => "pension_inquiry",
            Intent::AccountInfo => "account_info",
            Intent::PaymentHistory => "payment_history",
            Intent::DocumentStatus => "document_status",
            Intent::TechnicalHelp => "technical_help",
            Intent::Greeting => "greeting",
            Intent::ClaimFiling => "claim_filing",
            Intent::MedicalProviders => "medical_providers",
            Intent::OfficeLocations => "office_locations",
            Intent::Farewell => "farewell",
            Intent::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
