//! Case registry adapter (primary business system)
//!
//! Read-only HTTP lookup by national id or display name. The registry
//! returns a nested record (beneficiary profile + tracked claims) or
//! nothing; it does not track payments - those live in the ledger.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{
    BeneficiaryProfile, ClaimRow, DataSource, EntityKind, LookupQuery, SourceId, SourceRecord,
};
use crate::error::{Result, SwitchboardError};

/// HTTP client for the case registry
pub struct CaseRegistryClient {
    base_url: String,
    http: reqwest::Client,
}

/// Wire format of a registry lookup response
#[derive(Debug, Deserialize)]
struct RegistryResponse {
    beneficiary: Option<RegistryBeneficiary>,
    #[serde(default)]
    claims: Vec<RegistryClaim>,
}

#[derive(Debug, Deserialize)]
struct RegistryBeneficiary {
    national_id: Option<String>,
    full_name: Option<String>,
    employer_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RegistryClaim {
    case_number: String,
    #[serde(default = "default_status")]
    status: String,
    injury_date: Option<String>,
    summary: Option<String>,
}

fn default_status() -> String {
    "unknown".to_string()
}

impl CaseRegistryClient {
    /// Create a client with a per-call timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SwitchboardError::Config(format!("case registry client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn entity_param(entity: EntityKind) -> &'static str {
        match entity {
            EntityKind::Claims => "claims",
            EntityKind::Payments => "payments",
            EntityKind::Profile => "profile",
            EntityKind::Documents => "documents",
        }
    }

    fn into_record(response: RegistryResponse) -> SourceRecord {
        SourceRecord {
            profile: response.beneficiary.map(|b| BeneficiaryProfile {
                national_id: b.national_id,
                full_name: b.full_name,
                employer: b.employer_name,
            }),
            claims: response
                .claims
                .into_iter()
                .map(|c| ClaimRow {
                    claim_id: c.case_number,
                    status: c.status,
                    injury_date: c.injury_date,
                    description: c.summary,
                })
                .collect(),
            payments: Vec::new(),
            fetched_at: Utc::now(),
        }
    }
}

#[async_trait]
impl DataSource for CaseRegistryClient {
    fn id(&self) -> SourceId {
        SourceId::CaseRegistry
    }

    async fn lookup(&self, query: &LookupQuery) -> Result<Option<SourceRecord>> {
        if !query.has_identifier() {
            return Ok(None);
        }

        let url = format!("{}/v1/beneficiaries/lookup", self.base_url);
        let mut params: Vec<(&str, &str)> =
            vec![("entity", Self::entity_param(query.entity))];
        if let Some(ref national_id) = query.national_id {
            params.push(("national_id", national_id));
        }
        if let Some(ref name) = query.display_name {
            params.push(("name", name));
        }

        let response = self
            .http
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| SwitchboardError::Adapter {
                source_id: SourceId::CaseRegistry,
                message: format!("request failed: {e}"),
            })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            debug!("case registry has no record for this identifier");
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(SwitchboardError::Adapter {
                source_id: SourceId::CaseRegistry,
                message: format!("unexpected status {}", response.status()),
            });
        }

        let body: RegistryResponse =
            response
                .json()
                .await
                .map_err(|e| SwitchboardError::Adapter {
                    source_id: SourceId::CaseRegistry,
                    message: format!("invalid response body: {e}"),
                })?;

        let record = Self::into_record(body);
        if record.is_empty() {
            return Ok(None);
        }
        Ok(Some(record))
    }
}
