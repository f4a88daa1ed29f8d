//! Core ledger adapter (authoritative payments/identity store)
//!
//! SQL lookups against the agency's ledger database. Queries run on the
//! blocking thread pool; the connection is shared behind a mutex. The
//! adapter can be disabled process-wide (driver or database unavailable),
//! in which case every lookup reports absent without error.

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::{
    BeneficiaryProfile, ClaimRow, DataSource, EntityKind, LookupQuery, PaymentRow, SourceId,
    SourceRecord,
};
use crate::error::{Result, SwitchboardError};

/// SQL client for the core ledger
pub struct LedgerClient {
    conn: Option<Arc<Mutex<Connection>>>,
}

impl LedgerClient {
    /// Open the ledger database at a path
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| SwitchboardError::Adapter {
            source_id: SourceId::Ledger,
            message: format!("open {path}: {e}"),
        })?;
        info!(path = path, "ledger adapter connected");
        Ok(Self::with_connection(conn))
    }

    /// A disabled client: every lookup reports absent without error
    pub fn disabled() -> Self {
        info!("ledger adapter disabled, lookups will report absent");
        Self { conn: None }
    }

    fn with_connection(conn: Connection) -> Self {
        Self {
            conn: Some(Arc::new(Mutex::new(conn))),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.conn.is_some()
    }
}

fn ledger_err(e: rusqlite::Error) -> SwitchboardError {
    SwitchboardError::Adapter {
        source_id: SourceId::Ledger,
        message: e.to_string(),
    }
}

/// Blocking query body, run via `spawn_blocking`
fn run_lookup(
    conn: &Connection,
    national_id: Option<&str>,
    display_name: Option<&str>,
    entity: EntityKind,
) -> Result<Option<SourceRecord>> {
    let profile: Option<BeneficiaryProfile> = conn
        .query_row(
            "SELECT national_id, full_name, employer
             FROM beneficiaries
             WHERE national_id = ?1 OR full_name = ?2",
            rusqlite::params![national_id, display_name],
            |row| {
                Ok(BeneficiaryProfile {
                    national_id: row.get(0)?,
                    full_name: row.get(1)?,
                    employer: row.get(2)?,
                })
            },
        )
        .optional()
        .map_err(ledger_err)?;

    // Claims and payments are keyed by national id; use the beneficiary
    // row's id when the query only carried a display name.
    let key = profile
        .as_ref()
        .and_then(|p| p.national_id.clone())
        .or_else(|| national_id.map(|s| s.to_string()));

    let mut claims = Vec::new();
    let mut payments = Vec::new();

    if let Some(ref key) = key {
        if matches!(entity, EntityKind::Claims) {
            let mut stmt = conn
                .prepare(
                    "SELECT claim_id, status, injury_date, description
                     FROM claims WHERE national_id = ?1
                     ORDER BY claim_id",
                )
                .map_err(ledger_err)?;
            let rows = stmt
                .query_map([key], |row| {
                    Ok(ClaimRow {
                        claim_id: row.get(0)?,
                        status: row.get(1)?,
                        injury_date: row.get(2)?,
                        description: row.get(3)?,
                    })
                })
                .map_err(ledger_err)?;
            for row in rows {
                claims.push(row.map_err(ledger_err)?);
            }
        }

        if matches!(entity, EntityKind::Payments) {
            let mut stmt = conn
                .prepare(
                    "SELECT reference, amount, currency, paid_at, method
                     FROM payments WHERE national_id = ?1
                     ORDER BY paid_at DESC",
                )
                .map_err(ledger_err)?;
            let rows = stmt
                .query_map([key], |row| {
                    Ok(PaymentRow {
                        reference: row.get(0)?,
                        amount: row.get(1)?,
                        currency: row.get(2)?,
                        paid_at: row.get(3)?,
                        method: row.get(4)?,
                    })
                })
                .map_err(ledger_err)?;
            for row in rows {
                payments.push(row.map_err(ledger_err)?);
            }
        }
    }

    let record = SourceRecord {
        profile,
        claims,
        payments,
        fetched_at: Utc::now(),
    };

    if record.is_empty() {
        Ok(None)
    } else {
        Ok(Some(record))
    }
}

#[async_trait]
impl DataSource for LedgerClient {
    fn id(&self) -> SourceId {
        SourceId::Ledger
    }

    async fn lookup(&self, query: &LookupQuery) -> Result<Option<SourceRecord>> {
        let Some(conn) = self.conn.clone() else {
            return Ok(None);
        };

        // The ledger does not track document workflows.
        if query.entity == EntityKind::Documents {
            debug!("ledger adapter has no document records, reporting absent");
            return Ok(None);
        }

        if !query.has_identifier() {
            return Ok(None);
        }

        let national_id = query.national_id.clone();
        let display_name = query.display_name.clone();
        let entity = query.entity;

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap_or_else(|e| e.into_inner());
            run_lookup(
                &conn,
                national_id.as_deref(),
                display_name.as_deref(),
                entity,
            )
        })
        .await
        .map_err(|e| SwitchboardError::Adapter {
            source_id: SourceId::Ledger,
            message: format!("blocking task failed: {e}"),
        })?
    }
}
