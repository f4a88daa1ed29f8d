//! Roles and per-request user context
//!
//! The session/authentication service upstream owns login flows and claim
//! verification; it hands this subsystem a [`UserContext`] per request.
//! Nothing here is persisted.

pub mod permissions;

pub use permissions::{allowed_intents, is_intent_allowed, verify_matrix};

use serde::{Deserialize, Serialize};
use std::fmt;

/// User roles, a closed set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Guest,
    Beneficiary,
    Employer,
    Supplier,
    Staff,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Guest => "guest",
            Role::Beneficiary => "beneficiary",
            Role::Employer => "employer",
            Role::Supplier => "supplier",
            Role::Staff => "staff",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-request requester context, created from upstream session state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserContext {
    /// Role assigned by the session service
    pub role: Role,
    /// Opaque stable user identifier (session-scoped)
    pub user_id: Option<String>,
    /// National-identifier-like string used by both backends
    pub national_id: Option<String>,
    /// Display name, usable as a weaker lookup key
    pub display_name: Option<String>,
    /// Whether the session has completed authentication
    pub authenticated: bool,
}

impl UserContext {
    /// An anonymous, unauthenticated guest
    pub fn guest() -> Self {
        Self {
            role: Role::Guest,
            user_id: None,
            national_id: None,
            display_name: None,
            authenticated: false,
        }
    }

    /// Stable identifier used for cache keys: the opaque user id when
    /// present, otherwise the national id.
    pub fn stable_identifier(&self) -> Option<&str> {
        non_empty(&self.user_id).or_else(|| non_empty(&self.national_id))
    }

    /// Identifier usable for a backend lookup: national id preferred,
    /// display name as a weaker fallback. This is what the claim-status
    /// progressive-disclosure path runs on before full authentication.
    pub fn lookup_identifier(&self) -> Option<&str> {
        non_empty(&self.national_id).or_else(|| non_empty(&self.display_name))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}
