//! Role-to-intent permission matrix for live-data lookups
//!
//! The matrix is a typed static table over the closed [`Role`] and
//! [`Intent`] sets, checked for completeness at startup. Unknown
//! combinations are denied. Guests are denied every live-data intent here;
//! the one claim-status progressive-disclosure exception lives in the
//! orchestrator's gate, not in the matrix.

use crate::auth::Role;
use crate::intent::Intent;

/// Live-data intents a role may trigger.
///
/// Static/knowledge-base intents need no permission: they never reach a
/// backend.
pub fn allowed_intents(role: Role) -> &'static [Intent] {
    match role {
        Role::Guest => &[],
        Role::Beneficiary => &[
            Intent::ClaimStatus,
            Intent::PaymentStatus,
            Intent::PensionInquiry,
            Intent::AccountInfo,
            Intent::PaymentHistory,
            Intent::DocumentStatus,
            Intent::TechnicalHelp,
        ],
        Role::Employer => &[
            Intent::ClaimStatus,
            Intent::PaymentStatus,
            Intent::AccountInfo,
            Intent::PaymentHistory,
            Intent::TechnicalHelp,
        ],
        Role::Supplier => &[
            Intent::PaymentStatus,
            Intent::AccountInfo,
            Intent::PaymentHistory,
            Intent::TechnicalHelp,
        ],
        Role::Staff => Intent::LIVE_DATA,
    }
}

/// Check whether a role may trigger a live-data intent.
/// Non-live-data intents are always denied a backend fetch.
pub fn is_intent_allowed(role: Role, intent: Intent) -> bool {
    intent.is_live_data() && allowed_intents(role).contains(&intent)
}

/// Startup completeness check: every live-data intent must be reachable by
/// at least one role, and no row may name a non-live-data intent.
pub fn verify_matrix() -> Result<(), String> {
    const ROLES: &[Role] = &[
        Role::Guest,
        Role::Beneficiary,
        Role::Employer,
        Role::Supplier,
        Role::Staff,
    ];

    for role in ROLES {
        for intent in allowed_intents(*role) {
            if !intent.is_live_data() {
                return Err(format!(
                    "permission matrix row for {role} names non-live-data intent {intent}"
                ));
            }
        }
    }

    for intent in Intent::LIVE_DATA {
        let reachable = ROLES.iter().any(|r| allowed_intents(*r).contains(intent));
        if !reachable {
            return Err(format!(
                "live-data intent {intent} has no permission matrix row"
            ));
        }
    }

    Ok(())
}
