//! Cache key definitions
//!
//! A key fingerprints (intent, role, user identifier, message). The message
//! is hashed so that long free-text input produces short, uniform keys.

use std::fmt;

use crate::auth::Role;
use crate::intent::Intent;

/// Cache key for a routed request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Classified intent
    pub intent: Intent,
    /// Requester role (the same question can resolve differently per role)
    pub role: Role,
    /// Stable user identifier
    pub user_id: String,
    /// Short hash of the message text
    pub message_hash: String,
}

impl CacheKey {
    /// Create a new cache key, hashing the message text
    pub fn new(intent: Intent, role: Role, user_id: &str, message: &str) -> Self {
        let message_hash = if message.is_empty() {
            "empty".to_string()
        } else {
            use sha2::{Digest, Sha256};
            let mut hasher = Sha256::new();
            hasher.update(message.as_bytes());
            let hash = hasher.finalize();
            hex::encode(&hash[..8]) // First 8 bytes = 16 hex chars
        };

        Self {
            intent,
            role,
            user_id: user_id.to_string(),
            message_hash,
        }
    }

    /// Convert to storage key string.
    /// Format: intent:role:user:message_hash
    pub fn to_storage_key(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.intent.as_str(),
            self.role.as_str(),
            self.user_id,
            self.message_hash
        )
    }

    /// Prefix pattern matching every cached message for one user and intent
    pub fn invalidation_pattern(intent: Intent, role: Role, user_id: &str) -> String {
        format!("{}:{}:{}:", intent.as_str(), role.as_str(), user_id)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}:{}({})",
            self.intent, self.role, self.user_id, self.message_hash
        )
    }
}
