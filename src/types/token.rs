//! Callback token types for out-of-band correlation.
//!
//! A token is minted per blind probe and doubles as the unique subdomain
//! label a vulnerable target is induced to resolve; it is later used as the
//! lookup key against the provider's observed-interaction records.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Number of UUID hex characters kept as the token label.
const TOKEN_LEN: usize = 12;

/// Opaque unique identifier tied to one blind probe.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallbackToken(String);

impl CallbackToken {
    /// Mint a fresh token, usable as a DNS label.
    pub fn mint() -> Self {
        let hex = Uuid::new_v4().simple().to_string();
        Self(hex[..TOKEN_LEN].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallbackToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A minted callback address and the token that identifies it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackEcho {
    /// Attributable address a target can be induced to contact,
    /// e.g. `ab12cd34ef56.probe.ceye.io`.
    pub address: String,
    /// Lookup key for the provider's records.
    pub token: CallbackToken,
}

impl CallbackEcho {
    pub fn new(address: impl Into<String>, token: CallbackToken) -> Self {
        Self {
            address: address.into(),
            token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_unique() {
        let a = CallbackToken::mint();
        let b = CallbackToken::mint();
        assert_ne!(a, b);
    }

    #[test]
    fn test_token_is_dns_label_safe() {
        let token = CallbackToken::mint();
        assert_eq!(token.as_str().len(), TOKEN_LEN);
        assert!(token.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }
}
