//! Account address type with `crn_` prefix.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An account address, conventionally prefixed with `crn_`.
///
/// Users, the owner, the trusted seeder and collaborator modules are all
/// identified by an `Address`; access checks compare addresses for equality.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    /// The standard prefix for all Cairn addresses.
    pub const PREFIX: &'static str = "crn_";

    /// Create an address from a raw string. Use [`Address::is_valid`] to check the prefix.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Validate that this address is well-formed.
    pub fn is_valid(&self) -> bool {
        self.0.starts_with(Self::PREFIX) && self.0.len() > Self::PREFIX.len()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_validation() {
        assert!(Address::new("crn_alice").is_valid());
        assert!(!Address::new("crn_").is_valid());
        assert!(!Address::new("alice").is_valid());
    }
}
