//! Token and pool identifiers.

use crate::elevation::Elevation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Arena index of a registered token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenId(u32);

impl TokenId {
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "token#{}", self.0)
    }
}

/// A pool is one token staked at one elevation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PoolId {
    pub token: TokenId,
    pub elevation: Elevation,
}

impl PoolId {
    pub fn new(token: TokenId, elevation: Elevation) -> Self {
        Self { token, elevation }
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.token, self.elevation)
    }
}
