//! Block context supplied by the caller on every state transition.

use crate::hash::Hash32;
use crate::time::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Height of the block an action executes in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockHeight(u64);

impl BlockHeight {
    pub const GENESIS: Self = Self(0);

    pub fn new(height: u64) -> Self {
        Self(height)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for BlockHeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The execution environment of a single call.
///
/// All waiting in the engine is expressed by comparing against these values:
/// unlock timestamps, round ends and the reveal block target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockContext {
    pub timestamp: Timestamp,
    pub height: BlockHeight,
    /// Hash of the most recent block. Unknown before the block is produced,
    /// so it serves as the reveal-time entropy for seeds.
    pub block_hash: Hash32,
}

impl BlockContext {
    pub fn new(timestamp: Timestamp, height: BlockHeight, block_hash: Hash32) -> Self {
        Self {
            timestamp,
            height,
            block_hash,
        }
    }

    pub fn now(&self) -> Timestamp {
        self.timestamp
    }
}
