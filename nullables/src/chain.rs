//! Deterministic block production.

use cairn_crypto::hash32_multi;
use cairn_types::{BlockContext, BlockHeight, Hash32, Timestamp};

use crate::clock::NullClock;

/// A fake chain: one block per call to [`NullChain::advance_blocks`], each
/// with a fixed block time and a hash derived from its height.
#[derive(Debug)]
pub struct NullChain {
    clock: NullClock,
    height: BlockHeight,
    block_time_secs: u64,
}

impl NullChain {
    pub fn new(genesis_secs: u64, block_time_secs: u64) -> Self {
        Self {
            clock: NullClock::new(genesis_secs),
            height: BlockHeight::GENESIS,
            block_time_secs,
        }
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn height(&self) -> BlockHeight {
        self.height
    }

    /// Hash of the block at `height`.
    pub fn block_hash_at(height: BlockHeight) -> Hash32 {
        hash32_multi(&[b"null-block", &height.as_u64().to_be_bytes()])
    }

    /// Context of the current head block.
    pub fn context(&self) -> BlockContext {
        BlockContext::new(self.now(), self.height, Self::block_hash_at(self.height))
    }

    /// Produce `n` blocks, advancing time by the block time for each.
    pub fn advance_blocks(&mut self, n: u64) -> BlockContext {
        for _ in 0..n {
            self.height = self.height.next();
            self.clock.advance(self.block_time_secs);
        }
        self.context()
    }

    /// Let `secs` pass and produce a single block at the new time.
    pub fn advance_secs(&mut self, secs: u64) -> BlockContext {
        self.clock.advance(secs);
        self.height = self.height.next();
        self.context()
    }

    /// Produce a single block at `secs` (or now, if that is in the past).
    pub fn advance_to(&mut self, secs: u64) -> BlockContext {
        self.clock.set(secs);
        self.height = self.height.next();
        self.context()
    }
}
