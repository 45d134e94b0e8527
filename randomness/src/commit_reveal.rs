//! Commit-reveal seed protocol, one live seed per elevation.
//!
//! Lifecycle per elevation: `Idle → Sealed → Revealed → (consumed at rollover) → Idle`.
//! Sealing is gated on the round's final seconds; revealing is gated on a
//! later block. A pending seal is only ever cleared by its own reveal.

use crate::error::RandomnessError;
use cairn_crypto::hash32_multi;
use cairn_types::{Address, BlockContext, BlockHeight, Elevation, Hash32, Timestamp};
use serde::{Deserialize, Serialize};

/// A sealed commitment awaiting its reveal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedState {
    pub sealed_hash: Hash32,
    pub submission_block: BlockHeight,
    /// Round whose draw this seed will decide.
    pub target_round: u64,
    pub submitter: Address,
}

impl SeedState {
    /// First block at which the reveal is accepted.
    pub fn reveal_block_target(&self) -> BlockHeight {
        self.submission_block.next()
    }

    pub fn future_block_mined(&self, height: BlockHeight) -> bool {
        height >= self.reveal_block_target()
    }
}

/// A verified seed waiting to be consumed by its round's rollover.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealedSeed {
    pub round: u64,
    pub seed: Hash32,
    pub revealed_at: BlockHeight,
}

/// Commitment for `value` sealed by `submitter`.
pub fn seal_hash(value: &Hash32, submitter: &Address) -> Hash32 {
    hash32_multi(&[value.as_bytes(), submitter.as_bytes()])
}

fn mix_seed(value: &Hash32, entropy: &Hash32, elevation: Elevation, round: u64) -> Hash32 {
    hash32_multi(&[
        value.as_bytes(),
        entropy.as_bytes(),
        &[elevation.index() as u8],
        &round.to_be_bytes(),
    ])
}

fn fallback_seed(entropy: &Hash32, elevation: Elevation, round: u64) -> Hash32 {
    hash32_multi(&[
        b"fallback",
        entropy.as_bytes(),
        &[elevation.index() as u8],
        &round.to_be_bytes(),
    ])
}

/// Produces one verified seed per elevation round.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RandomnessCoordinator {
    trusted_seeder: Address,
    seal_window_secs: u64,
    pending: [Option<SeedState>; Elevation::COUNT],
    revealed: [Option<RevealedSeed>; Elevation::COUNT],
}

impl RandomnessCoordinator {
    pub fn new(trusted_seeder: Address, seal_window_secs: u64) -> Self {
        Self {
            trusted_seeder,
            seal_window_secs,
            pending: Default::default(),
            revealed: Default::default(),
        }
    }

    pub fn trusted_seeder(&self) -> &Address {
        &self.trusted_seeder
    }

    /// Replace the trusted seeder. Access control is the caller's job.
    pub fn set_trusted_seeder(&mut self, seeder: Address) {
        tracing::info!(seeder = %seeder, "trusted seeder updated");
        self.trusted_seeder = seeder;
    }

    pub fn seal_window_secs(&self) -> u64 {
        self.seal_window_secs
    }

    /// Takes effect for the next seal; a pending commitment is unaffected.
    pub fn set_seal_window(&mut self, secs: u64) {
        tracing::info!(secs, "seal window updated");
        self.seal_window_secs = secs;
    }

    pub fn pending(&self, elevation: Elevation) -> Option<&SeedState> {
        self.pending[elevation.index()].as_ref()
    }

    pub fn revealed(&self, elevation: Elevation) -> Option<&RevealedSeed> {
        self.revealed[elevation.index()].as_ref()
    }

    fn seal_window_open(&self, round_end: Timestamp, now: Timestamp) -> bool {
        now >= round_end.saturating_sub(self.seal_window_secs)
    }

    fn round_already_seeded(&self, elevation: Elevation, round: u64) -> bool {
        self.pending(elevation).is_some()
            || self
                .revealed(elevation)
                .map_or(false, |r| r.round == round)
    }

    /// Whether a seal for `round` would be accepted at `now`.
    pub fn next_seed_round_available(
        &self,
        elevation: Elevation,
        round: u64,
        round_end: Timestamp,
        now: Timestamp,
    ) -> bool {
        self.seal_window_open(round_end, now) && !self.round_already_seeded(elevation, round)
    }

    /// Commit to a seed for the current round of `elevation`.
    pub fn submit_sealed_seed(
        &mut self,
        caller: &Address,
        elevation: Elevation,
        round: u64,
        round_end: Timestamp,
        sealed_hash: Hash32,
        ctx: &BlockContext,
    ) -> Result<(), RandomnessError> {
        if *caller != self.trusted_seeder {
            return Err(RandomnessError::OnlyTrustedSeeder);
        }
        if self.round_already_seeded(elevation, round) {
            return Err(RandomnessError::AlreadySealed(elevation));
        }
        if !self.seal_window_open(round_end, ctx.timestamp) {
            return Err(RandomnessError::SeedRoundNotAvailable(elevation));
        }
        tracing::info!(
            %elevation,
            round,
            block = %ctx.height,
            hash = %sealed_hash,
            "sealed seed submitted"
        );
        self.pending[elevation.index()] = Some(SeedState {
            sealed_hash,
            submission_block: ctx.height,
            target_round: round,
            submitter: caller.clone(),
        });
        Ok(())
    }

    /// Reveal the sealed value, mixing in the current block hash.
    ///
    /// Returns the final seed.
    pub fn submit_unsealed_seed(
        &mut self,
        caller: &Address,
        elevation: Elevation,
        value: Hash32,
        ctx: &BlockContext,
    ) -> Result<Hash32, RandomnessError> {
        if *caller != self.trusted_seeder {
            return Err(RandomnessError::OnlyTrustedSeeder);
        }
        let state = self
            .pending(elevation)
            .ok_or(RandomnessError::NoSealedSeed(elevation))?;
        if !state.future_block_mined(ctx.height) {
            return Err(RandomnessError::FutureBlockNotReached {
                current: ctx.height,
                target: state.reveal_block_target(),
            });
        }
        if seal_hash(&value, &state.submitter) != state.sealed_hash {
            return Err(RandomnessError::UnsealedSeedMismatch);
        }

        let round = state.target_round;
        let seed = mix_seed(&value, &ctx.block_hash, elevation, round);
        tracing::info!(%elevation, round, block = %ctx.height, "seed revealed");
        self.pending[elevation.index()] = None;
        self.revealed[elevation.index()] = Some(RevealedSeed {
            round,
            seed,
            revealed_at: ctx.height,
        });
        Ok(seed)
    }

    /// Check that `take_seed` would succeed without consuming anything.
    pub fn check_seed_ready(&self, elevation: Elevation) -> Result<(), RandomnessError> {
        match self.pending(elevation) {
            Some(_) => Err(RandomnessError::SeedRevealPending(elevation)),
            None => Ok(()),
        }
    }

    /// Consume the seed for `round`.
    ///
    /// Uses the revealed seed when one exists for the round. When nothing was
    /// sealed the block hash alone seeds the draw.
    pub fn take_seed(
        &mut self,
        elevation: Elevation,
        round: u64,
        ctx: &BlockContext,
    ) -> Result<Hash32, RandomnessError> {
        self.check_seed_ready(elevation)?;
        match self.revealed[elevation.index()].take() {
            Some(revealed) if revealed.round == round => {
                tracing::debug!(
                    %elevation,
                    round,
                    revealed_at = %revealed.revealed_at,
                    drawn_at = %ctx.height,
                    "using revealed seed"
                );
                Ok(revealed.seed)
            }
            stale => {
                if let Some(stale) = stale {
                    tracing::warn!(
                        %elevation,
                        round,
                        stale_round = stale.round,
                        "discarding stale seed"
                    );
                }
                tracing::warn!(
                    %elevation,
                    round,
                    "no revealed seed, falling back to block entropy"
                );
                Ok(fallback_seed(&ctx.block_hash, elevation, round))
            }
        }
    }
}
