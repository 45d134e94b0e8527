//! Pool state: accumulators, per-totem pots and round outcome snapshots.

use cairn_types::{ElevationKind, PoolId, Timestamp, Totem, BPS_DENOMINATOR};
use cairn_utils::{apply_bps, mul_div};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::emission::EmissionShare;
use crate::error::LedgerError;

/// Fixed-point scale of every per-share accumulator.
pub const ACC_PRECISION: u128 = 1_000_000_000_000;

/// Fixed-point scale of round multipliers (1.0 = `MULT_PRECISION`).
pub const MULT_PRECISION: u128 = 1_000_000_000_000;

/// Frozen result of one round of one pool.
///
/// Positions last settled in `round` use this snapshot to vest their
/// carried pot at the round's multiplier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundOutcome {
    pub round: u64,
    pub winning_totem: Option<Totem>,
    /// In-round pot per share at the moment the round closed.
    pub pot_per_share_end: u128,
    /// Pot multiplier of each totem, scaled by [`MULT_PRECISION`].
    pub multiplier: [u128; Totem::COUNT],
    /// Finalized accumulators right after this round was folded in.
    pub acc_after: [u128; Totem::COUNT],
    pub pot_by_totem: [u128; Totem::COUNT],
    /// Pot moved from the losing totem to the winner.
    pub transferred: u128,
    /// Everything the pool emitted during the round.
    pub emitted: u128,
}

/// One token staked at one elevation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub id: PoolId,
    pub kind: ElevationKind,
    pub allocation_points: u128,
    pub is_live: bool,
    pub is_active: bool,
    pub total_staked: u128,
    pub total_staked_by_totem: [u128; Totem::COUNT],
    pub last_reward_timestamp: Timestamp,

    pub acc_baseline_per_share: u128,
    pub round_pot_per_share: u128,
    pub round_pot_by_totem: [u128; Totem::COUNT],
    pub acc_reward_per_share_by_totem: [u128; Totem::COUNT],

    /// Round the in-round accumulators belong to.
    pub round: u64,
    pub round_emitted: u128,
    pub total_emitted: u128,
    /// Pot forfeited by emergency withdrawals.
    pub forfeited: u128,
    pub outcomes: BTreeMap<u64, RoundOutcome>,
}

impl Pool {
    pub fn new(
        id: PoolId,
        kind: ElevationKind,
        allocation_points: u128,
        round: u64,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            kind,
            allocation_points,
            is_live: true,
            is_active: false,
            total_staked: 0,
            total_staked_by_totem: [0; Totem::COUNT],
            last_reward_timestamp: now,
            acc_baseline_per_share: 0,
            round_pot_per_share: 0,
            round_pot_by_totem: [0; Totem::COUNT],
            acc_reward_per_share_by_totem: [0; Totem::COUNT],
            round,
            round_emitted: 0,
            total_emitted: 0,
            forfeited: 0,
            outcomes: BTreeMap::new(),
        }
    }

    pub fn outcome(&self, round: u64) -> Option<&RoundOutcome> {
        self.outcomes.get(&round)
    }

    /// Accrue emission from `last_reward_timestamp` up to `now`.
    ///
    /// Inactive pools, empty pools and pools without allocation only move the
    /// timestamp forward.
    pub fn update(
        &mut self,
        now: Timestamp,
        share: &EmissionShare,
        total_token_alloc: u128,
        pot_bps: u64,
    ) -> Result<u128, LedgerError> {
        let dt = self.last_reward_timestamp.elapsed_since(now);
        if dt == 0 {
            return Ok(0);
        }
        self.last_reward_timestamp = now;
        if !self.is_active || self.total_staked == 0 || self.allocation_points == 0 {
            return Ok(0);
        }

        let emitted = share.pool_emission(self.allocation_points, total_token_alloc, dt)?;
        if emitted == 0 {
            return Ok(0);
        }
        let pot = match self.kind {
            ElevationKind::Lottery => apply_bps(emitted, pot_bps.min(BPS_DENOMINATOR))?,
            ElevationKind::Fixed => 0,
        };
        let baseline = emitted - pot;

        let baseline_pps = mul_div(baseline, ACC_PRECISION, self.total_staked)?;
        self.acc_baseline_per_share = self
            .acc_baseline_per_share
            .checked_add(baseline_pps)
            .ok_or(LedgerError::Overflow)?;

        if pot > 0 {
            let pot_pps = mul_div(pot, ACC_PRECISION, self.total_staked)?;
            self.round_pot_per_share = self
                .round_pot_per_share
                .checked_add(pot_pps)
                .ok_or(LedgerError::Overflow)?;
            for (slot, staked) in self
                .round_pot_by_totem
                .iter_mut()
                .zip(self.total_staked_by_totem)
            {
                let portion = mul_div(pot, staked, self.total_staked)?;
                *slot = slot.checked_add(portion).ok_or(LedgerError::Overflow)?;
            }
        }

        self.round_emitted = self.round_emitted.saturating_add(emitted);
        self.total_emitted = self.total_emitted.saturating_add(emitted);
        Ok(emitted)
    }

    /// Per-totem pot multipliers for a round won by `winner`.
    ///
    /// Returns `(multipliers, transferred)`. Both totems stay at 1.0 when there
    /// is no winner or either side has nothing at stake.
    pub fn round_multipliers(
        pot_by_totem: [u128; Totem::COUNT],
        winner: Option<Totem>,
        loser_keep_bps: u64,
        max_win_multiplier_bps: u64,
    ) -> Result<([u128; Totem::COUNT], u128), LedgerError> {
        let unit = [MULT_PRECISION; Totem::COUNT];
        let Some(winner) = winner else {
            return Ok((unit, 0));
        };
        let loser = winner.other();
        let p_w = pot_by_totem[winner.index()];
        let p_l = pot_by_totem[loser.index()];
        if p_w == 0 || p_l == 0 {
            return Ok((unit, 0));
        }

        let loser_gives = apply_bps(p_l, BPS_DENOMINATOR.saturating_sub(loser_keep_bps))?;
        let winner_cap = apply_bps(
            p_w,
            max_win_multiplier_bps.saturating_sub(BPS_DENOMINATOR),
        )?;
        let transferred = loser_gives.min(winner_cap);

        let mut multiplier = unit;
        multiplier[winner.index()] = mul_div(p_w + transferred, MULT_PRECISION, p_w)?;
        multiplier[loser.index()] = mul_div(p_l - transferred, MULT_PRECISION, p_l)?;
        Ok((multiplier, transferred))
    }

    /// Close the pool's current round and move it to `new_round`.
    ///
    /// The round's pot per share is folded into each totem's finalized
    /// accumulator at that totem's multiplier and an outcome snapshot is kept
    /// for lazily settling positions.
    pub fn finalize_round(
        &mut self,
        new_round: u64,
        winner: Option<Totem>,
        loser_keep_bps: u64,
        max_win_multiplier_bps: u64,
    ) -> Result<&RoundOutcome, LedgerError> {
        let (multiplier, transferred) = Self::round_multipliers(
            self.round_pot_by_totem,
            winner,
            loser_keep_bps,
            max_win_multiplier_bps,
        )?;

        let mut acc_after = self.acc_reward_per_share_by_totem;
        for (acc, mult) in acc_after.iter_mut().zip(multiplier) {
            let add = mul_div(self.round_pot_per_share, mult, MULT_PRECISION)?;
            *acc = acc.checked_add(add).ok_or(LedgerError::Overflow)?;
        }

        let closed = self.round;
        let outcome = RoundOutcome {
            round: closed,
            winning_totem: winner,
            pot_per_share_end: self.round_pot_per_share,
            multiplier,
            acc_after,
            pot_by_totem: self.round_pot_by_totem,
            transferred,
            emitted: self.round_emitted,
        };

        self.acc_reward_per_share_by_totem = acc_after;
        self.round_pot_per_share = 0;
        self.round_pot_by_totem = [0; Totem::COUNT];
        self.round_emitted = 0;
        self.round = new_round;
        Ok(&*self.outcomes.entry(closed).or_insert(outcome))
    }

    /// Bring a pool that sat out of rollovers up to `round`.
    ///
    /// Only the round the pool was left in can have positions pointing at it,
    /// so a single neutral outcome covers the whole gap.
    pub fn advance_to_round(&mut self, round: u64) -> Result<(), LedgerError> {
        if self.round < round {
            self.finalize_round(round, None, 0, BPS_DENOMINATOR)?;
        }
        Ok(())
    }

    /// Move in-round pot between totems (a totem switch carries the user's pot).
    pub fn move_round_pot(&mut self, from: Totem, to: Totem, amount: u128) {
        if from == to || amount == 0 {
            return;
        }
        let moved = amount.min(self.round_pot_by_totem[from.index()]);
        self.round_pot_by_totem[from.index()] -= moved;
        let slot = &mut self.round_pot_by_totem[to.index()];
        *slot = slot.saturating_add(moved);
    }

    pub fn add_stake(&mut self, totem: Totem, amount: u128) -> Result<(), LedgerError> {
        self.total_staked = self
            .total_staked
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        let slot = &mut self.total_staked_by_totem[totem.index()];
        *slot = slot.checked_add(amount).ok_or(LedgerError::Overflow)?;
        Ok(())
    }

    pub fn remove_stake(&mut self, totem: Totem, amount: u128) {
        self.total_staked = self.total_staked.saturating_sub(amount);
        let slot = &mut self.total_staked_by_totem[totem.index()];
        *slot = slot.saturating_sub(amount);
    }

    /// Drop forfeited in-round pot from the totem's tally.
    pub fn forfeit_round_pot(&mut self, totem: Totem, amount: u128) {
        let slot = &mut self.round_pot_by_totem[totem.index()];
        *slot = slot.saturating_sub(amount);
    }
}
