//! A user's stake in one pool and its lazy settlement.

use cairn_types::Totem;
use cairn_utils::mul_div;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::pool::{Pool, ACC_PRECISION, MULT_PRECISION};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPoolPosition {
    pub staked: u128,
    pub totem: Totem,
    pub baseline_debt: u128,
    pub pot_debt: u128,
    /// Pool round this position was last settled in.
    pub round: u64,
    /// Pot earned in `round`, still waiting for that round's draw.
    pub round_pot_accrued: u128,
    /// Settled rewards ready to claim.
    pub vested: u128,
}

impl UserPoolPosition {
    pub fn new(totem: Totem, pool: &Pool) -> Self {
        Self {
            totem,
            baseline_debt: pool.acc_baseline_per_share,
            pot_debt: pool.round_pot_per_share,
            round: pool.round,
            ..Self::default()
        }
    }

    /// Holds nothing and is owed nothing.
    pub fn is_empty(&self) -> bool {
        self.staked == 0 && self.vested == 0 && self.round_pot_accrued == 0
    }

    /// Bring the position up to date with an already-updated pool.
    pub fn settle(&mut self, pool: &Pool) -> Result<(), LedgerError> {
        let baseline = share_of(
            self.staked,
            pool.acc_baseline_per_share.saturating_sub(self.baseline_debt),
        )?;
        self.vested = self
            .vested
            .checked_add(baseline)
            .ok_or(LedgerError::Overflow)?;

        if self.round == pool.round {
            let pot = share_of(
                self.staked,
                pool.round_pot_per_share.saturating_sub(self.pot_debt),
            )?;
            self.round_pot_accrued = self
                .round_pot_accrued
                .checked_add(pot)
                .ok_or(LedgerError::Overflow)?;
        } else if self.staked > 0 || self.round_pot_accrued > 0 {
            let outcome = pool
                .outcome(self.round)
                .ok_or(LedgerError::MissingRoundOutcome {
                    pool: pool.id,
                    round: self.round,
                })?;
            let t = self.totem.index();

            let tail = share_of(
                self.staked,
                outcome.pot_per_share_end.saturating_sub(self.pot_debt),
            )?;
            let carried = self
                .round_pot_accrued
                .checked_add(tail)
                .ok_or(LedgerError::Overflow)?;
            let won = mul_div(carried, outcome.multiplier[t], MULT_PRECISION)?;

            let later_rounds = share_of(
                self.staked,
                pool.acc_reward_per_share_by_totem[t].saturating_sub(outcome.acc_after[t]),
            )?;

            self.vested = self
                .vested
                .checked_add(won)
                .and_then(|v| v.checked_add(later_rounds))
                .ok_or(LedgerError::Overflow)?;
            self.round_pot_accrued = share_of(self.staked, pool.round_pot_per_share)?;
        } else {
            self.round_pot_accrued = 0;
        }

        self.baseline_debt = pool.acc_baseline_per_share;
        self.pot_debt = pool.round_pot_per_share;
        self.round = pool.round;
        Ok(())
    }

    /// A settled copy, for views.
    pub fn settled(&self, pool: &Pool) -> Result<Self, LedgerError> {
        let mut copy = self.clone();
        copy.settle(pool)?;
        Ok(copy)
    }
}

fn share_of(staked: u128, per_share: u128) -> Result<u128, LedgerError> {
    Ok(mul_div(staked, per_share, ACC_PRECISION)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emission::EmissionShare;
    use cairn_types::{Elevation, ElevationKind, PoolId, Timestamp, TokenId};

    fn share() -> EmissionShare {
        EmissionShare {
            emission_per_second: 1000,
            elevation_alloc: 1,
            total_elevation_alloc: 1,
        }
    }

    fn pool() -> Pool {
        let mut pool = Pool::new(
            PoolId::new(TokenId::new(0), Elevation::Mesa),
            ElevationKind::Lottery,
            100,
            1,
            Timestamp::new(0),
        );
        pool.is_active = true;
        pool
    }

    fn stake(pool: &mut Pool, totem: Totem, amount: u128) -> UserPoolPosition {
        let mut pos = UserPoolPosition::new(totem, pool);
        pos.staked = amount;
        pool.add_stake(totem, amount).unwrap();
        pos
    }

    #[test]
    fn baseline_vests_immediately_and_pot_waits() {
        let mut pool = pool();
        let mut pos = stake(&mut pool, Totem::ZERO, 100);
        pool.update(Timestamp::new(10), &share(), 100, 5000).unwrap();
        pos.settle(&pool).unwrap();
        assert_eq!(pos.vested, 5000);
        assert_eq!(pos.round_pot_accrued, 5000);
    }

    #[test]
    fn winner_takes_loser_pot_after_rollover() {
        let mut pool = pool();
        let mut winner = stake(&mut pool, Totem::ZERO, 100);
        let mut loser = stake(&mut pool, Totem::ONE, 100);
        pool.update(Timestamp::new(10), &share(), 100, 5000).unwrap();
        pool.finalize_round(2, Some(Totem::ZERO), 0, 30_000).unwrap();

        winner.settle(&pool).unwrap();
        loser.settle(&pool).unwrap();
        // 10_000 emitted: 2_500 baseline each, pots of 2_500 each, winner takes both.
        assert_eq!(winner.vested, 2500 + 5000);
        assert_eq!(loser.vested, 2500);
        assert_eq!(winner.round, 2);
        assert_eq!(winner.round_pot_accrued, 0);
    }

    #[test]
    fn idle_rounds_are_settled_from_accumulators() {
        let mut pool = pool();
        let mut pos = stake(&mut pool, Totem::ONE, 100);
        for round in 2..=4 {
            let now = Timestamp::new(pool.last_reward_timestamp.as_secs() + 10);
            pool.update(now, &share(), 100, 5000).unwrap();
            pool.finalize_round(round, Some(Totem::ZERO), 0, 30_000).unwrap();
        }
        pos.settle(&pool).unwrap();
        // Alone in the pool: three rounds of 5_000 baseline + 5_000 pot at 1.0.
        assert_eq!(pos.vested, 30_000);
    }

    #[test]
    fn missing_outcome_is_reported() {
        let mut pool = pool();
        let mut pos = stake(&mut pool, Totem::ONE, 100);
        pos.round = 0;
        assert!(matches!(
            pos.settle(&pool),
            Err(LedgerError::MissingRoundOutcome { round: 0, .. })
        ));
    }
}
