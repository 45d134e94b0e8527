//! Fairness tax and staking bonus, tracked per (user, token) across elevations.
//!
//! The withdrawal tax decays linearly from the token's maximum to its floor
//! over `tax_decay_secs` after the last tax reset (a large enough deposit).
//! The staking bonus grows linearly from 0 to `max_bonus_bps` over
//! `bonus_accrual_secs` after the last withdrawal of the token at any elevation.

use cairn_types::{Address, EngineParams, Timestamp, TokenId, BPS_DENOMINATOR};
use cairn_utils::{apply_bps, linear_ramp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::LedgerError;

/// Per-token fee settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenFees {
    pub deposit_fee_bps: u64,
    pub max_withdraw_tax_bps: u64,
    pub min_withdraw_tax_bps: u64,
    /// Native tokens decay to a zero floor.
    pub is_native: bool,
    /// A deposit resets the tax timer only above this share of the existing stake.
    pub tax_reset_threshold_bps: u64,
}

impl TokenFees {
    pub fn from_params(params: &EngineParams, is_native: bool) -> Self {
        Self {
            deposit_fee_bps: 0,
            max_withdraw_tax_bps: params.default_max_withdraw_tax_bps,
            min_withdraw_tax_bps: params.default_min_withdraw_tax_bps,
            is_native,
            tax_reset_threshold_bps: params.tax_reset_threshold_bps,
        }
    }

    pub fn tax_floor_bps(&self) -> u64 {
        if self.is_native {
            0
        } else {
            self.min_withdraw_tax_bps.min(self.max_withdraw_tax_bps)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FairnessParams {
    pub tax_decay_secs: u64,
    pub max_bonus_bps: u64,
    pub bonus_accrual_secs: u64,
}

impl Default for FairnessParams {
    fn default() -> Self {
        Self::from_params(&EngineParams::default())
    }
}

impl FairnessParams {
    pub fn from_params(params: &EngineParams) -> Self {
        Self {
            tax_decay_secs: params.tax_decay_secs,
            max_bonus_bps: params.max_bonus_bps.min(BPS_DENOMINATOR),
            bonus_accrual_secs: params.bonus_accrual_secs,
        }
    }
}

/// Timers and token-wide stake of one user in one token.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserTokenTiming {
    pub last_deposit_for_tax: Option<Timestamp>,
    pub last_withdraw_for_bonus: Option<Timestamp>,
    /// Stake across every elevation.
    pub staked_total: u128,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FairnessBook {
    params: FairnessParams,
    timings: HashMap<(Address, TokenId), UserTokenTiming>,
}

impl FairnessBook {
    pub fn new(params: FairnessParams) -> Self {
        Self {
            params,
            timings: HashMap::new(),
        }
    }

    pub fn params(&self) -> FairnessParams {
        self.params
    }

    pub fn set_params(&mut self, params: FairnessParams) {
        self.params = params;
    }

    pub fn timing(&self, user: &Address, token: TokenId) -> Option<&UserTokenTiming> {
        self.timings.get(&(user.clone(), token))
    }

    pub fn token_staked(&self, user: &Address, token: TokenId) -> u128 {
        self.timing(user, token).map_or(0, |t| t.staked_total)
    }

    /// Current withdrawal tax in basis points.
    pub fn withdrawal_tax_bps(
        &self,
        user: &Address,
        token: TokenId,
        fees: &TokenFees,
        now: Timestamp,
    ) -> u64 {
        let floor = fees.tax_floor_bps();
        let max = fees.max_withdraw_tax_bps.max(floor);
        match self.timing(user, token).and_then(|t| t.last_deposit_for_tax) {
            Some(reset) => linear_ramp(
                max,
                floor,
                reset.elapsed_since(now),
                self.params().tax_decay_secs,
            ),
            None => floor,
        }
    }

    /// Current staking bonus in basis points.
    pub fn staking_bonus_bps(&self, user: &Address, token: TokenId, now: Timestamp) -> u64 {
        let params = self.params();
        match self.timing(user, token).and_then(|t| t.last_withdraw_for_bonus) {
            Some(since) => linear_ramp(
                0,
                params.max_bonus_bps,
                since.elapsed_since(now),
                params.bonus_accrual_secs,
            ),
            None => 0,
        }
    }

    /// Whether a deposit of `amount` resets the tax timer.
    ///
    /// Small top-ups (at most the threshold share of the existing stake) do not.
    pub fn deposit_resets_tax(
        &self,
        user: &Address,
        token: TokenId,
        amount: u128,
        fees: &TokenFees,
    ) -> Result<bool, LedgerError> {
        let existing = self.token_staked(user, token);
        if existing == 0 {
            return Ok(true);
        }
        let threshold = apply_bps(existing, fees.tax_reset_threshold_bps)?;
        Ok(amount > threshold)
    }

    /// Record a deposit of `amount` (net of fees).
    pub fn record_deposit(
        &mut self,
        user: &Address,
        token: TokenId,
        amount: u128,
        resets_tax: bool,
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        let timing = self.timings.entry((user.clone(), token)).or_default();
        // Entering from no stake starts the bonus from zero.
        if timing.staked_total == 0 || timing.last_withdraw_for_bonus.is_none() {
            timing.last_withdraw_for_bonus = Some(now);
        }
        timing.staked_total = timing
            .staked_total
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        if resets_tax {
            timing.last_deposit_for_tax = Some(now);
        }
        Ok(())
    }

    /// Record a withdrawal; resets the bonus for the token at every elevation.
    pub fn record_withdraw(
        &mut self,
        user: &Address,
        token: TokenId,
        amount: u128,
        now: Timestamp,
    ) {
        let timing = self.timings.entry((user.clone(), token)).or_default();
        timing.staked_total = timing.staked_total.saturating_sub(amount);
        timing.last_withdraw_for_bonus = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> FairnessParams {
        FairnessParams {
            tax_decay_secs: 1000,
            max_bonus_bps: 700,
            bonus_accrual_secs: 1000,
        }
    }

    fn fees(is_native: bool) -> TokenFees {
        TokenFees {
            deposit_fee_bps: 0,
            max_withdraw_tax_bps: 700,
            min_withdraw_tax_bps: 100,
            is_native,
            tax_reset_threshold_bps: 500,
        }
    }

    fn alice() -> Address {
        Address::new("crn_alice")
    }

    fn token() -> TokenId {
        TokenId::new(0)
    }

    fn tax_at(book: &FairnessBook, native: bool, secs: u64) -> u64 {
        book.withdrawal_tax_bps(&alice(), token(), &fees(native), Timestamp::new(secs))
    }

    #[test]
    fn tax_decays_to_floor() {
        let mut book = FairnessBook::new(params());
        book.record_deposit(&alice(), token(), 100, true, Timestamp::new(0)).unwrap();
        assert_eq!(tax_at(&book, false, 0), 700);
        assert_eq!(tax_at(&book, false, 500), 400);
        assert_eq!(tax_at(&book, false, 5000), 100);
    }

    #[test]
    fn native_tax_floor_is_zero() {
        let mut book = FairnessBook::new(params());
        book.record_deposit(&alice(), token(), 100, true, Timestamp::new(0)).unwrap();
        assert_eq!(tax_at(&book, true, 1000), 0);
    }

    #[test]
    fn small_top_up_does_not_reset_tax() {
        let mut book = FairnessBook::new(params());
        book.record_deposit(&alice(), token(), 1000, true, Timestamp::new(0)).unwrap();
        // 5% of 1000 = 50: a deposit of 50 does not reset, 51 does.
        assert!(!book.deposit_resets_tax(&alice(), token(), 50, &fees(false)).unwrap());
        assert!(book.deposit_resets_tax(&alice(), token(), 51, &fees(false)).unwrap());
    }

    #[test]
    fn bonus_grows_and_resets_on_withdraw() {
        let mut book = FairnessBook::new(params());
        book.record_deposit(&alice(), token(), 100, true, Timestamp::new(0)).unwrap();
        assert_eq!(book.staking_bonus_bps(&alice(), token(), Timestamp::new(0)), 0);
        assert_eq!(book.staking_bonus_bps(&alice(), token(), Timestamp::new(500)), 350);
        assert_eq!(book.staking_bonus_bps(&alice(), token(), Timestamp::new(2000)), 700);
        book.record_withdraw(&alice(), token(), 10, Timestamp::new(2000));
        assert_eq!(book.staking_bonus_bps(&alice(), token(), Timestamp::new(2000)), 0);
        assert_eq!(book.token_staked(&alice(), token()), 90);
    }

    #[test]
    fn later_deposit_keeps_bonus_timer() {
        let mut book = FairnessBook::new(params());
        book.record_deposit(&alice(), token(), 100, true, Timestamp::new(0)).unwrap();
        book.record_deposit(&alice(), token(), 100, true, Timestamp::new(500)).unwrap();
        assert_eq!(book.staking_bonus_bps(&alice(), token(), Timestamp::new(500)), 350);
    }
    #[test]
    fn bonus_restarts_after_full_exit() {
        let mut book = FairnessBook::new(params());
        book.record_deposit(&alice(), token(), 100, true, Timestamp::new(0)).unwrap();
        book.record_withdraw(&alice(), token(), 100, Timestamp::new(10));
        book.record_deposit(&alice(), token(), 100, true, Timestamp::new(5000)).unwrap();
        assert_eq!(book.staking_bonus_bps(&alice(), token(), Timestamp::new(5000)), 0);
        assert_eq!(book.staking_bonus_bps(&alice(), token(), Timestamp::new(5010)), 7);
    }

    #[test]
    fn set_params_changes_the_ramps() {
        let mut book = FairnessBook::new(params());
        book.record_deposit(&alice(), token(), 100, true, Timestamp::new(0)).unwrap();
        book.set_params(FairnessParams {
            tax_decay_secs: 2000,
            max_bonus_bps: 1000,
            bonus_accrual_secs: 500,
        });
        assert_eq!(tax_at(&book, false, 1000), 400);
        assert_eq!(book.staking_bonus_bps(&alice(), token(), Timestamp::new(250)), 500);
    }
}
