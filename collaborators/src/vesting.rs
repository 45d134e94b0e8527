//! Epoch vesting of claimed winnings.
//!
//! Winnings added during epoch `n` unlock when epoch `n + 1` begins. The
//! staking bonus is vested alongside the reward it was earned on.

use cairn_types::{Address, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::error::CollaboratorError;

/// Receives winnings on every claim routed to vesting.
pub trait WinningsVesting {
    /// Fails with `OnlyRouterOrLottery` unless `caller` may add winnings.
    fn authorize(&self, caller: &Address) -> Result<(), CollaboratorError>;

    /// Fails exactly when `add_locked_winnings` would, without adding anything.
    fn check_locked_winnings(
        &self,
        caller: &Address,
        amount: u128,
        bonus: u128,
        user: &Address,
        now: Timestamp,
    ) -> Result<(), CollaboratorError>;

    fn add_locked_winnings(
        &mut self,
        caller: &Address,
        amount: u128,
        bonus: u128,
        user: &Address,
        now: Timestamp,
    ) -> Result<(), CollaboratorError>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingEntry {
    pub winnings: u128,
    pub bonus: u128,
}

impl VestingEntry {
    pub fn total(&self) -> u128 {
        self.winnings.saturating_add(self.bonus)
    }
}

/// In-memory vesting schedule keyed by epoch.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EpochVestingLedger {
    router: Address,
    expedition: Address,
    epoch_duration_secs: u64,
    entries: HashMap<Address, BTreeMap<u64, VestingEntry>>,
}

impl EpochVestingLedger {
    pub fn new(router: Address, expedition: Address, epoch_duration_secs: u64) -> Self {
        Self {
            router,
            expedition,
            epoch_duration_secs: epoch_duration_secs.max(1),
            entries: HashMap::new(),
        }
    }

    pub fn epoch_at(&self, now: Timestamp) -> u64 {
        now.as_secs() / self.epoch_duration_secs
    }

    /// Winnings still vesting.
    pub fn locked(&self, user: &Address, now: Timestamp) -> u128 {
        let epoch = self.epoch_at(now);
        self.entries.get(user).map_or(0, |by_epoch| {
            by_epoch
                .range(epoch..)
                .map(|(_, e)| e.total())
                .fold(0, u128::saturating_add)
        })
    }

    /// Winnings whose epoch has passed.
    pub fn unlocked(&self, user: &Address, now: Timestamp) -> u128 {
        let epoch = self.epoch_at(now);
        self.entries.get(user).map_or(0, |by_epoch| {
            by_epoch
                .range(..epoch)
                .map(|(_, e)| e.total())
                .fold(0, u128::saturating_add)
        })
    }

    /// Remove and return everything that has vested.
    pub fn harvest(&mut self, user: &Address, now: Timestamp) -> Result<u128, CollaboratorError> {
        let epoch = self.epoch_at(now);
        let by_epoch = self
            .entries
            .get_mut(user)
            .ok_or_else(|| CollaboratorError::NothingLocked(user.clone()))?;
        let still_locked = by_epoch.split_off(&epoch);
        let vested = std::mem::replace(by_epoch, still_locked)
            .values()
            .map(VestingEntry::total)
            .fold(0, u128::saturating_add);
        if by_epoch.is_empty() {
            self.entries.remove(user);
        }
        Ok(vested)
    }
}

impl WinningsVesting for EpochVestingLedger {
    fn authorize(&self, caller: &Address) -> Result<(), CollaboratorError> {
        if *caller == self.router || *caller == self.expedition {
            Ok(())
        } else {
            Err(CollaboratorError::OnlyRouterOrLottery(caller.clone()))
        }
    }

    fn check_locked_winnings(
        &self,
        caller: &Address,
        amount: u128,
        bonus: u128,
        user: &Address,
        now: Timestamp,
    ) -> Result<(), CollaboratorError> {
        self.authorize(caller)?;
        let entry = self
            .entries
            .get(user)
            .and_then(|by_epoch| by_epoch.get(&self.epoch_at(now)))
            .copied()
            .unwrap_or_default();
        entry
            .winnings
            .checked_add(amount)
            .zip(entry.bonus.checked_add(bonus))
            .map(|_| ())
            .ok_or(CollaboratorError::Overflow)
    }

    fn add_locked_winnings(
        &mut self,
        caller: &Address,
        amount: u128,
        bonus: u128,
        user: &Address,
        now: Timestamp,
    ) -> Result<(), CollaboratorError> {
        self.check_locked_winnings(caller, amount, bonus, user, now)?;
        let epoch = self.epoch_at(now);
        let entry = self
            .entries
            .entry(user.clone())
            .or_default()
            .entry(epoch)
            .or_default();
        entry.winnings = entry
            .winnings
            .checked_add(amount)
            .ok_or(CollaboratorError::Overflow)?;
        entry.bonus = entry
            .bonus
            .checked_add(bonus)
            .ok_or(CollaboratorError::Overflow)?;
        tracing::debug!(%user, amount, bonus, epoch, "winnings locked for vesting");
        Ok(())
    }
}
