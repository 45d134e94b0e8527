//! Locked governance tokens.

use cairn_types::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::CollaboratorError;

/// Sink for winnings routed into locked governance tokens.
pub trait EverestLocks {
    /// Fails exactly when `add_locked_winnings` would, without locking anything.
    fn check_locked_winnings(
        &self,
        user: &Address,
        amount: u128,
    ) -> Result<(), CollaboratorError>;

    fn add_locked_winnings(
        &mut self,
        user: &Address,
        amount: u128,
    ) -> Result<(), CollaboratorError>;
}

/// Read-only gate for modules outside the engine (the engine itself never
/// consults it).
pub trait VotingWeight {
    fn has_voting_weight(&self, user: &Address) -> bool;
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EverestLedger {
    locked: HashMap<Address, u128>,
}

impl EverestLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn locked(&self, user: &Address) -> u128 {
        self.locked.get(user).copied().unwrap_or(0)
    }
}

impl EverestLocks for EverestLedger {
    fn check_locked_winnings(
        &self,
        user: &Address,
        amount: u128,
    ) -> Result<(), CollaboratorError> {
        self.locked(user)
            .checked_add(amount)
            .map(|_| ())
            .ok_or(CollaboratorError::Overflow)
    }

    fn add_locked_winnings(
        &mut self,
        user: &Address,
        amount: u128,
    ) -> Result<(), CollaboratorError> {
        self.check_locked_winnings(user, amount)?;
        let slot = self.locked.entry(user.clone()).or_insert(0);
        *slot = slot.checked_add(amount).ok_or(CollaboratorError::Overflow)?;
        tracing::debug!(%user, amount, "winnings locked in everest");
        Ok(())
    }
}

impl VotingWeight for EverestLedger {
    fn has_voting_weight(&self, user: &Address) -> bool {
        self.locked(user) > 0
    }
}
