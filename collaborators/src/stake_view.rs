use cairn_types::{Address, Elevation, Timestamp};
use serde::{Deserialize, Serialize};

/// Where a claim's winnings go.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimTarget {
    /// Epoch vesting schedule.
    #[default]
    Vesting,
    /// Locked governance tokens.
    Everest,
}

/// Per-user stake totals read by the expedition module.
pub trait StakeView {
    type Error;

    fn user_staked(&self, user: &Address, elevation: Elevation) -> u128;

    fn user_claimable(
        &self,
        user: &Address,
        elevation: Elevation,
        now: Timestamp,
    ) -> Result<u128, Self::Error>;

    /// Stake summed over every elevation.
    fn user_total_staked(&self, user: &Address) -> u128 {
        Elevation::ALL
            .iter()
            .map(|e| self.user_staked(user, *e))
            .fold(0, u128::saturating_add)
    }
}
