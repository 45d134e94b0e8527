//! The slice of global emission an elevation is entitled to.

use cairn_utils::{mul_div, MathOverflow};
use serde::{Deserialize, Serialize};

/// Router-computed emission inputs for one elevation.
///
/// `elevation_alloc / total_elevation_alloc` is the elevation's committed
/// share; it only changes at the elevation's own rollover (or when its own
/// multiplier is changed).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmissionShare {
    pub emission_per_second: u128,
    pub elevation_alloc: u128,
    pub total_elevation_alloc: u128,
}

impl EmissionShare {
    /// Reward emitted to a pool with `alloc` points out of `total_token_alloc`
    /// over `dt` seconds.
    ///
    /// `E * dt * alloc / total_token_alloc * elevation_alloc / total_elevation_alloc`
    pub fn pool_emission(
        &self,
        alloc: u128,
        total_token_alloc: u128,
        dt: u64,
    ) -> Result<u128, MathOverflow> {
        let raw = self
            .emission_per_second
            .checked_mul(dt as u128)
            .ok_or(MathOverflow)?;
        let token_share = mul_div(raw, alloc, total_token_alloc)?;
        mul_div(token_share, self.elevation_alloc, self.total_elevation_alloc)
    }
}
