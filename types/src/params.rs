//! Engine parameters: emission, round timing, windows, caps, fees and the draw policy.
//!
//! Every field is owner-tunable (in production through the timelock module).
//! Integer fields are `u64` so the struct round-trips through TOML.

use crate::elevation::Elevation;
use serde::{Deserialize, Serialize};

/// Denominator for every basis-point quantity (10_000 = 100%).
pub const BPS_DENOMINATOR: u64 = 10_000;

/// All engine parameters. Missing fields in a config file take their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineParams {
    // ── Emission ─────────────────────────────────────────────────────────
    /// Reward units emitted per second across the whole engine.
    pub emission_per_second: u64,

    /// Base allocation of each elevation, indexed by [`Elevation::index`].
    /// The sum is the normalization total that multiplier changes preserve.
    pub elevation_base_alloc: [u64; Elevation::COUNT],

    /// Upper bound for an elevation's allocation multiplier (30_000 = 3x).
    pub max_alloc_multiplier_bps: u64,

    // ── Rounds ───────────────────────────────────────────────────────────
    /// Round length before the per-elevation multiplier is applied.
    pub base_round_duration_secs: u64,

    /// Per-elevation round duration multiplier (must be non-zero).
    pub round_duration_mult: [u64; Elevation::COUNT],

    /// Delay after launch before each elevation unlocks.
    pub unlock_delay_secs: [u64; Elevation::COUNT],

    /// Final seconds of a lottery round during which deposits, elevates and
    /// totem switches are rejected.
    pub lockout_secs: u64,

    /// Final seconds of a round during which a sealed seed may be submitted.
    pub seal_window_secs: u64,

    // ── Lottery split ────────────────────────────────────────────────────
    /// Share of a lottery pool's emission that is put at stake in the draw.
    /// The remainder is the baseline every staker earns.
    pub totem_pot_bps: u64,

    /// Share of the losing totem's pot that the losers keep.
    pub loser_pot_keep_bps: u64,

    /// Cap on the winning totem's pot multiplier (30_000 = 3x).
    pub max_win_multiplier_bps: u64,

    /// How strongly the draw favors the totem with less at stake (10_000 = fully
    /// inverse-weighted, 0 = coin flip).
    pub draw_bias_bps: u64,

    /// Lower bound on either totem's chance to win.
    pub min_win_chance_bps: u64,

    // ── Capacity ─────────────────────────────────────────────────────────
    /// Maximum pools in an elevation's active set.
    pub max_active_pools: usize,

    /// Maximum pools a user may interact with at one elevation.
    pub max_staked_pools_per_user: usize,

    // ── Fairness tax / staking bonus ─────────────────────────────────────
    /// Window over which the withdrawal tax decays to its floor.
    pub tax_decay_secs: u64,

    /// Defaults applied to newly registered tokens.
    pub default_max_withdraw_tax_bps: u64,
    pub default_min_withdraw_tax_bps: u64,

    /// A deposit resets the tax timer only if it exceeds this share of the
    /// user's existing stake in the token.
    pub tax_reset_threshold_bps: u64,

    /// Hard caps for per-token fee settings.
    pub max_deposit_fee_bps: u64,
    pub max_withdraw_tax_cap_bps: u64,

    /// Staking bonus ceiling and the window to reach it.
    pub max_bonus_bps: u64,
    pub bonus_accrual_secs: u64,
}

impl EngineParams {
    /// Production defaults.
    pub fn cairn_defaults() -> Self {
        Self {
            emission_per_second: 1_000_000_000_000,
            elevation_base_alloc: [100, 110, 125, 150],
            max_alloc_multiplier_bps: 30_000,

            base_round_duration_secs: 3600,
            round_duration_mult: [1, 2, 2, 4],
            unlock_delay_secs: [0, 2 * 24 * 3600, 4 * 24 * 3600, 7 * 24 * 3600],
            lockout_secs: 120,
            seal_window_secs: 60,

            totem_pot_bps: 5000,
            loser_pot_keep_bps: 0,
            max_win_multiplier_bps: 30_000,
            draw_bias_bps: 10_000,
            min_win_chance_bps: 1000,

            max_active_pools: 24,
            max_staked_pools_per_user: 12,

            tax_decay_secs: 7 * 24 * 3600,
            default_max_withdraw_tax_bps: 700,
            default_min_withdraw_tax_bps: 100,
            tax_reset_threshold_bps: 500,
            max_deposit_fee_bps: 500,
            max_withdraw_tax_cap_bps: 1000,

            max_bonus_bps: 700,
            bonus_accrual_secs: 7 * 24 * 3600,
        }
    }

    /// Sum of base elevation allocations.
    pub fn total_base_alloc(&self) -> u128 {
        self.elevation_base_alloc.iter().map(|a| *a as u128).sum()
    }

    /// Round length of an elevation using the configured multiplier.
    pub fn round_duration(&self, elevation: Elevation) -> u64 {
        self.base_round_duration_secs
            .saturating_mul(self.round_duration_mult[elevation.index()])
    }
}

impl Default for EngineParams {
    fn default() -> Self {
        Self::cairn_defaults()
    }
}
