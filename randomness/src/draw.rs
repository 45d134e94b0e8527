//! Weighted totem draw.
//!
//! Totem 0's chance in basis points:
//!
//! `p0 = 5000 + bias * (w1 - w0) / (2 * (w0 + w1))`
//!
//! clamped to `[min_win_chance, 10000 - min_win_chance]`. With `bias = 10000`
//! a totem's chance equals the *other* totem's share of the weight, which
//! cancels the larger totem's advantage in expected payout. With `bias = 0`
//! the draw is a coin flip. The roll is derived from the seed alone, so the
//! outcome is reproducible from `(seed, weights)`.

use cairn_crypto::blake2b_256_multi;
use cairn_types::{EngineParams, Hash32, Totem, BPS_DENOMINATOR};
use serde::{Deserialize, Serialize};

const HALF: u64 = BPS_DENOMINATOR / 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawPolicy {
    pub bias_bps: u64,
    pub min_win_chance_bps: u64,
}

impl DrawPolicy {
    pub fn new(bias_bps: u64, min_win_chance_bps: u64) -> Self {
        Self {
            bias_bps: bias_bps.min(BPS_DENOMINATOR),
            min_win_chance_bps: min_win_chance_bps.min(HALF),
        }
    }

    pub fn from_params(params: &EngineParams) -> Self {
        Self::new(params.draw_bias_bps, params.min_win_chance_bps)
    }

    /// Chance (bps) that totem 0 wins given per-totem weights.
    pub fn totem_zero_chance_bps(&self, weights: [u128; 2]) -> u64 {
        let [mut w0, mut w1] = weights;
        // Keep the products below comfortably inside u128.
        while w0.saturating_add(w1) > u64::MAX as u128 {
            w0 >>= 1;
            w1 >>= 1;
        }
        let total = w0 + w1;
        let chance = if total == 0 {
            HALF
        } else {
            let diff = w0.abs_diff(w1);
            let shift = (diff * self.bias_bps as u128 / (2 * total)) as u64;
            if w1 >= w0 {
                HALF + shift
            } else {
                HALF - shift
            }
        };
        chance.clamp(
            self.min_win_chance_bps,
            BPS_DENOMINATOR - self.min_win_chance_bps,
        )
    }

    /// Roll in `[0, 10000)` derived from the seed.
    pub fn roll(seed: &Hash32) -> u64 {
        let digest = blake2b_256_multi(&[seed.as_bytes(), b"totem-draw"]);
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        u64::from_be_bytes(head) % BPS_DENOMINATOR
    }

    pub fn draw(&self, seed: &Hash32, weights: [u128; 2]) -> Totem {
        if Self::roll(seed) < self.totem_zero_chance_bps(weights) {
            Totem::ZERO
        } else {
            Totem::ONE
        }
    }
}

impl Default for DrawPolicy {
    fn default() -> Self {
        Self::from_params(&EngineParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_crypto::blake2b_256;

    fn seed(i: u32) -> Hash32 {
        Hash32::new(blake2b_256(&i.to_be_bytes()))
    }

    #[test]
    fn equal_weights_are_a_coin_flip() {
        let policy = DrawPolicy::new(10_000, 1000);
        assert_eq!(policy.totem_zero_chance_bps([500, 500]), 5000);
        assert_eq!(policy.totem_zero_chance_bps([0, 0]), 5000);

        let zero_wins = (0..2000)
            .filter(|i| policy.draw(&seed(*i), [500, 500]) == Totem::ZERO)
            .count();
        assert!((850..=1150).contains(&zero_wins), "zero won {zero_wins} of 2000");
    }

    #[test]
    fn lighter_totem_is_favored() {
        let policy = DrawPolicy::new(10_000, 1000);
        // Totem 0 holds a quarter of the weight, so it gets three quarters of the chance.
        assert_eq!(policy.totem_zero_chance_bps([1, 3]), 7500);
        assert_eq!(policy.totem_zero_chance_bps([3, 1]), 2500);
    }

    #[test]
    fn half_bias_halves_the_shift() {
        let policy = DrawPolicy::new(5000, 0);
        assert_eq!(policy.totem_zero_chance_bps([1, 3]), 6250);
    }

    #[test]
    fn chance_is_clamped_so_both_sides_can_win() {
        let policy = DrawPolicy::new(10_000, 1000);
        assert_eq!(policy.totem_zero_chance_bps([0, 100]), 9000);
        assert_eq!(policy.totem_zero_chance_bps([100, 0]), 1000);
    }

    #[test]
    fn zero_bias_ignores_weights() {
        let policy = DrawPolicy::new(0, 0);
        assert_eq!(policy.totem_zero_chance_bps([1, 1_000_000]), 5000);
    }

    #[test]
    fn draw_is_reproducible() {
        let policy = DrawPolicy::default();
        for i in 0..50 {
            assert_eq!(policy.draw(&seed(i), [10, 20]), policy.draw(&seed(i), [10, 20]));
        }
    }

    #[test]
    fn huge_weights_do_not_overflow() {
        let policy = DrawPolicy::new(10_000, 0);
        let chance = policy.totem_zero_chance_bps([u128::MAX / 4, u128::MAX / 4 * 3]);
        assert!((7499..=7501).contains(&chance));
    }
}
