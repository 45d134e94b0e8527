//! Integer helpers for basis points and fixed-point ratios.
//!
//! All accounting is done in `u128` raw units; these helpers keep the
//! multiply-before-divide ordering in one place and surface overflow instead
//! of wrapping.

/// Returned when an intermediate product does not fit in `u128`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MathOverflow;

const BPS: u128 = 10_000;

/// `value * numerator / denominator`, rounding down. A zero denominator yields zero.
pub fn mul_div(value: u128, numerator: u128, denominator: u128) -> Result<u128, MathOverflow> {
    if denominator == 0 {
        return Ok(0);
    }
    value
        .checked_mul(numerator)
        .map(|p| p / denominator)
        .ok_or(MathOverflow)
}

/// `value * bps / 10_000`, rounding down.
pub fn apply_bps(value: u128, bps: u64) -> Result<u128, MathOverflow> {
    mul_div(value, bps as u128, BPS)
}

/// Linear interpolation from `start` to `end` over `window` seconds.
///
/// Saturates at `end` once `elapsed >= window`; works in both directions so it
/// covers the decaying withdrawal tax and the growing staking bonus.
pub fn linear_ramp(start: u64, end: u64, elapsed: u64, window: u64) -> u64 {
    if window == 0 || elapsed >= window {
        return end;
    }
    let span = start.abs_diff(end) as u128 * elapsed as u128 / window as u128;
    let span = span as u64;
    if start > end {
        start - span
    } else {
        start + span
    }
}
