//! Boundaries between the yield engine and the modules around it.
//!
//! The engine pushes claimed winnings into a vesting schedule or into locked
//! governance tokens, and exposes per-user stake totals to the expedition
//! module. Each boundary is a trait; the in-memory ledgers here are the
//! reference implementations used by the router's tests.

pub mod error;
pub mod everest;
pub mod stake_view;
pub mod vesting;

pub use error::CollaboratorError;
pub use everest::{EverestLedger, EverestLocks, VotingWeight};
pub use stake_view::{ClaimTarget, StakeView};
pub use vesting::{EpochVestingLedger, VestingEntry, WinningsVesting};
