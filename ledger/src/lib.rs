//! Pool ledger: the accounting core of an elevation.
//!
//! Every pool is one token staked at one elevation. Emission accrues per
//! second into two accumulators:
//!
//! - **baseline**: earned by every staker and claimable immediately;
//! - **pot** (lottery elevations only): tracked per totem during a round and
//!   re-split at rollover, when the losing totem's pot flows to the winners
//!   up to a capped multiplier.
//!
//! Positions settle lazily against the pool accumulators and per-round
//! outcome snapshots, so a rollover is O(active pools), never O(users).

pub mod emission;
pub mod engine;
pub mod error;
pub mod fairness;
pub mod pool;
pub mod position;

pub use emission::EmissionShare;
pub use engine::{
    ClaimReceipt, DepositReceipt, EmergencyReceipt, LedgerContext, LedgerParams, PoolLedger,
    TotemSelection, WithdrawReceipt,
};
pub use error::LedgerError;
pub use fairness::{FairnessBook, FairnessParams, TokenFees, UserTokenTiming};
pub use pool::{Pool, RoundOutcome, ACC_PRECISION, MULT_PRECISION};
pub use position::UserPoolPosition;
