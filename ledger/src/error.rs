//! Ledger errors.

use cairn_types::{Elevation, PoolId};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("amount must be non-zero")]
    NonZeroAmount,

    #[error("withdrawal of {requested} exceeds staked balance {staked}")]
    BadWithdrawal { requested: u128, staked: u128 },

    #[error("invalid totem for this elevation")]
    InvalidTotem,

    #[error("a totem must be selected before depositing at {0}")]
    TotemMustBeSelected(Elevation),

    #[error("user already holds a different totem at {0}")]
    NoTotemSwitch(Elevation),

    #[error("pool {0} is not available yet")]
    PoolNotAvailableYet(PoolId),

    #[error("{0} is locked until rollover")]
    ElevationLockedUntilRollover(Elevation),

    #[error("user already interacts with the maximum of {limit} pools at this elevation")]
    TooManyStakedPools { limit: usize },

    #[error("active pool set is full ({limit})")]
    TooManyActivePools { limit: usize },

    #[error("pool {0} already exists")]
    Duplicated(PoolId),

    #[error("pool {0} not found")]
    PoolNotFound(PoolId),

    #[error("no outcome recorded for {pool} round {round}")]
    MissingRoundOutcome { pool: PoolId, round: u64 },

    #[error("arithmetic overflow in ledger computation")]
    Overflow,
}

impl From<cairn_utils::MathOverflow> for LedgerError {
    fn from(_: cairn_utils::MathOverflow) -> Self {
        Self::Overflow
    }
}
