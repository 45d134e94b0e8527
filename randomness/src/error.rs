use cairn_types::{BlockHeight, Elevation};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RandomnessError {
    #[error("caller is not the trusted seeder")]
    OnlyTrustedSeeder,

    #[error("a sealed seed is already pending or revealed for {0}")]
    AlreadySealed(Elevation),

    #[error("no sealed seed pending for {0}")]
    NoSealedSeed(Elevation),

    #[error("reveal not allowed before block {target} (current {current})")]
    FutureBlockNotReached {
        current: BlockHeight,
        target: BlockHeight,
    },

    #[error("unsealed seed does not match the sealed hash")]
    UnsealedSeedMismatch,

    #[error("seed submission window for {0} is not open")]
    SeedRoundNotAvailable(Elevation),

    #[error("sealed seed for {0} has not been revealed yet")]
    SeedRevealPending(Elevation),
}
