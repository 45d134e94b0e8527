use cairn_types::Address;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("ledger error: {0}")]
    Ledger(#[from] cairn_ledger::LedgerError),

    #[error("schedule error: {0}")]
    Schedule(#[from] cairn_rounds::ScheduleError),

    #[error("randomness error: {0}")]
    Randomness(#[from] cairn_randomness::RandomnessError),

    #[error("collaborator error: {0}")]
    Collaborator(#[from] cairn_collaborators::CollaboratorError),

    #[error("caller {0} is not the owner")]
    NonOwner(Address),

    #[error("engine is paused")]
    Paused,

    #[error("source and target pools are at the same elevation")]
    NoSameElevTransfer,

    #[error("source and target pools hold different tokens")]
    DifferentToken,

    #[error("{0} is already registered")]
    Duplicated(String),

    #[error("unknown token {0}")]
    UnknownToken(String),

    #[error("{name} of {requested} bps exceeds the cap of {cap} bps")]
    ParamTooHigh {
        name: &'static str,
        requested: u64,
        cap: u64,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error("snapshot error: {0}")]
    Snapshot(String),
}
