use cairn_types::Address;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("only the router or the expedition module may add winnings (caller {0})")]
    OnlyRouterOrLottery(Address),

    #[error("nothing locked for {0}")]
    NothingLocked(Address),

    #[error("arithmetic overflow in collaborator ledger")]
    Overflow,
}
