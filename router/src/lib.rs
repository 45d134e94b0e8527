//! Cairn router: the public surface of the yield engine.
//!
//! The [`Router`] owns one [`cairn_ledger::PoolLedger`] per elevation, the
//! round scheduler, the commit-reveal coordinator and the allocation tables.
//! Callers pass a [`cairn_types::BlockContext`] on every state transition;
//! the engine never reads a clock of its own.

pub mod allocation;
pub mod config;
pub mod error;
pub mod router;

pub use allocation::{AllocationTable, ElevationAllocation, TokenConfig, TokenRegistry};
pub use config::EngineConfig;
pub use error::RouterError;
pub use router::{RolloverReport, Router};
