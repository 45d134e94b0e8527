//! Fundamental types for the Cairn yield engine.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! addresses, elevations and totems, token/pool identifiers, timestamps, block context
//! and the engine parameters.

pub mod address;
pub mod chain;
pub mod elevation;
pub mod error;
pub mod hash;
pub mod params;
pub mod time;
pub mod token;

pub use address::Address;
pub use chain::{BlockContext, BlockHeight};
pub use elevation::{Elevation, ElevationKind, Totem};
pub use error::TypeError;
pub use hash::Hash32;
pub use params::{EngineParams, BPS_DENOMINATOR};
pub use time::Timestamp;
pub use token::{PoolId, TokenId};
