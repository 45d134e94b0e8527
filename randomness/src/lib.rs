//! Per-elevation randomness for round draws.
//!
//! - **Commit-reveal**: a trusted seeder seals `hash(value ‖ seeder)` inside the
//!   final seconds of a round, then reveals `value` at least one block later.
//!   The revealed value is mixed with the reveal block's hash, which nobody
//!   knew at seal time.
//! - **Weighted draw**: the final seed and the per-totem weights pick the
//!   winning totem, favoring the totem with less at stake.

pub mod commit_reveal;
pub mod draw;
pub mod error;

pub use commit_reveal::{seal_hash, RandomnessCoordinator, RevealedSeed, SeedState};
pub use draw::DrawPolicy;
pub use error::RandomnessError;
