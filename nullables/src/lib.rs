//! Nullable infrastructure for deterministic testing.
//!
//! The engine never reads the wall clock or produces blocks itself: every
//! call receives a [`BlockContext`]. These helpers produce those contexts
//! deterministically and play the trusted seeder, so scenario tests can
//! walk an engine through unlocks, rounds and commit-reveal without any
//! real chain.
//!
//! [`BlockContext`]: cairn_types::BlockContext

pub mod chain;
pub mod clock;
pub mod seeder;

pub use chain::NullChain;
pub use clock::NullClock;
pub use seeder::NullSeeder;
