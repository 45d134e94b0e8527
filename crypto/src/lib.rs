//! Hashing primitives for the Cairn yield engine.
//!
//! Blake2b-256 is used for sealed-seed commitments, seed mixing at reveal time
//! and the deterministic block hashes produced by the test chain.

pub mod hash;

pub use hash::{blake2b_256, blake2b_256_multi, hash32_multi};
