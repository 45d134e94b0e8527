//! Nullable seeder: plays the trusted seeder with deterministic values.

use cairn_crypto::hash32_multi;
use cairn_randomness::seal_hash;
use cairn_types::{Address, Hash32};
use std::cell::Cell;

/// Produces seed values in a fixed sequence and seals them for its address.
#[derive(Debug)]
pub struct NullSeeder {
    address: Address,
    salt: u64,
    index: Cell<u64>,
}

impl NullSeeder {
    pub fn new(address: Address, salt: u64) -> Self {
        Self {
            address,
            salt,
            index: Cell::new(0),
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    /// The next secret value in the sequence.
    pub fn next_value(&self) -> Hash32 {
        let i = self.index.get();
        self.index.set(i + 1);
        hash32_multi(&[b"null-seed", &self.salt.to_be_bytes(), &i.to_be_bytes()])
    }

    /// The commitment for `value` under this seeder's address.
    pub fn seal(&self, value: &Hash32) -> Hash32 {
        seal_hash(value, &self.address)
    }
}
