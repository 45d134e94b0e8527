//! Blake2b-256 digests over one or more byte slices.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use cairn_types::Hash32;

type Blake2b256 = Blake2b<U32>;

/// Digest of `parts` fed to the hasher in order. Equivalent to hashing their
/// concatenation, without building it.
pub fn blake2b_256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let digest = parts
        .iter()
        .fold(Blake2b256::new(), |hasher, part| hasher.chain_update(part))
        .finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    blake2b_256_multi(&[data])
}

/// [`blake2b_256_multi`] as a [`Hash32`]; seals, seeds and block hashes all
/// go through here.
pub fn hash32_multi(parts: &[&[u8]]) -> Hash32 {
    Hash32::new(blake2b_256_multi(parts))
}
