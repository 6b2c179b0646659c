//! Keccak-256 helpers shared by slot derivation, ABI coding and signing.

use ethereum_types::H256;
use sha3::{Digest, Keccak256};

/// Keccak-256 of a single byte string.
pub fn keccak256(data: &[u8]) -> H256 {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    H256::from_slice(&hasher.finalize())
}

/// Keccak-256 over the concatenation of several byte strings.
pub fn keccak256_concat(parts: &[&[u8]]) -> H256 {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    H256::from_slice(&hasher.finalize())
}
