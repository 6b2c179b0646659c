//! Storage slot derivation for the destination verifier's mapping layout.
//!
//! The verifier reads proof material out of a contract mapping. The slot a
//! mapping entry lives at is `keccak(leftPad32(key) || leftPad32(tableIndex))`
//! with the operands in exactly that order; swapping them or dropping the
//! zero-byte canonicalization yields a slot that exists nowhere, which the
//! destination chain reports as a (correctly) failing proof rather than an
//! error here.

use ethereum_types::{H160, H256};
use rlp::RlpStream;

use crate::error::{RelayError, Result};
use crate::hash::{keccak256, keccak256_concat};

/// Sub-key under which the node manager stores epoch proofs.
const EPOCH_PROOF_SUB_KEY: &[u8] = b"st_proof";

/// Left-pads to `len` bytes. Slices already at or above `len` are returned
/// unchanged, matching the verifier contract's padding primitive.
fn left_pad(slice: &[u8], len: usize) -> Vec<u8> {
    if slice.len() >= len {
        return slice.to_vec();
    }
    let mut padded = vec![0u8; len];
    padded[len - slice.len()..].copy_from_slice(slice);
    padded
}

/// Canonical big-endian form of a logical key: leading zeros stripped, and a
/// zero value encoded as the single byte `0x00` rather than an empty slice.
/// The destination contract hashes the integer literal, not the raw event
/// bytes, so an all-zero transfer id must become `00` before padding.
pub fn canonical_key_bytes(raw: &[u8]) -> Vec<u8> {
    let stripped: Vec<u8> = raw.iter().copied().skip_while(|b| *b == 0).collect();
    if stripped.is_empty() {
        vec![0x00]
    } else {
        stripped
    }
}

/// Slot of `mapping[key]` at the given mapping table index.
///
/// Operand order is (key, tableIndex); both operands are left-padded to 32
/// bytes before hashing with the chain's native keccak-256.
pub fn mapping_slot(logical_key: &[u8], table_index: u8) -> H256 {
    let key = left_pad(&canonical_key_bytes(logical_key), 32);
    let index = left_pad(&[table_index], 32);
    keccak256_concat(&[&key, &index])
}

/// Slot of a native-contract storage cache key.
///
/// Cache keys arrive as `contract address || suffix`; the state layer hashes
/// only the suffix. A key no longer than an address cannot name a slot.
pub fn key_to_slot(cache_key: &[u8]) -> Result<H256> {
    if cache_key.len() <= H160::len_bytes() {
        return Err(RelayError::MalformedEvent(format!(
            "storage cache key of {} bytes is no longer than an address",
            cache_key.len()
        )));
    }
    Ok(keccak256(&cache_key[H160::len_bytes()..]))
}

/// Slot of the node manager's proof-of-epoch entry for `epoch_id`.
///
/// The cache key is `contract || "st_proof" || keccak(rlp(epochId))`, then
/// hashed the same way as any other native cache key.
pub fn epoch_proof_slot(node_manager: H160, epoch_id: u64) -> H256 {
    let mut s = RlpStream::new();
    s.append(&epoch_id);
    let proof_hash = keccak256(&s.out());

    let mut cache_key = Vec::with_capacity(H160::len_bytes() + EPOCH_PROOF_SUB_KEY.len() + 32);
    cache_key.extend_from_slice(node_manager.as_bytes());
    cache_key.extend_from_slice(EPOCH_PROOF_SUB_KEY);
    cache_key.extend_from_slice(proof_hash.as_bytes());
    keccak256(&cache_key[H160::len_bytes()..])
}
