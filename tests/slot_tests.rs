//! Unit tests for storage slot derivation.

use relayer::error::RelayError;
use relayer::hash::keccak256;
use relayer::slot;

mod helpers;
use helpers::addr;

/// Same (key, tableIndex) always yields the same slot.
#[test]
fn test_mapping_slot_deterministic() {
    let a = slot::mapping_slot(&[0x12, 0x34], 1);
    let b = slot::mapping_slot(&[0x12, 0x34], 1);
    assert_eq!(a, b);
}

/// The slot is keccak over (paddedKey || paddedIndex) in exactly that
/// operand order; the layout below is built by hand.
#[test]
fn test_mapping_slot_operand_layout() {
    let mut operands = [0u8; 64];
    operands[30] = 0x12;
    operands[31] = 0x34;
    operands[63] = 0x05;
    let expected = keccak256(&operands);

    assert_eq!(slot::mapping_slot(&[0x12, 0x34], 5), expected);
}

/// Swapping the operands is a different slot.
#[test]
fn test_mapping_slot_operand_order_matters() {
    let mut swapped = [0u8; 64];
    swapped[31] = 0x05;
    swapped[62] = 0x12;
    swapped[63] = 0x34;

    assert_ne!(slot::mapping_slot(&[0x12, 0x34], 5), keccak256(&swapped));
}

/// A zero transfer id hashes as the single byte 0x00, not an empty string;
/// all zero representations collapse to the same slot.
#[test]
fn test_mapping_slot_zero_key_canonicalization() {
    let mut operands = [0u8; 64];
    operands[63] = 0x01;
    let expected = keccak256(&operands);

    assert_eq!(slot::mapping_slot(&[], 1), expected);
    assert_eq!(slot::mapping_slot(&[0x00], 1), expected);
    assert_eq!(slot::mapping_slot(&[0x00, 0x00, 0x00], 1), expected);
}

/// Leading zeros never change the logical key.
#[test]
fn test_mapping_slot_strips_leading_zeros() {
    assert_eq!(
        slot::mapping_slot(&[0x00, 0x00, 0x07], 1),
        slot::mapping_slot(&[0x07], 1)
    );
}

/// canonical_key_bytes boundary behavior.
#[test]
fn test_canonical_key_bytes() {
    assert_eq!(slot::canonical_key_bytes(&[]), vec![0x00]);
    assert_eq!(slot::canonical_key_bytes(&[0x00, 0x00]), vec![0x00]);
    assert_eq!(slot::canonical_key_bytes(&[0x00, 0x0a, 0x00]), vec![0x0a, 0x00]);
    assert_eq!(slot::canonical_key_bytes(&[0xff]), vec![0xff]);
}

/// Cache keys hash everything after the 20-byte contract address.
#[test]
fn test_key_to_slot_strips_address_prefix() {
    let contract = addr("0x0000000000000000000000000000000000001002");
    let mut cache_key = contract.as_bytes().to_vec();
    cache_key.extend_from_slice(b"request_suffix");

    let derived = slot::key_to_slot(&cache_key).unwrap();
    assert_eq!(derived, keccak256(b"request_suffix"));
}

/// A key no longer than an address cannot name a slot.
#[test]
fn test_key_to_slot_rejects_short_key() {
    let result = slot::key_to_slot(&[0u8; 20]);
    assert!(matches!(result, Err(RelayError::MalformedEvent(_))));
}

/// Epoch proof slots are deterministic and distinct per epoch.
#[test]
fn test_epoch_proof_slot() {
    let node_manager = relayer::bridge::NODE_MANAGER_ADDRESS;
    let first = slot::epoch_proof_slot(node_manager, 1);
    assert_eq!(first, slot::epoch_proof_slot(node_manager, 1));
    assert_ne!(first, slot::epoch_proof_slot(node_manager, 2));
}
