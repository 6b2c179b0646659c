//! Legacy transaction building and EIP-155 signing.
//!
//! The chains on both sides of the relay accept pre-EIP-1559 transactions
//! with replay protection folded into `v`. The sighash covers
//! `(nonce, gasPrice, gas, to, value, data, chainId, 0, 0)`; the signed
//! encoding replaces the trailing triple with `(v, r, s)` and its keccak is
//! the transaction hash.

use ethereum_types::{H160, H256, U256};
use k256::ecdsa::SigningKey;
use rlp::RlpStream;

use crate::error::{RelayError, Result};
use crate::hash::keccak256;

/// An intent to change chain state. Immutable once signed.
#[derive(Debug, Clone)]
pub struct UnsignedTransaction {
    pub nonce: u64,
    pub gas_price: U256,
    pub gas_limit: u64,
    pub to: H160,
    pub value: U256,
    pub data: Vec<u8>,
}

/// A signed transaction: the raw wire encoding and the hash identifying it.
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    pub raw: Vec<u8>,
    pub hash: H256,
}

impl UnsignedTransaction {
    fn append_base(&self, s: &mut RlpStream) {
        s.append(&self.nonce);
        s.append(&self.gas_price);
        s.append(&self.gas_limit);
        s.append(&self.to);
        s.append(&self.value);
        s.append(&self.data);
    }

    /// EIP-155 signing hash for the given chain.
    pub fn sighash(&self, chain_id: u64) -> H256 {
        let mut s = RlpStream::new_list(9);
        self.append_base(&mut s);
        s.append(&chain_id);
        s.append(&0u8);
        s.append(&0u8);
        keccak256(&s.out())
    }

    /// Signs with the account key and produces the raw wire encoding.
    pub fn sign(&self, key: &SigningKey, chain_id: u64) -> Result<SignedTransaction> {
        let sighash = self.sighash(chain_id);
        let (signature, recovery_id) = key
            .sign_prehash_recoverable(sighash.as_bytes())
            .map_err(|e| RelayError::Signing(e.to_string()))?;

        let sig_bytes = signature.to_bytes();
        let r = U256::from_big_endian(&sig_bytes[..32]);
        let sv = U256::from_big_endian(&sig_bytes[32..]);
        let v = u64::from(recovery_id.to_byte()) + 35 + 2 * chain_id;

        let mut s = RlpStream::new_list(9);
        self.append_base(&mut s);
        s.append(&v);
        s.append(&r);
        s.append(&sv);

        let raw = s.out().to_vec();
        let hash = keccak256(&raw);
        Ok(SignedTransaction { raw, hash })
    }
}

/// Address derived from a signing key: keccak of the uncompressed public key
/// point, last 20 bytes.
pub fn address_of(key: &SigningKey) -> H160 {
    let point = key.verifying_key().to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    H160::from_slice(&hash.as_bytes()[12..])
}
