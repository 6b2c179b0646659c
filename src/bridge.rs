//! Bridge contract surface: lock-proxy deposits, burns, the verifier entry
//! point and the proof-note test contract.
//!
//! The main chain hosts its bridge logic in native contracts at reserved
//! addresses; side chains deploy ECCD/ECCM contracts whose addresses come
//! from the operation parameters.

use ethereum_types::{H160, H256, U256};

use crate::abi::{self, Token};
use crate::account::Account;
use crate::error::Result;
use crate::header::HeaderBundle;
use crate::proof::ProofBundle;
use crate::rpc::Receipt;

/// Reserved cross-chain id of the main chain, the burn target of every
/// withdrawal.
pub const MAIN_CHAIN_ID: u64 = 1;

/// Native node manager on the main chain (0x…1001); owns the
/// proof-of-epoch slots.
pub const NODE_MANAGER_ADDRESS: H160 =
    H160([0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x10, 0x01]);

/// Native cross-chain manager on the main chain (0x…1002); the proof
/// contract for main-chain deposits and the verification entry point for
/// withdrawals.
pub const CROSS_CHAIN_MANAGER_ADDRESS: H160 =
    H160([0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x10, 0x02]);

/// Native lock-proxy contract, present at the same reserved address
/// (0x…1003) on the main chain and every side chain.
pub const LOCK_PROXY_ADDRESS: H160 =
    H160([0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x10, 0x03]);

/// Proof-note contract used by the account/proof test path
/// (0xF59b9838a73CBCDebBF355f9dBD554435b672432).
pub const PROOF_NOTE_ADDRESS: H160 = H160([
    0xf5, 0x9b, 0x98, 0x38, 0xa7, 0x3c, 0xbc, 0xde, 0xbb, 0xf3, 0x55, 0xf9, 0xdb, 0xd5, 0x54,
    0x43, 0x5b, 0x67, 0x24, 0x32,
]);

const LOCK_SIG: &str = "lock(address,uint64,bytes,uint256)";
const BURN_SIG: &str = "burn(uint64,address,uint256)";
const VERIFY_SIG: &str = "verifyHeaderAndExecuteTx(bytes,bytes,bytes,bytes,bytes)";
const PROOF_NOTE_SIG: &str = "set(string,string)";

/// Calldata locking native value for `to` on the target chain. The zero
/// asset hash selects the chain's native token; the deposit value itself
/// rides on the transaction.
pub fn lock_payload(target_chain_id: u64, to: H160, amount: U256) -> Vec<u8> {
    abi::encode_call(
        LOCK_SIG,
        &[
            Token::Address(H160::zero()),
            Token::Uint(U256::from(target_chain_id)),
            Token::Bytes(to.as_bytes().to_vec()),
            Token::Uint(amount),
        ],
    )
}

/// Calldata burning side-chain value back toward `to` on the target chain.
pub fn burn_payload(target_chain_id: u64, to: H160, amount: U256) -> Vec<u8> {
    abi::encode_call(
        BURN_SIG,
        &[
            Token::Uint(U256::from(target_chain_id)),
            Token::Address(to),
            Token::Uint(amount),
        ],
    )
}

/// Calldata for the verification entry point: the packaged header, its
/// committed seals, both inclusion proofs and the merkle value the
/// destination contract replays.
pub fn verify_payload(header: &HeaderBundle, proof: &ProofBundle) -> Vec<u8> {
    abi::encode_call(
        VERIFY_SIG,
        &[
            Token::Bytes(header.canonical_header.clone()),
            Token::Bytes(header.committed_seals.clone()),
            Token::Bytes(proof.account_proof.clone()),
            Token::Bytes(proof.storage_proof.clone()),
            Token::Bytes(proof.merkle_value.clone()),
        ],
    )
}

impl Account {
    /// Writes a (key, value) pair into the proof-note contract.
    pub async fn set_proof_note(&self, key: &str, value: &str) -> Result<(H256, Receipt)> {
        let payload = abi::encode_call(
            PROOF_NOTE_SIG,
            &[
                Token::Str(key.to_string()),
                Token::Str(value.to_string()),
            ],
        );
        self.send_contract_tx(PROOF_NOTE_ADDRESS, U256::zero(), payload)
            .await
    }
}
