//! Proof assembly: fetching and encoding inclusion proofs the way the
//! destination verifier consumes them.
//!
//! The verifier takes each proof as a single opaque blob, not a node list:
//! every hex-encoded node returned by the state-proof RPC is decoded, the
//! raw bytes are concatenated in order, and the concatenation is wrapped in
//! one outer RLP byte string. Account proof and storage proof are encoded
//! independently. Both are always fetched at the same height the header
//! bundle is packaged at.

use ethereum_types::{H160, H256};
use tracing::debug;

use crate::error::{RelayError, Result};
use crate::hexutil;
use crate::rpc::ChainClient;

/// An encoded, verifier-ready proof package. Immutable; byte-identical for
/// identical `(contract, slots, block)` inputs since finalized state never
/// changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofBundle {
    pub account_proof: Vec<u8>,
    pub storage_proof: Vec<u8>,
    pub merkle_value: Vec<u8>,
}

/// Flattens a proof node list into the verifier's single-blob encoding.
///
/// Concatenation is lossless and order-preserving: the decoded length of
/// the result equals the sum of the nodes' decoded lengths.
pub fn flatten_proof_nodes(nodes: &[String]) -> Result<Vec<u8>> {
    let mut raw = Vec::new();
    for node in nodes {
        let bytes = hexutil::decode(node)
            .map_err(|e| RelayError::InvalidProof(format!("proof node not hex: {}", e)))?;
        raw.extend_from_slice(&bytes);
    }
    Ok(rlp::encode(&raw).to_vec())
}

/// Fetches and encodes the account- and storage-inclusion proofs for the
/// given contract and slots at `block`, attaching the merkle value the
/// event supplied.
///
/// A proof with zero storage entries means the slot does not exist, which
/// never happens in the success path of a completed deposit; it is
/// surfaced as `InvalidProof`, not retried.
pub async fn assemble(
    client: &ChainClient,
    contract: H160,
    slots: &[H256],
    block: u64,
    merkle_value: Vec<u8>,
) -> Result<ProofBundle> {
    let proof = client.proof(contract, slots, block).await?;
    if proof.storage_proof.is_empty() {
        return Err(RelayError::InvalidProof(format!(
            "no storage proof for contract {:?} at block {}",
            contract, block
        )));
    }

    let account_proof = flatten_proof_nodes(&proof.account_proof)?;
    let storage_proof = flatten_proof_nodes(&proof.storage_proof[0].proof)?;
    debug!(
        contract = ?contract,
        block,
        account_nodes = proof.account_proof.len(),
        storage_nodes = proof.storage_proof[0].proof.len(),
        "proof assembled"
    );

    Ok(ProofBundle {
        account_proof,
        storage_proof,
        merkle_value,
    })
}
