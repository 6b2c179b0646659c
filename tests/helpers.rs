//! Shared fixtures for the relayer integration tests.
//!
//! Provides dummy keys/addresses and wiremock plumbing for a mock JSON-RPC
//! chain endpoint.

#![allow(dead_code)]

use ethereum_types::{H160, H256};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use relayer::header::ConsensusExtra;
use relayer::hexutil;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Well-known EIP-155 example key
pub const TEST_KEY: &str = "4646464646464646464646464646464646464646464646464646464646464646";

/// Address derived from TEST_KEY
pub const TEST_ADDRESS: &str = "0x9d8a62f656a8d1615c1294fd71e9cfb3e4855a4f";

/// Secondary dummy key for the side-chain account
pub const SIDE_KEY: &str = "4b0c9b9d685db17ac9f295cb12f9d7d2369f5bf524b3ce52ce424031cafda1ae";

/// Dummy receiver address
pub const DUMMY_TO: &str = "0x67cde763bd045b14898d8b044f8afc8695ae8608";

/// Dummy side-chain data (ECCD) contract
pub const DUMMY_ECCD: &str = "0x0000000000000000000000000000000000000021";

/// Dummy side-chain verifier (ECCM) contract
pub const DUMMY_ECCM: &str = "0x0000000000000000000000000000000000000022";

/// Dummy transaction hash echoed by the mock chain
pub const DUMMY_TX_HASH: &str =
    "0x1111111111111111111111111111111111111111111111111111111111111111";

/// Address from a hex string, with or without 0x.
pub fn addr(s: &str) -> H160 {
    H160::from_slice(&hexutil::decode(s).unwrap())
}

/// 32-byte hash from a hex string, with or without 0x.
pub fn h256(s: &str) -> H256 {
    H256::from_slice(&hexutil::decode(s).unwrap())
}

// ============================================================================
// MOCK JSON-RPC PLUMBING
// ============================================================================

/// Wraps a result value in a JSON-RPC success envelope.
pub fn rpc_result(value: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "result": value,
        "id": 1
    }))
}

/// Wraps an error in a JSON-RPC error envelope.
pub fn rpc_error(code: i64, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "error": { "code": code, "message": message },
        "id": 1
    }))
}

/// Mounts a responder for one JSON-RPC method.
pub async fn mount_rpc(server: &MockServer, rpc_method: &str, result: Value) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": rpc_method })))
        .respond_with(rpc_result(result))
        .mount(server)
        .await;
}

/// Mounts a responder for one JSON-RPC method that answers only once;
/// mount before a catch-all responder to script a value change over time.
pub async fn mount_rpc_once(server: &MockServer, rpc_method: &str, result: Value) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": rpc_method })))
        .respond_with(rpc_result(result))
        .up_to_n_times(1)
        .mount(server)
        .await;
}

/// Mounts the boilerplate a signed submission needs: nonce, gas price, gas
/// estimate, submission ack, mined-transaction lookup and a successful
/// empty receipt.
pub async fn mount_submission(server: &MockServer) {
    mount_rpc(server, "eth_getTransactionCount", json!("0x0")).await;
    mount_rpc(server, "eth_gasPrice", json!("0x3b9aca00")).await;
    mount_rpc(server, "eth_estimateGas", json!("0x33450")).await;
    mount_rpc(server, "eth_sendRawTransaction", json!(DUMMY_TX_HASH)).await;
    mount_rpc(
        server,
        "eth_getTransactionByHash",
        json!({ "blockNumber": "0x10" }),
    )
    .await;
    mount_rpc(
        server,
        "eth_getTransactionReceipt",
        json!({
            "status": "0x1",
            "blockNumber": "0x10",
            "transactionHash": DUMMY_TX_HASH,
            "logs": []
        }),
    )
    .await;
}

// ============================================================================
// CHAIN DATA FIXTURES
// ============================================================================

/// A consensus extension with one validator and two committed seals.
pub fn sample_extra() -> ConsensusExtra {
    ConsensusExtra {
        validators: vec![addr(DUMMY_TO)],
        seal: vec![0xaa; 65],
        committed_seals: vec![vec![0xbb; 65], vec![0xcc; 65]],
    }
}

/// Header JSON as served by eth_getBlockByNumber, with the given extraData.
pub fn header_json(extra_data: &[u8]) -> Value {
    json!({
        "parentHash": "0x2222222222222222222222222222222222222222222222222222222222222222",
        "sha3Uncles": "0x1dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d49347",
        "miner": "0x0000000000000000000000000000000000000000",
        "stateRoot": "0x3333333333333333333333333333333333333333333333333333333333333333",
        "transactionsRoot": "0x4444444444444444444444444444444444444444444444444444444444444444",
        "receiptsRoot": "0x5555555555555555555555555555555555555555555555555555555555555555",
        "logsBloom": format!("0x{}", "00".repeat(256)),
        "difficulty": "0x1",
        "number": "0x10",
        "gasLimit": "0x1c9c380",
        "gasUsed": "0x5208",
        "timestamp": "0x64b5f000",
        "extraData": hexutil::encode(extra_data),
        "mixHash": "0x6666666666666666666666666666666666666666666666666666666666666666",
        "nonce": "0x0000000000000000",
        "hash": "0x7777777777777777777777777777777777777777777777777777777777777777"
    })
}

/// eth_getProof JSON with the given node lists.
pub fn proof_json(account_nodes: &[&str], storage_nodes: &[&str]) -> Value {
    json!({
        "accountProof": account_nodes,
        "storageProof": [{
            "key": "0x0000000000000000000000000000000000000000000000000000000000000001",
            "value": "0x1",
            "proof": storage_nodes
        }]
    })
}
