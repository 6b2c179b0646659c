//! Mock-chain tests for the account nonce discipline and the transaction
//! lifecycle.

use ethereum_types::U256;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::MockServer;

use relayer::account::{parse_private_key, Account};
use relayer::error::RelayError;
use relayer::rpc::ChainClient;

mod helpers;
use helpers::{
    addr, h256, mount_rpc, mount_rpc_once, mount_submission, rpc_error, DUMMY_TO, DUMMY_TX_HASH,
    TEST_KEY,
};

async fn test_account(server: &MockServer) -> Account {
    let client = Arc::new(ChainClient::new(&server.uri(), 60).unwrap());
    Account::new(client, parse_private_key(TEST_KEY).unwrap())
        .await
        .unwrap()
}

/// A successful submission advances the nonce counter by one.
#[tokio::test]
async fn test_nonce_increments_on_success() {
    let server = MockServer::start().await;
    mount_rpc(&server, "eth_getTransactionCount", json!("0x5")).await;
    mount_rpc(&server, "eth_gasPrice", json!("0x3b9aca00")).await;
    mount_rpc(&server, "eth_estimateGas", json!("0x5208")).await;
    mount_rpc(&server, "eth_sendRawTransaction", json!(DUMMY_TX_HASH)).await;

    let account = test_account(&server).await;
    assert_eq!(account.nonce(), 5);

    account
        .submit(addr(DUMMY_TO), U256::from(1u64), Vec::new())
        .await
        .unwrap();
    assert_eq!(account.nonce(), 6);
}

/// A rejected submission must not advance the nonce counter.
#[tokio::test]
async fn test_nonce_unchanged_on_failed_submit() {
    let server = MockServer::start().await;
    mount_rpc(&server, "eth_getTransactionCount", json!("0x5")).await;
    mount_rpc(&server, "eth_gasPrice", json!("0x3b9aca00")).await;
    mount_rpc(&server, "eth_estimateGas", json!("0x5208")).await;
    wiremock::Mock::given(wiremock::matchers::method("POST"))
        .and(wiremock::matchers::body_partial_json(
            json!({ "method": "eth_sendRawTransaction" }),
        ))
        .respond_with(rpc_error(-32000, "nonce too low"))
        .mount(&server)
        .await;

    let account = test_account(&server).await;
    let result = account
        .submit(addr(DUMMY_TO), U256::from(1u64), Vec::new())
        .await;

    assert!(matches!(result, Err(RelayError::RpcUnavailable(_))));
    assert_eq!(account.nonce(), 5);
}

/// If the chain has seen more transactions than the local counter, the
/// counter catches up before the next submission.
#[tokio::test]
async fn test_nonce_adopts_chain_value() {
    let server = MockServer::start().await;
    mount_rpc_once(&server, "eth_getTransactionCount", json!("0x2")).await;
    mount_rpc(&server, "eth_getTransactionCount", json!("0x9")).await;
    mount_rpc(&server, "eth_gasPrice", json!("0x3b9aca00")).await;
    mount_rpc(&server, "eth_estimateGas", json!("0x5208")).await;
    mount_rpc(&server, "eth_sendRawTransaction", json!(DUMMY_TX_HASH)).await;

    let account = test_account(&server).await;
    assert_eq!(account.nonce(), 2);

    account
        .submit(addr(DUMMY_TO), U256::from(1u64), Vec::new())
        .await
        .unwrap();
    assert_eq!(account.nonce(), 10);
}

/// Confirmation polling gives up with Timeout once the attempt budget is
/// spent on a transaction that never leaves the pool.
#[tokio::test]
async fn test_wait_for_receipt_timeout() {
    let server = MockServer::start().await;
    mount_rpc(&server, "eth_getTransactionCount", json!("0x0")).await;
    mount_rpc(
        &server,
        "eth_getTransactionByHash",
        json!({ "blockNumber": null }),
    )
    .await;

    let account = test_account(&server).await;
    let result = account
        .wait_for_receipt(h256(DUMMY_TX_HASH), Duration::from_millis(5), Some(3))
        .await;

    match result {
        Err(RelayError::Timeout { attempts, .. }) => assert_eq!(attempts, 3),
        other => panic!("expected timeout, got {:?}", other.map(|_| ())),
    }
}

/// A mined-but-failed transaction surfaces as ExecutionReverted, distinct
/// from a submission failure.
#[tokio::test]
async fn test_wait_for_receipt_reverted() {
    let server = MockServer::start().await;
    mount_rpc(&server, "eth_getTransactionCount", json!("0x0")).await;
    mount_rpc(
        &server,
        "eth_getTransactionByHash",
        json!({ "blockNumber": "0x10" }),
    )
    .await;
    mount_rpc(
        &server,
        "eth_getTransactionReceipt",
        json!({
            "status": "0x0",
            "blockNumber": "0x10",
            "transactionHash": DUMMY_TX_HASH,
            "logs": []
        }),
    )
    .await;

    let account = test_account(&server).await;
    let result = account
        .wait_for_receipt(h256(DUMMY_TX_HASH), Duration::from_millis(5), Some(5))
        .await;
    assert!(matches!(result, Err(RelayError::ExecutionReverted(_))));
}

/// transfer() submits, confirms and reports the hash the chain
/// acknowledged.
#[tokio::test]
async fn test_transfer_confirms() {
    let server = MockServer::start().await;
    mount_submission(&server).await;

    let account = test_account(&server).await;
    let hash = account
        .transfer(addr(DUMMY_TO), U256::from(1000u64))
        .await
        .unwrap();
    assert_eq!(hash, h256(DUMMY_TX_HASH));
}
