//! JSON-RPC chain client.
//!
//! A `ChainClient` is a session bound to one chain endpoint. It exposes the
//! read/write primitives the pipeline needs (balances, nonces, headers,
//! receipts, state proofs, raw submission) over hand-rolled JSON-RPC; the
//! same surface is reused by the load-testing and smoke-test drivers.

use ethereum_types::{Bloom, H160, H256, H64, U256};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::error::{RelayError, Result};
use crate::hexutil;

/// JSON-RPC request wrapper
#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: Vec<Value>,
    id: u64,
}

/// JSON-RPC response wrapper
#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// Event log entry from a transaction receipt.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Contract that emitted the event
    pub address: H160,
    /// Indexed event parameters (signature first)
    pub topics: Vec<H256>,
    /// Non-indexed parameters, ABI-encoded
    #[serde(with = "hexutil::bytes")]
    pub data: Vec<u8>,
}

/// The chain's record of a mined transaction.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub status: U256,
    pub block_number: U256,
    pub transaction_hash: H256,
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

impl Receipt {
    pub fn succeeded(&self) -> bool {
        !self.status.is_zero()
    }

    pub fn block(&self) -> u64 {
        self.block_number.as_u64()
    }
}

/// Full block header as served by the chain.
///
/// `extra_data` carries the consensus extension (validators, proposer seal,
/// committed seals) after a 32-byte vanity prefix; see the header module.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    pub parent_hash: H256,
    pub sha3_uncles: H256,
    pub miner: H160,
    pub state_root: H256,
    pub transactions_root: H256,
    pub receipts_root: H256,
    pub logs_bloom: Bloom,
    pub difficulty: U256,
    pub number: U256,
    pub gas_limit: U256,
    pub gas_used: U256,
    pub timestamp: U256,
    #[serde(with = "hexutil::bytes")]
    pub extra_data: Vec<u8>,
    pub mix_hash: H256,
    pub nonce: H64,
    pub hash: H256,
}

/// One storage entry of an eth_getProof response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageProofEntry {
    pub key: String,
    #[serde(default)]
    pub value: Option<String>,
    pub proof: Vec<String>,
}

/// eth_getProof response: account-inclusion and storage-inclusion proof
/// node lists, hex-encoded as served.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EthProof {
    pub account_proof: Vec<String>,
    pub storage_proof: Vec<StorageProofEntry>,
}

/// Pending-ness probe result for a submitted transaction.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TxLookup {
    block_number: Option<String>,
}

/// A session bound to one chain endpoint.
pub struct ChainClient {
    http: Client,
    url: String,
    chain_id: u64,
}

impl ChainClient {
    /// Creates a client for the given endpoint and chain id.
    pub fn new(url: &str, chain_id: u64) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .no_proxy()
            .build()?;
        Ok(Self {
            http,
            url: url.to_string(),
            chain_id,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn rpc_call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
            id: 1,
        };

        let response: JsonRpcResponse = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RelayError::RpcUnavailable(format!("{} request failed: {}", method, e)))?
            .json()
            .await
            .map_err(|e| {
                RelayError::RpcUnavailable(format!("{} response unreadable: {}", method, e))
            })?;

        if let Some(error) = response.error {
            return Err(RelayError::RpcUnavailable(format!(
                "{} rejected: {} ({})",
                method, error.message, error.code
            )));
        }

        let value = response.result.unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(|e| {
            RelayError::RpcUnavailable(format!("{} result did not parse: {}", method, e))
        })
    }

    /// Current chain head height.
    pub async fn block_number(&self) -> Result<u64> {
        let raw: String = self.rpc_call("eth_blockNumber", vec![]).await?;
        hexutil::parse_quantity(&raw)
            .ok_or_else(|| RelayError::RpcUnavailable(format!("bad block number {}", raw)))
    }

    /// Native balance of `addr` at a height, or at the latest block.
    pub async fn balance_of(&self, addr: H160, block: Option<u64>) -> Result<U256> {
        self.rpc_call(
            "eth_getBalance",
            vec![json!(format!("{:?}", addr)), block_tag(block)],
        )
        .await
    }

    /// Confirmed transaction count of `addr` (its next nonce).
    pub async fn transaction_count(&self, addr: H160) -> Result<u64> {
        let raw: String = self
            .rpc_call(
                "eth_getTransactionCount",
                vec![json!(format!("{:?}", addr)), json!("latest")],
            )
            .await?;
        hexutil::parse_quantity(&raw)
            .ok_or_else(|| RelayError::RpcUnavailable(format!("bad nonce {}", raw)))
    }

    pub async fn gas_price(&self) -> Result<U256> {
        self.rpc_call("eth_gasPrice", vec![]).await
    }

    /// Gas estimate for a call message.
    pub async fn estimate_gas(
        &self,
        from: H160,
        to: H160,
        value: U256,
        data: &[u8],
    ) -> Result<u64> {
        let msg = json!({
            "from": format!("{:?}", from),
            "to": format!("{:?}", to),
            "value": format!("{:#x}", value),
            "data": hexutil::encode(data),
        });
        let raw: String = self.rpc_call("eth_estimateGas", vec![msg]).await?;
        hexutil::parse_quantity(&raw)
            .ok_or_else(|| RelayError::RpcUnavailable(format!("bad gas estimate {}", raw)))
    }

    /// Read-only contract call at a height, or at the latest block.
    pub async fn call(
        &self,
        from: H160,
        to: H160,
        payload: &[u8],
        block: Option<u64>,
    ) -> Result<Vec<u8>> {
        let msg = json!({
            "from": format!("{:?}", from),
            "to": format!("{:?}", to),
            "data": hexutil::encode(payload),
        });
        let raw: String = self.rpc_call("eth_call", vec![msg, block_tag(block)]).await?;
        hexutil::decode(&raw)
            .map_err(|e| RelayError::RpcUnavailable(format!("bad call result: {}", e)))
    }

    /// Submits a signed raw transaction, returning the hash the chain
    /// acknowledged.
    pub async fn send_raw_transaction(&self, raw: &[u8]) -> Result<H256> {
        debug!(bytes = raw.len(), "submitting raw transaction");
        self.rpc_call("eth_sendRawTransaction", vec![json!(hexutil::encode(raw))])
            .await
    }

    /// Whether a submitted transaction is still pending. A transaction the
    /// node has not indexed yet reports as pending so confirmation polling
    /// keeps going.
    pub async fn transaction_is_pending(&self, hash: H256) -> Result<bool> {
        let lookup: Option<TxLookup> = self
            .rpc_call(
                "eth_getTransactionByHash",
                vec![json!(format!("{:?}", hash))],
            )
            .await?;
        Ok(match lookup {
            Some(tx) => tx.block_number.is_none(),
            None => true,
        })
    }

    /// Receipt of a mined transaction; `None` while unmined.
    pub async fn receipt(&self, hash: H256) -> Result<Option<Receipt>> {
        self.rpc_call(
            "eth_getTransactionReceipt",
            vec![json!(format!("{:?}", hash))],
        )
        .await
    }

    /// Full header at a height. A height the chain has not produced yet is a
    /// transient condition, surfaced as `RpcUnavailable`.
    pub async fn header_by_number(&self, height: u64) -> Result<Header> {
        let header: Option<Header> = self
            .rpc_call(
                "eth_getBlockByNumber",
                vec![json!(format!("{:#x}", height)), json!(false)],
            )
            .await?;
        header.ok_or_else(|| {
            RelayError::RpcUnavailable(format!("header {} not available yet", height))
        })
    }

    /// Number of transactions in the block with the given hash.
    pub async fn block_transaction_count(&self, block_hash: H256) -> Result<u64> {
        let raw: String = self
            .rpc_call(
                "eth_getBlockTransactionCountByHash",
                vec![json!(format!("{:?}", block_hash))],
            )
            .await?;
        hexutil::parse_quantity(&raw)
            .ok_or_else(|| RelayError::RpcUnavailable(format!("bad tx count {}", raw)))
    }

    /// Account- and storage-inclusion proof for a contract and slot list at
    /// a block height.
    pub async fn proof(&self, contract: H160, slots: &[H256], block: u64) -> Result<EthProof> {
        let keys: Vec<String> = slots.iter().map(|s| format!("{:?}", s)).collect();
        self.rpc_call(
            "eth_getProof",
            vec![
                json!(format!("{:?}", contract)),
                json!(keys),
                json!(format!("{:#x}", block)),
            ],
        )
        .await
    }
}

fn block_tag(block: Option<u64>) -> Value {
    match block {
        Some(height) => json!(format!("{:#x}", height)),
        None => json!("latest"),
    }
}
