//! Configuration and per-operation parameter files.
//!
//! The tool consumes one JSON config (chain id, node endpoints and their
//! key material) plus one small JSON parameter file per operation, each
//! deserialized into a typed struct and validated at load time instead of
//! being assembled ad hoc at the call site.

use ethereum_types::{H160, U256};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;

/// Top-level tool configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(rename = "ChainID")]
    pub chain_id: u64,
    #[serde(rename = "Nodes")]
    pub nodes: Vec<Node>,
    #[serde(rename = "BlockPeriod", default = "default_block_period")]
    pub block_period: u64,
}

/// One chain endpoint and the key bound to it.
#[derive(Debug, Clone, Deserialize)]
pub struct Node {
    #[serde(rename = "Url")]
    pub url: String,
    #[serde(rename = "NodeKey")]
    pub node_key: String,
}

fn default_block_period() -> u64 {
    3
}

impl Config {
    /// Loads and validates the JSON config file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let config: Config = load_json(path)?;
        if config.nodes.is_empty() {
            anyhow::bail!("config {} lists no nodes", path.display());
        }
        Ok(config)
    }

    /// The first node acts as the master endpoint/account.
    pub fn master_node(&self) -> &Node {
        &self.nodes[0]
    }

    /// One block period plus slack, the wait between a state change and a
    /// dependent read.
    pub fn block_waiting_time(&self) -> Duration {
        Duration::from_secs(self.block_period + 1)
    }
}

/// Loads a typed JSON parameter file.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("failed to parse {}", path.display()))
}

/// Parameters of the raw balance-transfer smoke test.
#[derive(Debug, Clone, Deserialize)]
pub struct TransferParams {
    #[serde(rename = "To")]
    pub to: H160,
    #[serde(rename = "Amount")]
    pub amount: u64,
}

/// Parameters shared by the deposit and withdraw pipelines.
#[derive(Debug, Clone, Deserialize)]
pub struct CrossChainParams {
    /// Chain id the side-chain endpoint answers with
    #[serde(rename = "SideChainID")]
    pub side_chain_id: u64,
    /// Cross-chain id the side chain is registered under
    #[serde(rename = "CrossChainID")]
    pub cross_chain_id: u64,
    #[serde(rename = "SideChainUrl")]
    pub side_chain_url: String,
    /// Side-chain data contract proofs are fetched against
    #[serde(rename = "SideChainECCD")]
    pub side_chain_eccd: H160,
    /// Side-chain verification entry point
    #[serde(rename = "SideChainECCM")]
    pub side_chain_eccm: H160,
    /// Side-chain account key; empty means a throwaway account
    #[serde(rename = "NodeKey", default)]
    pub node_key: String,
    /// Whole-token amount to move
    #[serde(rename = "Amount")]
    pub amount: u64,
    /// Stop after proof assembly and let an external relayer submit
    #[serde(rename = "Relayer", default)]
    pub relayer: bool,
    /// Mapping table index of the verifier's proof storage
    #[serde(rename = "TableIndex", default = "default_table_index")]
    pub table_index: u8,
}

fn default_table_index() -> u8 {
    1
}

/// Parameters of the proof-note write loop.
#[derive(Debug, Clone, Deserialize)]
pub struct ProofNoteParams {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Value")]
    pub value: String,
    #[serde(rename = "LastTime", default = "default_repeat")]
    pub repeat: u32,
}

fn default_repeat() -> u32 {
    1
}

/// Scales a whole-token amount into base units (18 decimals).
pub fn scale_amount(units: u64) -> U256 {
    U256::exp10(18) * U256::from(units)
}
