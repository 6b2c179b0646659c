//! Decoding of the log entries the relay pipeline feeds on.
//!
//! Decoding is pure and strict: a log that does not match the expected
//! shape exactly is rejected as `MalformedEvent`, never partially decoded
//! with guessed field positions.

use ethereum_types::H160;

use crate::abi::{self, ParamType};
use crate::error::{RelayError, Result};
use crate::hexutil;
use crate::rpc::LogEntry;

/// Event emitted by a cross-chain-intent contract call:
/// `CrossChainEvent(address indexed sender, bytes txId,
/// address proxyOrAssetContract, uint64 toChainId, bytes toContract,
/// bytes rawdata)`.
pub const CROSS_CHAIN_EVENT_SIG: &str = "CrossChainEvent(address,bytes,address,uint64,bytes,bytes)";

/// Decoded fields of one cross-chain intent log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossChainEvent {
    /// Depositor, from the single indexed topic
    pub sender: H160,
    /// Transfer id; an opaque byte string treated as a big unsigned
    /// integer for slot derivation
    pub transfer_id: Vec<u8>,
    /// Asset or proxy contract that originated the transfer
    pub proxy_or_asset: H160,
    /// Destination chain id
    pub to_chain_id: u64,
    /// Destination contract, encoding chosen by the destination chain
    pub to_contract: Vec<u8>,
    /// Opaque payload replayed by the destination verifier
    pub raw_data: Vec<u8>,
}

/// Decodes a cross-chain intent log.
///
/// The topic list must be exactly `[signature, sender]` and the data must
/// unpack into exactly five values in the fixed ABI order.
pub fn decode_cross_chain_intent(log: &LogEntry) -> Result<CrossChainEvent> {
    if log.topics.len() != 2 {
        return Err(RelayError::MalformedEvent(format!(
            "cross-chain event carries {} topics, expected 2",
            log.topics.len()
        )));
    }
    let sender = H160::from_slice(&log.topics[1].as_bytes()[12..]);

    let mut values = abi::decode_exact(
        &log.data,
        &[
            ParamType::Bytes,
            ParamType::Address,
            ParamType::Uint,
            ParamType::Bytes,
            ParamType::Bytes,
        ],
    )?
    .into_iter();

    // arity is guaranteed by decode_exact; the unwraps below cannot fire
    let transfer_id = values.next().unwrap().into_bytes().unwrap();
    let proxy_or_asset = values.next().unwrap().into_address().unwrap();
    let to_chain_id = abi::uint_to_u64(values.next().unwrap().into_uint().unwrap())?;
    let to_contract = values.next().unwrap().into_bytes().unwrap();
    let raw_data = values.next().unwrap().into_bytes().unwrap();

    Ok(CrossChainEvent {
        sender,
        transfer_id,
        proxy_or_asset,
        to_chain_id,
        to_contract,
        raw_data,
    })
}

/// Decoded fields of the proof-notify event the main chain emits alongside
/// a deposit: the merkle value the destination verifier replays, and the
/// raw storage cache key the proof must be fetched under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofNotify {
    pub merkle_value: Vec<u8>,
    pub raw_key: Vec<u8>,
}

/// Decodes a proof-notify log. The data must unpack into exactly three
/// string values; the first and third are hex (merkle value, raw key), the
/// middle one is unused here.
pub fn decode_proof_notify(log: &LogEntry) -> Result<ProofNotify> {
    let mut values = abi::decode_exact(
        &log.data,
        &[ParamType::Str, ParamType::Str, ParamType::Str],
    )?
    .into_iter();

    let raw_merkle = values.next().unwrap().into_string().unwrap();
    let _ = values.next();
    let raw_key = values.next().unwrap().into_string().unwrap();

    let merkle_value = hexutil::decode(&raw_merkle)
        .map_err(|e| RelayError::MalformedEvent(format!("merkle value not hex: {}", e)))?;
    let raw_key = hexutil::decode(&raw_key)
        .map_err(|e| RelayError::MalformedEvent(format!("storage key not hex: {}", e)))?;

    Ok(ProofNotify {
        merkle_value,
        raw_key,
    })
}
