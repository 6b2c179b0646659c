//! Hex helpers for 0x-prefixed JSON-RPC quantities and byte strings.

use serde::{Deserialize, Deserializer, Serializer};

/// Encodes bytes as a 0x-prefixed lowercase hex string.
pub fn encode(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decodes a hex string with or without a 0x prefix.
pub fn decode(s: &str) -> Result<Vec<u8>, hex::FromHexError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(s)
}

/// Parses a 0x-prefixed hex quantity into a u64.
pub fn parse_quantity(s: &str) -> Option<u64> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    u64::from_str_radix(s, 16).ok()
}

/// Serde adapter for `Vec<u8>` fields carried as 0x-hex in JSON-RPC payloads
/// (log data, header extraData, raw proof values).
pub mod bytes {
    use super::*;

    pub fn serialize<S: Serializer>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        decode(&raw).map_err(serde::de::Error::custom)
    }
}
