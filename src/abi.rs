//! Minimal ABI coding for the contract calls and events the pipeline touches.
//!
//! Only the four parameter kinds the lock-proxy, verifier and notify
//! contracts use are supported. Decoding is strict: `decode_exact` rejects
//! payloads whose arity differs from the requested schema instead of
//! guessing a field mapping.

use ethereum_types::{H160, H256, U256};

use crate::error::{RelayError, Result};
use crate::hash::keccak256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Address(H160),
    Uint(U256),
    Bytes(Vec<u8>),
    Str(String),
}

impl Token {
    pub fn into_address(self) -> Option<H160> {
        match self {
            Token::Address(a) => Some(a),
            _ => None,
        }
    }

    pub fn into_uint(self) -> Option<U256> {
        match self {
            Token::Uint(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            Token::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn into_string(self) -> Option<String> {
        match self {
            Token::Str(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Address,
    Uint,
    Bytes,
    Str,
}

impl ParamType {
    fn is_dynamic(self) -> bool {
        matches!(self, ParamType::Bytes | ParamType::Str)
    }
}

/// 4-byte function selector of a canonical signature string.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    let mut sel = [0u8; 4];
    sel.copy_from_slice(&hash.as_bytes()[..4]);
    sel
}

/// Topic hash of a canonical event signature string.
pub fn event_topic(signature: &str) -> H256 {
    keccak256(signature.as_bytes())
}

/// ABI-encodes tokens with the canonical head/tail layout.
pub fn encode(tokens: &[Token]) -> Vec<u8> {
    let head_len = 32 * tokens.len();
    let mut head = Vec::with_capacity(head_len);
    let mut tail: Vec<u8> = Vec::new();

    for token in tokens {
        match token {
            Token::Address(addr) => {
                let mut word = [0u8; 32];
                word[12..].copy_from_slice(addr.as_bytes());
                head.extend_from_slice(&word);
            }
            Token::Uint(value) => {
                let mut word = [0u8; 32];
                value.to_big_endian(&mut word);
                head.extend_from_slice(&word);
            }
            Token::Bytes(bytes) => {
                append_offset(&mut head, head_len + tail.len());
                append_dynamic(&mut tail, bytes);
            }
            Token::Str(s) => {
                append_offset(&mut head, head_len + tail.len());
                append_dynamic(&mut tail, s.as_bytes());
            }
        }
    }

    head.extend_from_slice(&tail);
    head
}

/// Selector-prefixed calldata for a contract method invocation.
pub fn encode_call(signature: &str, tokens: &[Token]) -> Vec<u8> {
    let mut payload = selector(signature).to_vec();
    payload.extend_from_slice(&encode(tokens));
    payload
}

/// Decodes `data` as exactly the given schema.
///
/// The first dynamic tail offset must equal `32 * schema.len()`: a canonical
/// encoding of any other arity places its tail elsewhere, so an event with a
/// different field count is rejected rather than partially decoded.
pub fn decode_exact(data: &[u8], schema: &[ParamType]) -> Result<Vec<Token>> {
    let head_len = 32 * schema.len();
    if data.len() < head_len || data.len() % 32 != 0 {
        return Err(RelayError::MalformedEvent(format!(
            "abi payload length {} does not fit {} values",
            data.len(),
            schema.len()
        )));
    }

    let mut tokens = Vec::with_capacity(schema.len());
    let mut first_dynamic = true;
    for (i, kind) in schema.iter().enumerate() {
        let word = &data[32 * i..32 * (i + 1)];
        match kind {
            ParamType::Address => tokens.push(Token::Address(H160::from_slice(&word[12..]))),
            ParamType::Uint => tokens.push(Token::Uint(U256::from_big_endian(word))),
            ParamType::Bytes | ParamType::Str => {
                let offset = word_to_usize(word)?;
                if first_dynamic && offset != head_len {
                    return Err(RelayError::MalformedEvent(format!(
                        "abi payload encodes a different arity: first tail at {}, expected {}",
                        offset, head_len
                    )));
                }
                first_dynamic = false;
                let bytes = read_dynamic(data, offset)?;
                if *kind == ParamType::Str {
                    let s = String::from_utf8(bytes).map_err(|_| {
                        RelayError::MalformedEvent("string value is not utf-8".into())
                    })?;
                    tokens.push(Token::Str(s));
                } else {
                    tokens.push(Token::Bytes(bytes));
                }
            }
        }
    }
    debug_assert_eq!(tokens.len(), schema.len());
    Ok(tokens)
}

/// Decodes a word that must fit a u64 (chain ids, heights).
pub fn uint_to_u64(value: U256) -> Result<u64> {
    if value.bits() > 64 {
        return Err(RelayError::MalformedEvent(format!(
            "uint value {} overflows u64",
            value
        )));
    }
    Ok(value.as_u64())
}

fn append_offset(head: &mut Vec<u8>, offset: usize) {
    let mut word = [0u8; 32];
    U256::from(offset).to_big_endian(&mut word);
    head.extend_from_slice(&word);
}

fn append_dynamic(tail: &mut Vec<u8>, bytes: &[u8]) {
    let mut word = [0u8; 32];
    U256::from(bytes.len()).to_big_endian(&mut word);
    tail.extend_from_slice(&word);
    tail.extend_from_slice(bytes);
    let rem = bytes.len() % 32;
    if rem != 0 {
        tail.extend_from_slice(&vec![0u8; 32 - rem]);
    }
}

fn word_to_usize(word: &[u8]) -> Result<usize> {
    let value = U256::from_big_endian(word);
    if value.bits() > 32 {
        return Err(RelayError::MalformedEvent(format!(
            "abi offset/length {} out of range",
            value
        )));
    }
    Ok(value.as_usize())
}

fn read_dynamic(data: &[u8], offset: usize) -> Result<Vec<u8>> {
    if offset + 32 > data.len() {
        return Err(RelayError::MalformedEvent(format!(
            "abi tail offset {} out of bounds ({} bytes)",
            offset,
            data.len()
        )));
    }
    let len = word_to_usize(&data[offset..offset + 32])?;
    let start = offset + 32;
    if start + len > data.len() {
        return Err(RelayError::MalformedEvent(format!(
            "abi value of {} bytes at {} exceeds payload",
            len, offset
        )));
    }
    Ok(data[start..start + len].to_vec())
}
