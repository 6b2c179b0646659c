//! Error taxonomy for the relay pipeline.
//!
//! Every component returns a tagged error rather than a partial result. The
//! orchestrator stops at the first failed step; nothing is retried inside
//! proof or header assembly since a retry at a different height would
//! desynchronize the proof from the header it must match.

use ethereum_types::{H256, U256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    /// Transport failure or JSON-RPC error object. Transient; the caller
    /// decides whether to retry the whole operation.
    #[error("rpc unavailable: {0}")]
    RpcUnavailable(String),

    /// A log entry did not match the expected event shape.
    #[error("malformed event: {0}")]
    MalformedEvent(String),

    /// The state-proof RPC returned an unusable proof (e.g. no storage
    /// entries for the requested slot).
    #[error("invalid proof: {0}")]
    InvalidProof(String),

    /// The block header lacks a decodable consensus extension.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// The transaction was mined but its receipt reports failure.
    #[error("execution reverted, tx {0:?}")]
    ExecutionReverted(H256),

    /// The post-relay balance delta did not equal the transferred amount.
    #[error("verification mismatch: expected balance delta {expected}, got {actual}")]
    VerificationMismatch { expected: U256, actual: U256 },

    /// Confirmation polling exhausted the caller-supplied attempt budget.
    #[error("timed out waiting for tx {hash:?} after {attempts} attempts")]
    Timeout { hash: H256, attempts: u32 },

    /// Transaction signing failed (key rejected the sighash).
    #[error("signing failed: {0}")]
    Signing(String),
}

pub type Result<T> = std::result::Result<T, RelayError>;
