//! Cross-chain transfer verification and relay pipeline.
//!
//! Moves value between a main chain and a side chain sharing a light-client
//! proof format: submit a deposit, decode the intent event, derive the
//! storage slot the destination verifier reads, fetch the inclusion proofs
//! at the deposit block, package the canonical header with its committed
//! seals, and submit everything to the destination verification entry
//! point. The slot derivation, proof flattening and header encodings must
//! match the destination verifier byte for byte.

pub mod abi;
pub mod account;
pub mod bridge;
pub mod config;
pub mod error;
pub mod event;
pub mod hash;
pub mod header;
pub mod hexutil;
pub mod orchestrator;
pub mod proof;
pub mod rpc;
pub mod slot;
pub mod tx;

// Re-export the types most callers touch
pub use account::Account;
pub use config::{Config, CrossChainParams, ProofNoteParams, TransferParams};
pub use error::{RelayError, Result};
pub use event::{CrossChainEvent, ProofNotify};
pub use header::{ConsensusExtra, HeaderBundle};
pub use orchestrator::{CrossChainOrchestrator, RelayOutcome, RelayReport, RelayStage};
pub use proof::ProofBundle;
pub use rpc::{ChainClient, Header, LogEntry, Receipt};
