//! End-to-end cross-chain orchestration.
//!
//! Drives one transfer through the pipeline:
//! `Submitted → Confirmed → EventDecoded → KeyDerived → ProofAssembled →
//! HeaderPackaged → Relayed → Verified`. The first failing step aborts the
//! rest; there is no rollback, since the source deposit is already
//! finalized on its own chain. A failed relay is re-run by the operator,
//! never automatically, because the destination call is not known to be
//! idempotent.
//!
//! Proof assembly and header packaging have no data dependency on each
//! other beyond the captured block height, so they run concurrently once
//! the deposit receipt is known; the relay submission is strictly
//! sequential after both.

use ethereum_types::{H256, U256};
use std::fmt;
use std::time::Duration;
use tracing::{info, warn};

use crate::account::Account;
use crate::bridge;
use crate::config::{scale_amount, CrossChainParams};
use crate::error::{RelayError, Result};
use crate::event;
use crate::header;
use crate::proof;
use crate::slot;

/// Pipeline stages, in order. Terminal success is `Verified`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RelayStage {
    Submitted,
    Confirmed,
    EventDecoded,
    KeyDerived,
    ProofAssembled,
    HeaderPackaged,
    Relayed,
    Verified,
}

impl fmt::Display for RelayStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RelayStage::Submitted => "submitted",
            RelayStage::Confirmed => "confirmed",
            RelayStage::EventDecoded => "event-decoded",
            RelayStage::KeyDerived => "key-derived",
            RelayStage::ProofAssembled => "proof-assembled",
            RelayStage::HeaderPackaged => "header-packaged",
            RelayStage::Relayed => "relayed",
            RelayStage::Verified => "verified",
        };
        f.write_str(name)
    }
}

/// Terminal outcome of a relay run. A balance mismatch is a named outcome
/// the surrounding tooling treats as the test result, not an exception.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The receiver's balance grew by exactly the transferred amount.
    Verified { transferred: U256 },
    /// The balance delta differs from the transferred amount; reused
    /// nonces, replays and destination-side rejections all land here.
    Mismatch { expected: U256, actual: U256 },
    /// Proof material was assembled and handed off to an external relayer;
    /// no destination submission was made.
    Delegated,
}

/// What a relay run produced, with enough context to re-run by hand.
#[derive(Debug, Clone)]
pub struct RelayReport {
    pub deposit_hash: H256,
    pub deposit_block: u64,
    pub relay_hash: Option<H256>,
    pub outcome: RelayOutcome,
}

impl RelayReport {
    pub fn verified(&self) -> bool {
        matches!(self.outcome, RelayOutcome::Verified { .. })
    }
}

/// Drives the end-to-end sequence between one main-chain account and one
/// side-chain account. Each instance is single-owner for the lifetime of
/// the operations invoking it.
pub struct CrossChainOrchestrator {
    main: Account,
    side: Account,
    params: CrossChainParams,
    /// Interval between confirmation polls.
    poll_interval: Duration,
    /// Poll budget per confirmation; `None` waits for chain finality
    /// indefinitely.
    confirm_attempts: Option<u32>,
    /// Wait between a relayed state change and the dependent balance read.
    settle_wait: Duration,
}

impl CrossChainOrchestrator {
    pub fn new(main: Account, side: Account, params: CrossChainParams, settle_wait: Duration) -> Self {
        Self {
            main,
            side,
            params,
            poll_interval: Duration::from_secs(1),
            confirm_attempts: None,
            settle_wait,
        }
    }

    /// Bounds confirmation polling; exceeding the budget is `Timeout`.
    pub fn with_confirm_attempts(mut self, attempts: u32) -> Self {
        self.confirm_attempts = Some(attempts);
        self
    }

    /// Overrides the confirmation poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Main-chain deposit relayed to the side chain.
    ///
    /// The main chain emits three logs per deposit (cross-chain, lock,
    /// proof-notify); the notify event carries both the merkle value the
    /// destination replays and the raw cache key the proof lives under.
    pub async fn run_deposit(&self) -> Result<RelayReport> {
        let amount = scale_amount(self.params.amount);
        let receiver = self.side.address();
        let balance_before = self.side.balance_of(receiver, None).await?;

        let payload = bridge::lock_payload(self.params.cross_chain_id, receiver, amount);
        let deposit_hash = self
            .main
            .submit(bridge::LOCK_PROXY_ADDRESS, amount, payload)
            .await?;
        info!(stage = %RelayStage::Submitted, tx = ?deposit_hash, %amount, "deposit submitted");

        let receipt = self
            .main
            .wait_for_receipt(deposit_hash, self.poll_interval, self.confirm_attempts)
            .await?;
        let deposit_block = receipt.block();
        info!(stage = %RelayStage::Confirmed, block = deposit_block, "deposit mined");

        if receipt.logs.len() != 3 {
            return Err(RelayError::MalformedEvent(format!(
                "deposit receipt carries {} logs, expected cross-chain, lock and proof-notify",
                receipt.logs.len()
            )));
        }
        let notify = event::decode_proof_notify(&receipt.logs[2])?;
        info!(stage = %RelayStage::EventDecoded, merkle_bytes = notify.merkle_value.len(), "proof notify decoded");

        let proof_slot = slot::key_to_slot(&notify.raw_key)?;
        info!(stage = %RelayStage::KeyDerived, slot = ?proof_slot, "storage slot derived");

        let proof_slots = [proof_slot];
        let (proof_bundle, header_bundle) = tokio::try_join!(
            proof::assemble(
                self.main.client(),
                bridge::CROSS_CHAIN_MANAGER_ADDRESS,
                &proof_slots,
                deposit_block,
                notify.merkle_value.clone(),
            ),
            header::package(self.main.client(), deposit_block),
        )?;
        info!(stage = %RelayStage::ProofAssembled, block = deposit_block, "proofs ready");
        info!(stage = %RelayStage::HeaderPackaged, block = deposit_block, "header ready");

        if self.params.relayer {
            info!("external relayer configured, stopping after proof assembly");
            return Ok(RelayReport {
                deposit_hash,
                deposit_block,
                relay_hash: None,
                outcome: RelayOutcome::Delegated,
            });
        }

        tokio::time::sleep(self.settle_wait).await;
        let relay_payload = bridge::verify_payload(&header_bundle, &proof_bundle);
        let relay_hash = self
            .side
            .submit(self.params.side_chain_eccm, U256::zero(), relay_payload)
            .await?;
        self.side
            .wait_for_receipt(relay_hash, self.poll_interval, self.confirm_attempts)
            .await?;
        info!(stage = %RelayStage::Relayed, tx = ?relay_hash, "relay executed");

        tokio::time::sleep(self.settle_wait).await;
        let balance_after = self.side.balance_of(receiver, None).await?;
        let outcome = check_balance_delta(balance_before, balance_after, amount);

        Ok(RelayReport {
            deposit_hash,
            deposit_block,
            relay_hash: Some(relay_hash),
            outcome,
        })
    }

    /// Side-chain burn relayed back to the main chain.
    ///
    /// The side chain emits two logs per burn; the first is the cross-chain
    /// intent event, whose transfer id keys the verifier's proof mapping.
    pub async fn run_withdraw(&self) -> Result<RelayReport> {
        let amount = scale_amount(self.params.amount);
        let receiver = self.main.address();
        let balance_before = self.main.balance_of(receiver, None).await?;

        let payload = bridge::burn_payload(bridge::MAIN_CHAIN_ID, receiver, amount);
        let deposit_hash = self
            .side
            .submit(bridge::LOCK_PROXY_ADDRESS, amount, payload)
            .await?;
        info!(stage = %RelayStage::Submitted, tx = ?deposit_hash, %amount, "burn submitted");

        let receipt = self
            .side
            .wait_for_receipt(deposit_hash, self.poll_interval, self.confirm_attempts)
            .await?;
        let deposit_block = receipt.block();
        info!(stage = %RelayStage::Confirmed, block = deposit_block, "burn mined");

        if receipt.logs.len() != 2 {
            return Err(RelayError::MalformedEvent(format!(
                "burn receipt carries {} logs, expected cross-chain and lock",
                receipt.logs.len()
            )));
        }
        let intent = event::decode_cross_chain_intent(&receipt.logs[0])?;
        info!(
            stage = %RelayStage::EventDecoded,
            sender = ?intent.sender,
            to_chain = intent.to_chain_id,
            transfer_id = %crate::hexutil::encode(&intent.transfer_id),
            "cross-chain intent decoded"
        );

        let proof_slot = slot::mapping_slot(&intent.transfer_id, self.params.table_index);
        info!(stage = %RelayStage::KeyDerived, slot = ?proof_slot, "storage slot derived");

        let proof_slots = [proof_slot];
        let (proof_bundle, header_bundle) = tokio::try_join!(
            proof::assemble(
                self.side.client(),
                self.params.side_chain_eccd,
                &proof_slots,
                deposit_block,
                intent.raw_data.clone(),
            ),
            header::package(self.side.client(), deposit_block),
        )?;
        info!(stage = %RelayStage::ProofAssembled, block = deposit_block, "proofs ready");
        info!(stage = %RelayStage::HeaderPackaged, block = deposit_block, "header ready");

        if self.params.relayer {
            info!("external relayer configured, stopping after proof assembly");
            return Ok(RelayReport {
                deposit_hash,
                deposit_block,
                relay_hash: None,
                outcome: RelayOutcome::Delegated,
            });
        }

        tokio::time::sleep(self.settle_wait).await;
        let relay_payload = bridge::verify_payload(&header_bundle, &proof_bundle);
        let relay_hash = self
            .main
            .submit(bridge::CROSS_CHAIN_MANAGER_ADDRESS, U256::zero(), relay_payload)
            .await?;
        self.main
            .wait_for_receipt(relay_hash, self.poll_interval, self.confirm_attempts)
            .await?;
        info!(stage = %RelayStage::Relayed, tx = ?relay_hash, "relay executed");

        tokio::time::sleep(self.settle_wait).await;
        let balance_after = self.main.balance_of(receiver, None).await?;
        let outcome = check_balance_delta(balance_before, balance_after, amount);

        Ok(RelayReport {
            deposit_hash,
            deposit_block,
            relay_hash: Some(relay_hash),
            outcome,
        })
    }
}

/// The post-relay invariant: the receiver gained exactly the transferred
/// amount. Anything else, including a zero delta from a replayed proof the
/// destination rejected, is reported as a mismatch.
fn check_balance_delta(before: U256, after: U256, amount: U256) -> RelayOutcome {
    let actual = after.saturating_sub(before);
    if actual == amount {
        info!(stage = %RelayStage::Verified, transferred = %amount, "balance delta matches");
        RelayOutcome::Verified {
            transferred: amount,
        }
    } else {
        warn!(expected = %amount, actual = %actual, "balance delta mismatch");
        RelayOutcome::Mismatch {
            expected: amount,
            actual,
        }
    }
}
