//! Accounts and the transaction lifecycle.
//!
//! An `Account` composes a chain session (`ChainClient`) with its own key
//! material and a private nonce counter. Construction takes a read snapshot
//! of the nonce; a successful submission increments it under exclusive lock;
//! a failed submission must not. Accounts never share state, so there is no
//! cross-account locking.

use ethereum_types::{H160, H256, U256};
use k256::ecdsa::SigningKey;
use rand::rngs::OsRng;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{RelayError, Result};
use crate::hexutil;
use crate::rpc::{ChainClient, Receipt};
use crate::tx::{address_of, SignedTransaction, UnsignedTransaction};

/// Parses a hex private key, with or without a 0x prefix.
pub fn parse_private_key(data: &str) -> anyhow::Result<SigningKey> {
    let bytes = hexutil::decode(data)?;
    SigningKey::from_slice(&bytes).map_err(|e| anyhow::anyhow!("private key invalid: {}", e))
}

/// An identity on one chain: keypair, derived address, nonce counter and a
/// bound chain session.
pub struct Account {
    key: SigningKey,
    address: H160,
    client: Arc<ChainClient>,
    nonce: RwLock<u64>,
}

impl Account {
    /// Binds an existing key to a chain session, syncing the nonce counter
    /// to the chain's view.
    pub async fn new(client: Arc<ChainClient>, key: SigningKey) -> Result<Self> {
        let address = address_of(&key);
        let nonce = client.transaction_count(address).await?;
        Ok(Self {
            key,
            address,
            client,
            nonce: RwLock::new(nonce),
        })
    }

    /// Binds a freshly generated throwaway key to a chain session.
    pub async fn generate(client: Arc<ChainClient>) -> Result<Self> {
        Self::new(client, SigningKey::random(&mut OsRng)).await
    }

    pub fn address(&self) -> H160 {
        self.address
    }

    pub fn client(&self) -> &ChainClient {
        &self.client
    }

    /// Current nonce snapshot.
    pub fn nonce(&self) -> u64 {
        *self.nonce.read().expect("nonce lock poisoned")
    }

    /// Own native balance at a height, or latest.
    pub async fn balance(&self, block: Option<u64>) -> Result<U256> {
        self.client.balance_of(self.address, block).await
    }

    /// Native balance of any address at a height, or latest.
    pub async fn balance_of(&self, addr: H160, block: Option<u64>) -> Result<U256> {
        self.client.balance_of(addr, block).await
    }

    /// Builds and signs a transaction at the current nonce snapshot.
    ///
    /// If the chain has seen more transactions from this address than the
    /// local counter (e.g. after an operator submission out of band), the
    /// counter catches up before the snapshot is taken.
    async fn build_signed(
        &self,
        to: H160,
        value: U256,
        data: Vec<u8>,
    ) -> Result<(UnsignedTransaction, SignedTransaction)> {
        let chain_nonce = self.client.transaction_count(self.address).await?;
        let nonce = {
            let mut local = self.nonce.write().expect("nonce lock poisoned");
            if *local < chain_nonce {
                debug!(local = *local, chain = chain_nonce, "nonce counter behind chain");
                *local = chain_nonce;
            }
            *local
        };

        let gas_price = self.client.gas_price().await?;
        let gas_limit = self
            .client
            .estimate_gas(self.address, to, value, &data)
            .await?;

        let unsigned = UnsignedTransaction {
            nonce,
            gas_price,
            gas_limit,
            to,
            value,
            data,
        };
        let signed = unsigned.sign(&self.key, self.client.chain_id())?;
        Ok((unsigned, signed))
    }

    /// Signs and submits a transaction, returning its hash. The nonce
    /// counter advances only when the chain accepted the submission; a
    /// failed submit is fatal to the calling operation and is not retried.
    pub async fn submit(&self, to: H160, value: U256, data: Vec<u8>) -> Result<H256> {
        let (unsigned, signed) = self.build_signed(to, value, data).await?;
        let hash = self.client.send_raw_transaction(&signed.raw).await?;
        {
            let mut local = self.nonce.write().expect("nonce lock poisoned");
            *local = unsigned.nonce + 1;
        }
        debug!(tx = ?hash, nonce = unsigned.nonce, "transaction submitted");
        Ok(hash)
    }

    /// Polls until the transaction is no longer pending, then fetches its
    /// receipt. A mined-but-failed transaction surfaces as
    /// `ExecutionReverted`; the caller decides whether to abort. With
    /// `max_attempts = None` polling continues until the transaction lands,
    /// since finality time is chain-dependent.
    pub async fn wait_for_receipt(
        &self,
        hash: H256,
        poll_interval: Duration,
        max_attempts: Option<u32>,
    ) -> Result<Receipt> {
        let mut attempts = 0u32;
        loop {
            if let Some(limit) = max_attempts {
                if attempts >= limit {
                    return Err(RelayError::Timeout {
                        hash,
                        attempts: limit,
                    });
                }
            }
            attempts += 1;
            tokio::time::sleep(poll_interval).await;

            if self.client.transaction_is_pending(hash).await? {
                continue;
            }
            match self.client.receipt(hash).await? {
                Some(receipt) if !receipt.succeeded() => {
                    return Err(RelayError::ExecutionReverted(hash));
                }
                Some(receipt) => {
                    self.dump_event_log(&receipt);
                    return Ok(receipt);
                }
                None => continue,
            }
        }
    }

    /// Simple value transfer, confirmed before returning.
    pub async fn transfer(&self, to: H160, amount: U256) -> Result<H256> {
        let hash = self.submit(to, amount, Vec::new()).await?;
        self.wait_for_receipt(hash, Duration::from_secs(1), None)
            .await?;
        Ok(hash)
    }

    /// Contract invocation with attached value, confirmed before returning.
    pub async fn send_contract_tx(
        &self,
        contract: H160,
        value: U256,
        payload: Vec<u8>,
    ) -> Result<(H256, Receipt)> {
        let hash = self.submit(contract, value, payload).await?;
        let receipt = self
            .wait_for_receipt(hash, Duration::from_secs(1), None)
            .await?;
        Ok((hash, receipt))
    }

    fn dump_event_log(&self, receipt: &Receipt) {
        info!(
            tx = ?receipt.transaction_hash,
            block = receipt.block(),
            "transaction confirmed"
        );
        for log in &receipt.logs {
            debug!(
                contract = ?log.address,
                data = %hexutil::encode(&log.data),
                topics = log.topics.len(),
                "event log"
            );
        }
    }
}
