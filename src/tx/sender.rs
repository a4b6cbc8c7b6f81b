//! Single-shot transaction sender
//!
//! One run builds, signs and broadcasts exactly one transaction. Nonce, gas
//! price and chain id are read fresh from the node every time; a nonce
//! conflict is reported, never retried.

use super::envelope::{SignedTransaction, TransactionEnvelope};
use super::receipt::ReceiptWaiter;
use crate::chain::ChainClient;
use crate::config::Settings;
use crate::error::AgentResult;
use crate::wallet::{checksum, KeyMaterial};

use ethers::types::{Address, Bytes, TransactionReceipt, H256, U256};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// What the sender puts into every envelope besides the live chain values
#[derive(Debug, Clone)]
pub struct SendOptions {
    pub gas_limit: U256,
    pub value: U256,
    pub data: Bytes,
    pub poll_interval: Duration,
    pub receipt_timeout: Option<Duration>,
}

impl SendOptions {
    pub fn from_settings(settings: &Settings) -> AgentResult<Self> {
        Ok(Self {
            gas_limit: U256::from(settings.sender.gas_limit),
            value: settings.value()?,
            data: settings.call_data()?,
            poll_interval: settings.poll_interval(),
            receipt_timeout: settings.receipt_timeout(),
        })
    }
}

/// Outcome of one send
#[derive(Debug, Clone)]
pub struct SendReport {
    pub tx_hash: H256,
    pub envelope: TransactionEnvelope,
    pub receipt: TransactionReceipt,
}

impl SendReport {
    /// Receipt status: 1 for success, 0 for a revert
    pub fn status(&self) -> Option<u64> {
        self.receipt.status.map(|s| s.as_u64())
    }

    pub fn succeeded(&self) -> bool {
        self.status() == Some(1)
    }
}

impl fmt::Display for SendReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status() {
            Some(status) => write!(f, "tx: {:?} status: {}", self.tx_hash, status),
            None => write!(f, "tx: {:?} status: unknown", self.tx_hash),
        }
    }
}

/// Transaction sender bound to one client, one key and one destination
pub struct TransactionSender<C> {
    client: C,
    key: KeyMaterial,
    destination: Address,
    options: SendOptions,
}

impl<C: ChainClient> TransactionSender<C> {
    pub fn new(client: C, key: KeyMaterial, destination: Address, options: SendOptions) -> Self {
        info!(
            "Transaction sender initialized with wallet: {}",
            checksum(&key.address())
        );

        Self {
            client,
            key,
            destination,
            options,
        }
    }

    /// Probe, build, sign, broadcast and wait for the receipt
    pub async fn send(&self) -> AgentResult<SendReport> {
        let block = self.client.probe().await?;
        debug!("Endpoint live at block {}", block);

        let sender = self.key.address();

        let nonce = self.client.get_transaction_count(sender).await?;
        let gas_price = self.client.get_gas_price().await?;
        let chain_id = self.client.get_chain_id().await?;
        info!(
            "Chain {}: nonce {} gas price {} wei",
            chain_id, nonce, gas_price
        );

        let envelope = TransactionEnvelope {
            to: self.destination,
            value: self.options.value,
            nonce,
            gas_limit: self.options.gas_limit,
            gas_price,
            chain_id,
            data: self.options.data.clone(),
        };

        self.check_balance(sender, &envelope).await;

        let signed = self.key.sign(envelope).await?;
        let tx_hash = self.broadcast(&signed).await?;

        let waiter = ReceiptWaiter::new(self.options.poll_interval, self.options.receipt_timeout);
        let receipt = waiter.wait(&self.client, tx_hash).await?;

        let report = SendReport {
            tx_hash,
            envelope: signed.envelope,
            receipt,
        };

        if report.succeeded() {
            info!("Transaction {:?} mined", tx_hash);
        } else {
            warn!("Transaction {:?} did not succeed on chain", tx_hash);
        }

        Ok(report)
    }

    /// Advisory only: an underfunded sender still attempts the send
    async fn check_balance(&self, sender: Address, envelope: &TransactionEnvelope) {
        match self.client.get_balance(sender).await {
            Ok(balance) if balance < envelope.max_cost() => warn!(
                "Balance {} wei of {} may not cover up to {} wei",
                balance,
                checksum(&sender),
                envelope.max_cost()
            ),
            Ok(balance) => debug!("Balance of {}: {} wei", checksum(&sender), balance),
            Err(e) => warn!("Could not read balance of {}: {}", checksum(&sender), e),
        }
    }

    async fn broadcast(&self, signed: &SignedTransaction) -> AgentResult<H256> {
        let tx_hash = self.client.send_raw_transaction(signed.raw.clone()).await?;

        if tx_hash != signed.hash {
            warn!(
                "Node reported hash {:?}, locally computed {:?}",
                tx_hash, signed.hash
            );
        }

        info!(
            "Transaction sent: {:?} (nonce {})",
            tx_hash, signed.envelope.nonce
        );
        Ok(tx_hash)
    }
}
