//! Transaction debugger
//!
//! Fetches a mined transaction with its receipt, then replays the same call
//! read-only against the state just before its block to surface a revert
//! reason.

pub mod revert;

pub use revert::{decode_revert_data, revert_reason};

use crate::chain::{CallFailure, ChainClient};
use crate::error::{AgentError, AgentResult};
use crate::wallet::checksum;

use ethers::types::{
    Address, BlockId, BlockNumber, Bytes, Transaction, TransactionReceipt, TransactionRequest,
    H256, U256, U64,
};
use std::fmt;
use tracing::{debug, info};

/// Fields printed for the inspected transaction
#[derive(Debug, Clone, PartialEq)]
pub struct TxSummary {
    pub tx_hash: H256,
    pub status: Option<u64>,
    pub from: Address,
    pub to: Option<Address>,
    pub gas_used: Option<U256>,
    pub block_number: Option<u64>,
    /// Up to the first 4 bytes of the input
    pub selector: Bytes,
    pub input_len: usize,
}

impl TxSummary {
    pub fn new(tx: &Transaction, receipt: &TransactionReceipt) -> Self {
        let selector_len = tx.input.len().min(4);

        Self {
            tx_hash: tx.hash,
            status: receipt.status.map(|s| s.as_u64()),
            from: tx.from,
            to: tx.to,
            gas_used: receipt.gas_used,
            block_number: receipt.block_number.map(|b| b.as_u64()),
            selector: Bytes::from(tx.input[..selector_len].to_vec()),
            input_len: tx.input.len(),
        }
    }
}

impl fmt::Display for TxSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => writeln!(f, "status: {}", status)?,
            None => writeln!(f, "status: unknown")?,
        }
        writeln!(f, "from: {}", checksum(&self.from))?;
        match &self.to {
            Some(to) => writeln!(f, "to: {}", checksum(to))?,
            None => writeln!(f, "to: None (contract creation)")?,
        }
        match &self.gas_used {
            Some(gas) => writeln!(f, "gasUsed: {}", gas)?,
            None => writeln!(f, "gasUsed: unknown")?,
        }
        write!(
            f,
            "input (selector): {} … len {}",
            self.selector, self.input_len
        )
    }
}

/// Result of replaying the call read-only
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayOutcome {
    /// The call succeeded against pre-block state
    Succeeded(Bytes),
    /// Contract logic reverted; never empty
    Reverted(String),
    /// Any other failure, shown as-is
    Failed(String),
}

impl ReplayOutcome {
    pub fn classify(result: Result<Bytes, CallFailure>) -> Self {
        match result {
            Ok(output) => ReplayOutcome::Succeeded(output),
            Err(CallFailure::Reverted { message, data }) => {
                ReplayOutcome::Reverted(revert_reason(&message, data.as_ref()))
            }
            Err(CallFailure::Other(raw)) => ReplayOutcome::Failed(raw),
        }
    }
}

impl fmt::Display for ReplayOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplayOutcome::Succeeded(_) => {
                write!(f, "eth_call succeeded (on-chain failure likely gas/nonce mismatch).")
            }
            ReplayOutcome::Reverted(reason) => write!(f, "Revert reason: {}", reason),
            ReplayOutcome::Failed(raw) => write!(f, "eth_call error: {}", raw),
        }
    }
}

/// Everything the debugger reports for one transaction
#[derive(Debug, Clone)]
pub struct Diagnosis {
    pub summary: TxSummary,
    pub replay_block: BlockId,
    pub outcome: ReplayOutcome,
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.summary)?;
        write!(f, "{}", self.outcome)
    }
}

/// Block whose post-state the replay runs against: the parent of the mining
/// block, or `latest` when that block is unknown or genesis
pub fn replay_block(mined_in: Option<U64>) -> BlockId {
    match mined_in {
        Some(block) if !block.is_zero() => {
            BlockId::Number(BlockNumber::Number(block - U64::one()))
        }
        _ => BlockId::Number(BlockNumber::Latest),
    }
}

/// Read-only copy of the original call
pub fn replay_request(tx: &Transaction) -> TransactionRequest {
    let request = TransactionRequest::new()
        .from(tx.from)
        .data(tx.input.clone());

    match tx.to {
        Some(to) => request.to(to),
        None => request,
    }
}

pub struct TxDebugger<C> {
    client: C,
}

impl<C: ChainClient> TxDebugger<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Fetch, summarize and replay one transaction
    pub async fn diagnose(&self, tx_hash: H256) -> AgentResult<Diagnosis> {
        let tx = self
            .client
            .get_transaction(tx_hash)
            .await?
            .ok_or_else(|| AgentError::TransactionNotFound {
                tx_hash: format!("{:?}", tx_hash),
            })?;

        let receipt = self
            .client
            .get_transaction_receipt(tx_hash)
            .await?
            .ok_or_else(|| AgentError::ReceiptNotFound {
                tx_hash: format!("{:?}", tx_hash),
            })?;

        let summary = TxSummary::new(&tx, &receipt);
        let block = replay_block(receipt.block_number);
        debug!("Replaying {:?} at {:?}", tx_hash, block);

        let result = self.client.call(replay_request(&tx), block).await;
        let outcome = ReplayOutcome::classify(result);
        info!("Replay of {:?} finished: {:?}", tx_hash, outcome);

        Ok(Diagnosis {
            summary,
            replay_block: block,
            outcome,
        })
    }
}
