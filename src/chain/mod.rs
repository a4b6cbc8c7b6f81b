//! Chain module - the JSON-RPC operations both tools rely on
//!
//! [`ChainClient`] is the seam between the orchestration logic and the
//! network; [`ChainProvider`] implements it over an ethers HTTP provider.

pub mod provider;

pub use provider::ChainProvider;

use crate::error::AgentResult;

use async_trait::async_trait;
use ethers::types::{
    Address, BlockId, Bytes, Transaction, TransactionReceipt, TransactionRequest, H256, U256,
};
use std::fmt;

/// JSON-RPC calls issued by the sender and the debugger
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Liveness probe, returns the latest block number
    async fn probe(&self) -> AgentResult<u64>;

    async fn get_transaction_count(&self, address: Address) -> AgentResult<U256>;

    async fn get_gas_price(&self) -> AgentResult<U256>;

    async fn get_chain_id(&self) -> AgentResult<u64>;

    async fn get_balance(&self, address: Address) -> AgentResult<U256>;

    /// Broadcast signed RLP bytes, returns the hash reported by the node
    async fn send_raw_transaction(&self, raw: Bytes) -> AgentResult<H256>;

    async fn get_transaction(&self, tx_hash: H256) -> AgentResult<Option<Transaction>>;

    async fn get_transaction_receipt(
        &self,
        tx_hash: H256,
    ) -> AgentResult<Option<TransactionReceipt>>;

    /// Read-only `eth_call` against the state at `block`
    async fn call(
        &self,
        request: TransactionRequest,
        block: BlockId,
    ) -> Result<Bytes, CallFailure>;
}

/// Why a read-only call did not return data
#[derive(Debug, Clone, PartialEq)]
pub enum CallFailure {
    /// The node reported a contract-logic revert
    Reverted {
        message: String,
        data: Option<Bytes>,
    },
    /// Transport, client or any other non-revert failure
    Other(String),
}

impl fmt::Display for CallFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallFailure::Reverted { message, data } => match data {
                Some(data) => write!(f, "{} (data: {})", message, data),
                None => write!(f, "{}", message),
            },
            CallFailure::Other(raw) => write!(f, "{}", raw),
        }
    }
}
