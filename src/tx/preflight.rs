//! Read-only account check run before a send
//!
//! Reports what the sender would see on the chain right now: chain id,
//! sending address, native balance and the node's suggested gas price.
//! Nothing is signed or broadcast.

use crate::chain::ChainClient;
use crate::error::AgentResult;
use crate::wallet::checksum;

use ethers::types::{Address, U256};
use std::fmt;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct PreflightReport {
    pub block: u64,
    pub chain_id: u64,
    pub sender: Address,
    pub balance: U256,
    /// `None` when the node would not quote a price
    pub gas_price: Option<U256>,
}

impl fmt::Display for PreflightReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Latest block: {}", self.block)?;
        writeln!(f, "Chain ID: {}", self.chain_id)?;
        writeln!(f, "Sender: {}", checksum(&self.sender))?;
        writeln!(f, "Native balance (wei): {}", self.balance)?;
        match self.gas_price {
            Some(price) => write!(f, "Suggested gasPrice (wei): {}", price),
            None => write!(f, "Suggested gasPrice (wei): N/A"),
        }
    }
}

/// Probe the endpoint, then read chain id, balance and gas price for `sender`
pub async fn run_preflight<C: ChainClient>(
    client: &C,
    sender: Address,
) -> AgentResult<PreflightReport> {
    let block = client.probe().await?;
    debug!("Endpoint live at block {}", block);

    let chain_id = client.get_chain_id().await?;
    let balance = client.get_balance(sender).await?;

    let gas_price = match client.get_gas_price().await {
        Ok(price) => Some(price),
        Err(e) => {
            warn!("No gas price quote: {}", e);
            None
        }
    };

    Ok(PreflightReport {
        block,
        chain_id,
        sender,
        balance,
        gas_price,
    })
}
