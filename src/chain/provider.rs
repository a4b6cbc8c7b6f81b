//! HTTP chain provider for a single Arc endpoint

use super::{CallFailure, ChainClient};
use crate::error::{AgentError, AgentResult};

use async_trait::async_trait;
use ethers::prelude::*;
use ethers::providers::{Http, JsonRpcError, Provider, ProviderError, RpcError};
use ethers::types::transaction::eip2718::TypedTransaction;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Connection to one JSON-RPC endpoint, constructed once per process
pub struct ChainProvider {
    url: String,
    http: Provider<Http>,
}

impl ChainProvider {
    /// Create a provider; no request is made until the first call
    pub fn new(url: &str, poll_interval: Duration) -> AgentResult<Self> {
        let http = Provider::<Http>::try_from(url)
            .map_err(|e| AgentError::Config(format!("Invalid RPC URL {:?}: {}", url, e)))?
            .interval(poll_interval);

        debug!("Created HTTP provider for {}", url);

        Ok(Self {
            url: url.to_string(),
            http,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ChainClient for ChainProvider {
    async fn probe(&self) -> AgentResult<u64> {
        let block = self
            .http
            .get_block_number()
            .await
            .map_err(|e| AgentError::ChainConnection {
                url: self.url.clone(),
                message: e.to_string(),
            })?;

        debug!("Endpoint {} is live at block {}", self.url, block);
        Ok(block.as_u64())
    }

    async fn get_transaction_count(&self, address: Address) -> AgentResult<U256> {
        self.http
            .get_transaction_count(address, None)
            .await
            .map_err(|e| AgentError::rpc("eth_getTransactionCount", e))
    }

    async fn get_gas_price(&self) -> AgentResult<U256> {
        self.http
            .get_gas_price()
            .await
            .map_err(|e| AgentError::rpc("eth_gasPrice", e))
    }

    async fn get_chain_id(&self) -> AgentResult<u64> {
        let chain_id = self
            .http
            .get_chainid()
            .await
            .map_err(|e| AgentError::rpc("eth_chainId", e))?;

        if chain_id > U256::from(u64::MAX) {
            return Err(AgentError::rpc(
                "eth_chainId",
                format!("chain id {} does not fit in 64 bits", chain_id),
            ));
        }
        Ok(chain_id.as_u64())
    }

    async fn get_balance(&self, address: Address) -> AgentResult<U256> {
        self.http
            .get_balance(address, None)
            .await
            .map_err(|e| AgentError::rpc("eth_getBalance", e))
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> AgentResult<H256> {
        let pending = self
            .http
            .send_raw_transaction(raw)
            .await
            .map_err(|e| AgentError::rpc("eth_sendRawTransaction", e))?;

        Ok(pending.tx_hash())
    }

    async fn get_transaction(&self, tx_hash: H256) -> AgentResult<Option<Transaction>> {
        self.http
            .get_transaction(tx_hash)
            .await
            .map_err(|e| AgentError::rpc("eth_getTransactionByHash", e))
    }

    async fn get_transaction_receipt(
        &self,
        tx_hash: H256,
    ) -> AgentResult<Option<TransactionReceipt>> {
        self.http
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| AgentError::rpc("eth_getTransactionReceipt", e))
    }

    async fn call(
        &self,
        request: TransactionRequest,
        block: BlockId,
    ) -> Result<Bytes, CallFailure> {
        let tx: TypedTransaction = request.into();
        self.http
            .call(&tx, Some(block))
            .await
            .map_err(classify_call_error)
    }
}

/// Split provider errors into contract reverts and everything else
fn classify_call_error(err: ProviderError) -> CallFailure {
    if let Some(failure) = RpcError::as_error_response(&err).and_then(classify_error_response) {
        return failure;
    }

    warn!("eth_call failed without a revert payload: {}", err);
    CallFailure::Other(format!("{:?}", err))
}

fn classify_error_response(response: &JsonRpcError) -> Option<CallFailure> {
    let data = response.data.as_ref().and_then(revert_data);
    let mentions_revert = response.message.to_ascii_lowercase().contains("revert");

    if data.is_none() && !mentions_revert {
        return None;
    }

    Some(CallFailure::Reverted {
        message: response.message.clone(),
        data,
    })
}

/// Revert payload from the `data` member of an error response
///
/// Nodes either put the hex string there directly or nest it one level
/// deeper as `{"data": "0x..."}`.
fn revert_data(value: &Value) -> Option<Bytes> {
    match value {
        Value::String(s) => {
            let digits = s.strip_prefix("0x")?;
            let bytes = hex::decode(digits).ok()?;
            (!bytes.is_empty()).then(|| Bytes::from(bytes))
        }
        Value::Object(map) => map.get("data").and_then(revert_data),
        _ => None,
    }
}
