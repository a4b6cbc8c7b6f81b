//! Waiting for a broadcast transaction to be mined

use crate::chain::ChainClient;
use crate::error::{AgentError, AgentResult};

use ethers::types::{TransactionReceipt, H256};
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::debug;

/// Polls `eth_getTransactionReceipt` until the node returns a receipt
#[derive(Debug, Clone)]
pub struct ReceiptWaiter {
    poll_interval: Duration,
    /// `None` keeps polling for as long as it takes
    timeout: Option<Duration>,
}

impl ReceiptWaiter {
    pub fn new(poll_interval: Duration, timeout: Option<Duration>) -> Self {
        Self {
            poll_interval,
            timeout,
        }
    }

    pub async fn wait<C>(&self, client: &C, tx_hash: H256) -> AgentResult<TransactionReceipt>
    where
        C: ChainClient + ?Sized,
    {
        match self.timeout {
            Some(limit) => timeout(limit, self.poll(client, tx_hash))
                .await
                .map_err(|_| AgentError::Timeout {
                    operation: format!("receipt of {:?}", tx_hash),
                })?,
            None => self.poll(client, tx_hash).await,
        }
    }

    async fn poll<C>(&self, client: &C, tx_hash: H256) -> AgentResult<TransactionReceipt>
    where
        C: ChainClient + ?Sized,
    {
        let mut attempts: u64 = 0;
        loop {
            attempts += 1;
            if let Some(receipt) = client.get_transaction_receipt(tx_hash).await? {
                debug!("Receipt for {:?} after {} polls", tx_hash, attempts);
                return Ok(receipt);
            }
            sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MockChainClient;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn receipt() -> TransactionReceipt {
        TransactionReceipt {
            status: Some(1u64.into()),
            block_number: Some(12u64.into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_polls_until_mined() {
        let polls = Arc::new(AtomicUsize::new(0));
        let counter = polls.clone();

        let mut client = MockChainClient::new();
        client
            .expect_get_transaction_receipt()
            .returning(move |_| {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Ok(None)
                } else {
                    Ok(Some(receipt()))
                }
            });

        let waiter = ReceiptWaiter::new(Duration::from_millis(1), None);
        let got = waiter.wait(&client, H256::repeat_byte(0xab)).await.unwrap();

        assert_eq!(got.block_number, Some(12u64.into()));
        assert_eq!(polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_timeout_when_never_mined() {
        let mut client = MockChainClient::new();
        client
            .expect_get_transaction_receipt()
            .returning(|_| Ok(None));

        let waiter = ReceiptWaiter::new(Duration::from_millis(5), Some(Duration::from_millis(30)));
        let err = waiter.wait(&client, H256::zero()).await.unwrap_err();

        assert!(matches!(err, AgentError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_rpc_error_stops_waiting() {
        let mut client = MockChainClient::new();
        client
            .expect_get_transaction_receipt()
            .times(1)
            .returning(|_| Err(AgentError::rpc("eth_getTransactionReceipt", "boom")));

        let waiter = ReceiptWaiter::new(Duration::from_millis(1), None);
        let err = waiter.wait(&client, H256::zero()).await.unwrap_err();

        assert!(matches!(err, AgentError::Rpc { .. }));
    }
}
