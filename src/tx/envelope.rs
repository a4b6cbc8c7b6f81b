//! Transaction envelope and its signed form

use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, Signature, TransactionRequest, H256, U256};

/// Unsigned legacy transaction as built by the sender
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionEnvelope {
    pub to: Address,
    pub value: U256,
    /// Sender's transaction count at build time
    pub nonce: U256,
    pub gas_limit: U256,
    pub gas_price: U256,
    pub chain_id: u64,
    pub data: Bytes,
}

impl TransactionEnvelope {
    /// Legacy (type 0) transaction carrying the chain id for EIP-155
    pub fn to_typed(&self) -> TypedTransaction {
        let tx = TransactionRequest::new()
            .to(self.to)
            .value(self.value)
            .nonce(self.nonce)
            .gas(self.gas_limit)
            .gas_price(self.gas_price)
            .chain_id(self.chain_id)
            .data(self.data.clone());

        TypedTransaction::Legacy(tx)
    }

    /// Worst-case native cost of including the transaction
    pub fn max_cost(&self) -> U256 {
        self.gas_limit
            .saturating_mul(self.gas_price)
            .saturating_add(self.value)
    }
}

/// Envelope plus signature; immutable once produced
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    pub envelope: TransactionEnvelope,
    pub signature: Signature,
    /// RLP encoding broadcast with `eth_sendRawTransaction`
    pub raw: Bytes,
    pub hash: H256,
}
