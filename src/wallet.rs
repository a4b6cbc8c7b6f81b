//! Key material and address helpers
//!
//! The private key is parsed once into a [`LocalWallet`] and never leaves the
//! process: only signatures and the derived address are exposed.

use crate::error::{AgentError, AgentResult};
use crate::tx::{SignedTransaction, TransactionEnvelope};

use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, H256};
use ethers::utils::{keccak256, to_checksum};
use std::fmt;

/// Private key loaded for the lifetime of one process
pub struct KeyMaterial {
    wallet: LocalWallet,
}

impl KeyMaterial {
    /// Parse a hex private key, with or without `0x`
    pub fn from_hex(key: &str) -> AgentResult<Self> {
        let digits = strip_hex_prefix(key);

        let bytes = hex::decode(digits)
            .map_err(|e| AgentError::Wallet(format!("Invalid private key: {}", e)))?;
        if bytes.len() != 32 {
            return Err(AgentError::Wallet(format!(
                "Invalid private key: expected 32 bytes, got {}",
                bytes.len()
            )));
        }

        let wallet = LocalWallet::from_bytes(&bytes)
            .map_err(|e| AgentError::Wallet(format!("Invalid private key: {}", e)))?;

        Ok(Self { wallet })
    }

    /// Sending address derived from the key
    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    /// Sign an envelope locally for its chain id
    pub async fn sign(&self, envelope: TransactionEnvelope) -> AgentResult<SignedTransaction> {
        let tx = envelope.to_typed();
        let wallet = self.wallet.clone().with_chain_id(envelope.chain_id);

        let signature = wallet
            .sign_transaction(&tx)
            .await
            .map_err(|e| AgentError::Wallet(format!("Failed to sign transaction: {}", e)))?;

        let raw = tx.rlp_signed(&signature);
        let hash = H256::from(keccak256(&raw));

        Ok(SignedTransaction {
            envelope,
            signature,
            raw,
            hash,
        })
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

/// Parse a 20-byte hex address, with or without `0x`
///
/// Mixed-case input is normalized rather than checked against its checksum.
pub fn parse_address(value: &str) -> AgentResult<Address> {
    let digits = strip_hex_prefix(value);

    let bytes = hex::decode(digits).map_err(|e| AgentError::InvalidAddress {
        value: value.to_string(),
        message: e.to_string(),
    })?;

    if bytes.len() != Address::len_bytes() {
        return Err(AgentError::InvalidAddress {
            value: value.to_string(),
            message: format!("expected 20 bytes, got {}", bytes.len()),
        });
    }

    Ok(Address::from_slice(&bytes))
}

/// Trim whitespace and drop a leading `0x` or `0X`
pub fn strip_hex_prefix(value: &str) -> &str {
    let trimmed = value.trim();
    trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed)
}

/// EIP-55 checksummed form of an address
pub fn checksum(address: &Address) -> String {
    to_checksum(address, None)
}
