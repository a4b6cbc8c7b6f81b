//! Error types for the Arc agent tools

use thiserror::Error;

/// Main error type for the sender and debugger
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Invalid address {value:?}: {message}")]
    InvalidAddress { value: String, message: String },

    #[error("Invalid transaction hash {value:?}: {message}")]
    InvalidTxHash { value: String, message: String },

    #[error("RPC endpoint {url} is not reachable: {message}")]
    ChainConnection { url: String, message: String },

    #[error("RPC call {method} failed: {message}")]
    Rpc {
        method: &'static str,
        message: String,
    },

    #[error("Timeout waiting for {operation}")]
    Timeout { operation: String },

    #[error("Transaction {tx_hash} not found")]
    TransactionNotFound { tx_hash: String },

    #[error("Receipt for transaction {tx_hash} not found (not mined yet?)")]
    ReceiptNotFound { tx_hash: String },
}

impl AgentError {
    /// Shorthand for wrapping a provider error raised by a JSON-RPC method
    pub fn rpc(method: &'static str, err: impl std::fmt::Display) -> Self {
        AgentError::Rpc {
            method,
            message: err.to_string(),
        }
    }

    /// Check if error was raised before any network call was made
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            AgentError::Config(_)
                | AgentError::Wallet(_)
                | AgentError::InvalidAddress { .. }
                | AgentError::InvalidTxHash { .. }
        )
    }
}

/// Result type for agent operations
pub type AgentResult<T> = Result<T, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors_are_classified() {
        assert!(AgentError::Config("missing".into()).is_configuration());
        assert!(AgentError::InvalidAddress {
            value: "0x12".into(),
            message: "too short".into(),
        }
        .is_configuration());
        assert!(!AgentError::rpc("eth_chainId", "boom").is_configuration());
        assert!(!AgentError::Timeout {
            operation: "receipt".into()
        }
        .is_configuration());
    }

    #[test]
    fn test_rpc_error_message() {
        let err = AgentError::rpc("eth_gasPrice", "connection refused");
        assert_eq!(
            err.to_string(),
            "RPC call eth_gasPrice failed: connection refused"
        );
    }
}
