//! Arc agent tools - send one transaction, or explain why one failed
//!
//! `arc-send` signs and broadcasts a single transaction to the configured
//! escrow address and waits for its receipt. `arc-tx-debug` fetches a mined
//! transaction and replays it read-only against the parent block to surface
//! the revert reason. `arc-send --check` only reports the signer's account
//! state.

pub mod chain;
pub mod config;
pub mod debugger;
pub mod error;
pub mod tx;
pub mod wallet;

pub use chain::{CallFailure, ChainClient, ChainProvider};
pub use config::{signing_key_from_env, SenderCredentials, Settings};
pub use debugger::{Diagnosis, ReplayOutcome, TxDebugger, TxSummary};
pub use error::{AgentError, AgentResult};
pub use tx::{run_preflight, PreflightReport, SendOptions, SendReport, TransactionSender};
pub use wallet::KeyMaterial;

/// Install the stderr log subscriber; stdout is reserved for the report
pub fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,arc_agent=debug,hyper=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();
}
