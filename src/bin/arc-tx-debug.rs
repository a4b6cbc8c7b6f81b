//! Explain the outcome of a mined transaction

use anyhow::Result;
use arc_agent::wallet::strip_hex_prefix;
use arc_agent::{AgentError, ChainProvider, Settings, TxDebugger};
use clap::error::ErrorKind;
use clap::Parser;
use ethers::types::H256;
use std::process;
use tracing::info;

const USAGE: &str = "Usage: arc-tx-debug <tx_hash>";

/// Replay a mined transaction read-only to surface its revert reason
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Transaction hash, with or without the 0x prefix
    #[arg(value_parser = parse_tx_hash)]
    tx_hash: H256,

    /// RPC endpoint, overrides ARC_RPC
    #[arg(long)]
    rpc_url: Option<String>,
}

fn parse_tx_hash(value: &str) -> Result<H256, AgentError> {
    let digits = strip_hex_prefix(value);
    let invalid = |message: String| AgentError::InvalidTxHash {
        value: value.to_string(),
        message,
    };

    let bytes = hex::decode(digits).map_err(|e| invalid(e.to_string()))?;
    if bytes.len() != H256::len_bytes() {
        return Err(invalid(format!("expected 32 bytes, got {}", bytes.len())));
    }
    Ok(H256::from_slice(&bytes))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if e.kind() == ErrorKind::MissingRequiredArgument => {
            println!("{}", USAGE);
            process::exit(1);
        }
        Err(e) if e.use_stderr() => {
            eprintln!("{}", e);
            println!("{}", USAGE);
            process::exit(1);
        }
        Err(e) => e.exit(),
    };

    arc_agent::init_logging();

    let settings = Settings::load()?;
    let rpc_url = args.rpc_url.unwrap_or_else(|| settings.rpc.url.clone());

    let provider = ChainProvider::new(&rpc_url, settings.poll_interval())?;
    info!("Inspecting {:?} via {}", args.tx_hash, provider.url());

    let diagnosis = TxDebugger::new(provider).diagnose(args.tx_hash).await?;

    println!("{}", diagnosis);
    Ok(())
}
