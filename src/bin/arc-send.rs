//! Sign and broadcast one transaction to `ESCROW_ADDRESS`

use anyhow::Result;
use arc_agent::wallet::checksum;
use arc_agent::{
    run_preflight, signing_key_from_env, AgentResult, ChainProvider, SendOptions,
    SenderCredentials, Settings, TransactionSender,
};
use clap::Parser;
use std::process;
use tracing::info;

/// Exit status for a configuration error caught before any RPC call
const CONFIG_EXIT_CODE: i32 = 2;

/// Send a single transaction configured through the environment
///
/// Reads ARC_RPC, AGENT_PRIVATE_KEY and ESCROW_ADDRESS, plus an optional
/// TOML file named by ARC_AGENT_CONFIG.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Only report chain id, signer, balance and gas price; send nothing
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    arc_agent::init_logging();

    info!("Starting arc-send v{}", env!("CARGO_PKG_VERSION"));

    match run(&args).await {
        Err(e) if e.is_configuration() => {
            eprintln!("Error: {}", e);
            process::exit(CONFIG_EXIT_CODE);
        }
        result => Ok(result?),
    }
}

async fn run(args: &Args) -> AgentResult<()> {
    // Every configuration error surfaces before the first RPC call
    let settings = Settings::load()?;

    if args.check {
        let key = signing_key_from_env()?;
        let provider = ChainProvider::new(&settings.rpc.url, settings.poll_interval())?;
        info!("Checking {} via {}", checksum(&key.address()), provider.url());

        let report = run_preflight(&provider, key.address()).await?;
        println!("{}", report);
        return Ok(());
    }

    let credentials = SenderCredentials::from_env()?;
    let options = SendOptions::from_settings(&settings)?;

    // The sender probes the endpoint itself before its first read
    let provider = ChainProvider::new(&settings.rpc.url, settings.poll_interval())?;
    info!("Using endpoint {}", provider.url());

    let sender = TransactionSender::new(
        provider,
        credentials.key,
        credentials.destination,
        options,
    );
    let report = sender.send().await?;

    println!("{}", report);
    Ok(())
}
