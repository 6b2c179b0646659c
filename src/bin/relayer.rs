//! Relay pipeline CLI.
//!
//! One subcommand per operation, each driven by the shared JSON config and
//! a small typed JSON parameter file:
//!
//! ```bash
//! cargo run --bin relayer -- --config config.json deposit --params cases/cross_chain.json
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use relayer::account::parse_private_key;
use relayer::config::{load_json, scale_amount};
use relayer::orchestrator::RelayOutcome;
use relayer::{
    Account, ChainClient, Config, CrossChainOrchestrator, CrossChainParams, ProofNoteParams,
    TransferParams,
};

#[derive(Parser, Debug)]
#[command(name = "relayer")]
#[command(about = "Cross-chain transfer verification and relay pipeline")]
struct Cli {
    /// Path to the JSON chain configuration
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Raw balance transfer with a before/after balance check
    Transfer {
        #[arg(long, default_value = "cases/transfer.json")]
        params: PathBuf,
    },
    /// Deposit on the main chain, relay and verify on the side chain
    Deposit {
        #[arg(long, default_value = "cases/cross_chain.json")]
        params: PathBuf,
    },
    /// Burn on the side chain, relay and verify on the main chain
    Withdraw {
        #[arg(long, default_value = "cases/cross_chain.json")]
        params: PathBuf,
    },
    /// Write (key, value) pairs into the proof-note contract
    SetProof {
        #[arg(long, default_value = "cases/proof_note.json")]
        params: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    match cli.command {
        Command::Transfer { params } => transfer(&config, &params).await,
        Command::Deposit { params } => cross_chain(&config, &params, true).await,
        Command::Withdraw { params } => cross_chain(&config, &params, false).await,
        Command::SetProof { params } => set_proof(&config, &params).await,
    }
}

/// Master account bound to the first configured node.
async fn master_account(config: &Config) -> Result<Account> {
    let node = config.master_node();
    let client = Arc::new(ChainClient::new(&node.url, config.chain_id)?);
    let key = parse_private_key(&node.node_key)?;
    Account::new(client, key)
        .await
        .context("failed to bind master account")
}

async fn transfer(config: &Config, params: &PathBuf) -> Result<()> {
    let params: TransferParams = load_json(params)?;
    let master = master_account(config).await?;
    let amount = scale_amount(params.amount);

    let before = master.balance_of(params.to, None).await?;
    info!(to = ?params.to, balance = %before, "balance before transfer");

    let hash = master.transfer(params.to, amount).await?;
    info!(tx = ?hash, %amount, "transfer confirmed");

    tokio::time::sleep(config.block_waiting_time()).await;
    let after = master.balance_of(params.to, None).await?;
    info!(to = ?params.to, balance = %after, "balance after transfer");

    if after != before + amount {
        anyhow::bail!("balance delta does not match: before {}, after {}", before, after);
    }
    Ok(())
}

async fn cross_chain(config: &Config, params: &PathBuf, deposit: bool) -> Result<()> {
    let params: CrossChainParams = load_json(params)?;

    let main = master_account(config).await?;
    let side_client = Arc::new(ChainClient::new(
        &params.side_chain_url,
        params.side_chain_id,
    )?);
    let side = if params.node_key.is_empty() {
        Account::generate(side_client).await?
    } else {
        Account::new(side_client, parse_private_key(&params.node_key)?).await?
    };

    let orchestrator =
        CrossChainOrchestrator::new(main, side, params, config.block_waiting_time());
    let report = if deposit {
        orchestrator.run_deposit().await?
    } else {
        orchestrator.run_withdraw().await?
    };

    info!(
        deposit = ?report.deposit_hash,
        block = report.deposit_block,
        relay = ?report.relay_hash,
        "relay finished"
    );
    match report.outcome {
        RelayOutcome::Verified { transferred } => {
            info!(%transferred, "transfer verified");
            Ok(())
        }
        RelayOutcome::Delegated => {
            info!("proof material handed to external relayer");
            Ok(())
        }
        RelayOutcome::Mismatch { expected, actual } => {
            Err(relayer::RelayError::VerificationMismatch { expected, actual }.into())
        }
    }
}

async fn set_proof(config: &Config, params: &PathBuf) -> Result<()> {
    let params: ProofNoteParams = load_json(params)?;
    let master = master_account(config).await?;

    for index in 0..params.repeat {
        let (hash, _) = master.set_proof_note(&params.key, &params.value).await?;
        info!(index, tx = ?hash, key = %params.key, "proof note set");
    }
    Ok(())
}
