// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Quorum CLI
//!
//! Entry point for the `quorum` binary. Parses CLI arguments, initializes
//! logging, opens the local devnet, runs one vault operation, and prints the
//! result as JSON on stdout.
//!
//! - `keygen`: generate a keypair
//! - `airdrop`: devnet faucet
//! - `balance`: account balance
//! - `init-vault`: create the caller's vault
//! - `deposit`: fund a vault
//! - `propose`: open a proposal
//! - `approve`: approve a proposal
//! - `execute`: pay out an approved proposal
//! - `show-vault`: vault, custody balance, and proposals
//! - `show-proposal`: one proposal

mod cli;
mod devnet;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::{json, Value};

use quorum_protocol::Keypair;

use cli::{Commands, QuorumCli};
use devnet::Devnet;
use logging::LogFormat;

fn main() -> Result<()> {
    let cli = QuorumCli::parse();
    logging::init_logging(
        "quorum_cli=info,quorum_contracts=info,quorum_protocol=warn",
        LogFormat::from_str_lossy(&cli.log_format),
    );

    let output = run(cli)?;
    println!(
        "{}",
        serde_json::to_string_pretty(&output).context("failed to render output")?
    );
    Ok(())
}

fn run(cli: QuorumCli) -> Result<Value> {
    if let Commands::Keygen = cli.command {
        return Ok(keygen());
    }

    tracing::debug!(data_dir = %cli.data_dir.display(), "opening devnet");
    let devnet = Devnet::open(&cli.data_dir)?;

    match cli.command {
        Commands::Keygen => Ok(keygen()),
        Commands::Airdrop(args) => devnet.airdrop(&args),
        Commands::Balance(args) => devnet.balance(&args),
        Commands::InitVault(args) => devnet.init_vault(&args),
        Commands::Deposit(args) => devnet.deposit(&args),
        Commands::Propose(args) => devnet.propose(&args),
        Commands::Approve(args) => devnet.approve(&args),
        Commands::Execute(args) => devnet.execute(&args),
        Commands::ShowVault(args) => devnet.show_vault(&args),
        Commands::ShowProposal(args) => devnet.show_proposal(&args),
    }
}

fn keygen() -> Value {
    let keypair = Keypair::generate();
    json!({
        "pubkey": keypair.pubkey(),
        "secret_key": keypair.secret_key_hex(),
    })
}
