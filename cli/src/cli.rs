//! # CLI Interface
//!
//! Defines the command-line argument structure for `quorum` using `clap`
//! derive. One subcommand per vault operation, plus a devnet faucet and
//! read-only inspection commands.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use quorum_protocol::config::DEFAULT_DATA_DIR;
use quorum_protocol::Pubkey;

/// Quorum multisig vault operator tool.
///
/// Runs vault operations against a local devnet: a sled database in the
/// data directory holds both the vault records and the account balances.
#[derive(Parser, Debug)]
#[command(
    name = "quorum",
    about = "Quorum multisig vault operator tool",
    version,
    propagate_version = true
)]
pub struct QuorumCli {
    /// Directory holding the devnet database. Created on first use.
    #[arg(long, short = 'd', env = "QUORUM_DATA_DIR", default_value = DEFAULT_DATA_DIR, global = true)]
    pub data_dir: PathBuf,

    /// Log format written to stderr: "pretty" or "json".
    #[arg(long, env = "QUORUM_LOG_FORMAT", default_value = "pretty", global = true)]
    pub log_format: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a fresh Ed25519 keypair and print it.
    Keygen,
    /// Devnet faucet: credit an account out of thin air.
    Airdrop(AirdropArgs),
    /// Print an account's ledger balance.
    Balance(BalanceArgs),
    /// Create the caller's vault.
    InitVault(InitVaultArgs),
    /// Move funds from the caller into a vault.
    Deposit(DepositArgs),
    /// Open a proposal to pay out of a vault.
    Propose(ProposeArgs),
    /// Approve a proposal as one of the vault's owners.
    Approve(ProposalRefArgs),
    /// Execute a proposal that has reached quorum.
    Execute(ExecuteArgs),
    /// Show a vault and its proposals.
    ShowVault(VaultRefArgs),
    /// Show one proposal.
    ShowProposal(ShowProposalArgs),
}

/// The identity submitting an operation.
#[derive(Args, Debug)]
pub struct CallerArgs {
    /// Hex-encoded Ed25519 secret key of the caller.
    ///
    /// **Devnet only.** Anything real should never put a secret on the
    /// command line.
    #[arg(long, env = "QUORUM_KEY", hide_env_values = true)]
    pub key: String,
}

#[derive(Args, Debug)]
pub struct AirdropArgs {
    /// Account to credit (base58 or hex).
    #[arg(long)]
    pub to: Pubkey,

    /// Amount in the smallest value unit.
    #[arg(long)]
    pub amount: u64,
}

#[derive(Args, Debug)]
pub struct BalanceArgs {
    /// Account to query (base58 or hex).
    pub account: Pubkey,
}

#[derive(Args, Debug)]
pub struct InitVaultArgs {
    #[command(flatten)]
    pub caller: CallerArgs,

    /// Comma-separated owner identities.
    #[arg(long, value_delimiter = ',', required = true)]
    pub owners: Vec<Pubkey>,

    /// Approvals required to execute a proposal.
    #[arg(long)]
    pub threshold: u8,
}

/// Locates a vault by the identity that created it.
#[derive(Args, Debug)]
pub struct VaultRefArgs {
    /// The vault's authority (base58 or hex).
    #[arg(long)]
    pub authority: Pubkey,
}

#[derive(Args, Debug)]
pub struct DepositArgs {
    #[command(flatten)]
    pub caller: CallerArgs,

    #[command(flatten)]
    pub vault: VaultRefArgs,

    /// Amount in the smallest value unit.
    #[arg(long)]
    pub amount: u64,
}

#[derive(Args, Debug)]
pub struct ProposeArgs {
    #[command(flatten)]
    pub caller: CallerArgs,

    #[command(flatten)]
    pub vault: VaultRefArgs,

    /// Who gets paid on execution.
    #[arg(long)]
    pub recipient: Pubkey,

    /// Amount in the smallest value unit.
    #[arg(long)]
    pub amount: u64,
}

#[derive(Args, Debug)]
pub struct ProposalRefArgs {
    #[command(flatten)]
    pub caller: CallerArgs,

    #[command(flatten)]
    pub vault: VaultRefArgs,

    /// Proposal id within the vault.
    #[arg(long)]
    pub proposal: u64,
}

#[derive(Args, Debug)]
pub struct ExecuteArgs {
    #[command(flatten)]
    pub target: ProposalRefArgs,

    /// Must repeat the recipient recorded in the proposal.
    #[arg(long)]
    pub recipient: Pubkey,
}

#[derive(Args, Debug)]
pub struct ShowProposalArgs {
    #[command(flatten)]
    pub vault: VaultRefArgs,

    /// Proposal id within the vault.
    #[arg(long)]
    pub proposal: u64,
}
