//! A local devnet: vault records and account balances in one sled database.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::{json, Value};

use quorum_contracts::{EventLog, SledStore, StoreConfig, TracingSink, VaultProgram};
use quorum_protocol::{derive_vault_address, Keypair, Ledger, Pubkey, SledLedger};

use crate::cli::{
    AirdropArgs, BalanceArgs, DepositArgs, ExecuteArgs, InitVaultArgs, ProposalRefArgs,
    ProposeArgs, ShowProposalArgs, VaultRefArgs,
};

/// Name of the sled directory inside the data dir.
const DB_DIR: &str = "db";

pub struct Devnet {
    program: VaultProgram<SledStore>,
    ledger: Arc<SledLedger>,
    events: Arc<EventLog>,
}

impl Devnet {
    /// Opens (or creates) the devnet under `data_dir`.
    pub fn open(data_dir: &Path) -> Result<Self> {
        let db_path: PathBuf = data_dir.join(DB_DIR);
        std::fs::create_dir_all(&db_path)
            .with_context(|| format!("failed to create database directory: {}", db_path.display()))?;

        let db = sled::open(&db_path)
            .with_context(|| format!("failed to open database at {}", db_path.display()))?;
        let store = SledStore::open(&db, StoreConfig::default()).context("failed to open vault store")?;
        let ledger = Arc::new(SledLedger::open(&db).context("failed to open ledger")?);
        let events = Arc::new(EventLog::new());

        let program = VaultProgram::new(
            Arc::new(store),
            ledger.clone(),
            Arc::new((TracingSink, events.clone())),
        );
        tracing::debug!(
            path = %db_path.display(),
            protocol = quorum_protocol::config::PROTOCOL_VERSION,
            "devnet opened"
        );

        Ok(Self {
            program,
            ledger,
            events,
        })
    }

    pub fn airdrop(&self, args: &AirdropArgs) -> Result<Value> {
        let balance = self
            .ledger
            .credit(&args.to, args.amount)
            .with_context(|| format!("airdrop to {} failed", args.to))?;
        self.ledger.flush().context("failed to flush ledger")?;
        Ok(json!({ "account": args.to, "balance": balance }))
    }

    pub fn balance(&self, args: &BalanceArgs) -> Result<Value> {
        let balance = self.ledger.balance(&args.account)?;
        Ok(json!({ "account": args.account, "balance": balance }))
    }

    pub fn init_vault(&self, args: &InitVaultArgs) -> Result<Value> {
        let caller = caller(&args.caller.key)?;
        let vault = self
            .program
            .initialize_vault(&caller, args.owners.clone(), args.threshold)
            .context("vault initialization rejected")?;
        Ok(self.result(json!({ "vault": vault })))
    }

    pub fn deposit(&self, args: &DepositArgs) -> Result<Value> {
        let caller = caller(&args.caller.key)?;
        let vault = vault_of(&args.vault);
        let balance = self
            .program
            .deposit(&caller, &vault, args.amount)
            .context("deposit rejected")?;
        Ok(self.result(json!({ "vault": vault, "balance": balance })))
    }

    pub fn propose(&self, args: &ProposeArgs) -> Result<Value> {
        let caller = caller(&args.caller.key)?;
        let vault = vault_of(&args.vault);
        let id = self
            .program
            .create_proposal(&caller, &vault, &args.recipient, args.amount)
            .context("proposal rejected")?;
        Ok(self.result(json!({ "vault": vault, "proposal": id })))
    }

    pub fn approve(&self, args: &ProposalRefArgs) -> Result<Value> {
        let caller = caller(&args.caller.key)?;
        let vault = vault_of(&args.vault);
        let approvals = self
            .program
            .approve_proposal(&caller, &vault, args.proposal)
            .context("approval rejected")?;
        Ok(self.result(json!({
            "vault": vault,
            "proposal": args.proposal,
            "approvals": approvals,
        })))
    }

    pub fn execute(&self, args: &ExecuteArgs) -> Result<Value> {
        let caller = caller(&args.target.caller.key)?;
        let vault = vault_of(&args.target.vault);
        self.program
            .execute_proposal(&caller, &vault, args.target.proposal, &args.recipient)
            .context("execution rejected")?;
        let view = self.program.vault(&vault)?;
        Ok(self.result(json!({
            "vault": vault,
            "proposal": args.target.proposal,
            "balance": view.balance,
        })))
    }

    pub fn show_vault(&self, args: &VaultRefArgs) -> Result<Value> {
        let vault = vault_of(args);
        let view = self
            .program
            .vault(&vault)
            .with_context(|| format!("no vault for authority {}", args.authority))?;
        let proposals = self.program.proposals(&vault)?;
        let custody = self.ledger.balance(&vault)?;
        Ok(json!({ "vault": view, "custody_balance": custody, "proposals": proposals }))
    }

    pub fn show_proposal(&self, args: &ShowProposalArgs) -> Result<Value> {
        let vault = vault_of(&args.vault);
        let proposal = self
            .program
            .proposal(&vault, args.proposal)
            .with_context(|| format!("no proposal {} in vault {}", args.proposal, vault))?;
        Ok(serde_json::to_value(proposal)?)
    }

    /// Attaches the events the operation emitted.
    fn result(&self, mut body: Value) -> Value {
        body["events"] = json!(self.events.drain());
        body
    }
}

fn caller(secret_hex: &str) -> Result<Pubkey> {
    let keypair = Keypair::from_hex(secret_hex).context("invalid --key")?;
    Ok(keypair.pubkey())
}

fn vault_of(args: &VaultRefArgs) -> Pubkey {
    derive_vault_address(&args.authority)
}
