//! The invocation surface: one entry point per operation a caller can
//! submit, each taking the already-authenticated caller first.

use std::sync::Arc;

use quorum_protocol::{Ledger, Pubkey};

use crate::engine::ProposalEngine;
use crate::error::VaultError;
use crate::events::{EventLog, EventSink};
use crate::manager::VaultManager;
use crate::proposal::Proposal;
use crate::store::{MemoryStore, VaultStore};
use crate::vault::VaultView;

/// Vault manager and proposal engine wired to one store, ledger and sink.
pub struct VaultProgram<S> {
    engine: ProposalEngine<S>,
}

impl<S: VaultStore> VaultProgram<S> {
    pub fn new(store: Arc<S>, ledger: Arc<dyn Ledger>, events: Arc<dyn EventSink>) -> Self {
        let manager = VaultManager::new(store, ledger, events);
        Self {
            engine: ProposalEngine::new(manager),
        }
    }

    /// `caller` becomes the vault's authority.
    pub fn initialize_vault(
        &self,
        caller: &Pubkey,
        owners: Vec<Pubkey>,
        threshold: u8,
    ) -> Result<Pubkey, VaultError> {
        self.manager().create_vault(*caller, owners, threshold)
    }

    pub fn deposit(&self, caller: &Pubkey, vault: &Pubkey, amount: u64) -> Result<u64, VaultError> {
        self.manager().deposit(vault, caller, amount)
    }

    pub fn create_proposal(
        &self,
        caller: &Pubkey,
        vault: &Pubkey,
        recipient: &Pubkey,
        amount: u64,
    ) -> Result<u64, VaultError> {
        self.engine.create_proposal(vault, caller, recipient, amount)
    }

    pub fn approve_proposal(
        &self,
        caller: &Pubkey,
        vault: &Pubkey,
        proposal_id: u64,
    ) -> Result<usize, VaultError> {
        self.engine.approve(vault, proposal_id, caller)
    }

    pub fn execute_proposal(
        &self,
        caller: &Pubkey,
        vault: &Pubkey,
        proposal_id: u64,
        recipient: &Pubkey,
    ) -> Result<(), VaultError> {
        self.engine.execute(vault, proposal_id, caller, recipient)
    }

    pub fn vault(&self, vault: &Pubkey) -> Result<VaultView, VaultError> {
        self.manager().get_vault(vault)
    }

    pub fn proposal(&self, vault: &Pubkey, proposal_id: u64) -> Result<Proposal, VaultError> {
        self.engine.get_proposal(vault, proposal_id)
    }

    pub fn proposals(&self, vault: &Pubkey) -> Result<Vec<Proposal>, VaultError> {
        self.engine.list_proposals(vault)
    }

    pub fn manager(&self) -> &VaultManager<S> {
        self.engine.vaults()
    }

    pub fn engine(&self) -> &ProposalEngine<S> {
        &self.engine
    }
}

impl VaultProgram<MemoryStore> {
    /// A program over a fresh in-memory store, recording events into the
    /// returned log.
    pub fn in_memory(ledger: Arc<dyn Ledger>) -> (Self, Arc<EventLog>) {
        let events = Arc::new(EventLog::new());
        let program = Self::new(Arc::new(MemoryStore::new()), ledger, events.clone());
        (program, events)
    }
}
