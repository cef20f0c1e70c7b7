//! # Record Store
//!
//! Durable keyed storage for vault and proposal records.
//!
//! ```text
//! memory.rs   MemoryStore, HashMaps behind one Mutex
//! db.rs       SledStore, `vaults` and `proposals` trees, bincode values
//! ```
//!
//! Every write goes through [`VaultStore::transact`]: the store loads the
//! vault (and optionally one proposal), hands the caller *copies* in a
//! [`Staged`], and writes the copies back as one unit only if the caller
//! returns `Ok`. An `Err` from the caller discards the copies, so a
//! rejected operation never leaves a trace in the store.
//!
//! Writers on the same store are serialized. Between the load and the
//! commit nobody else can change the records, so a read-increment-write
//! on `proposal_count` inside one `transact` call hands out each id
//! exactly once.

pub mod db;
pub mod memory;

pub use db::{SledStore, StoreConfig};
pub use memory::MemoryStore;

use quorum_protocol::Pubkey;

use crate::error::VaultError;
use crate::proposal::Proposal;
use crate::vault::Vault;

/// Working copies of the records touched by one transaction.
#[derive(Debug, Clone)]
pub struct Staged {
    /// The vault being operated on.
    pub vault: Vault,
    /// The proposal that was loaded, or one the caller created. Staging a
    /// proposal under an id that was not loaded requires that id to be free.
    pub proposal: Option<Proposal>,
}

impl Staged {
    /// Vault and proposal, both mutable. Fails if no proposal is staged.
    pub fn parts_mut(&mut self) -> Result<(&mut Vault, &mut Proposal), VaultError> {
        match self.proposal.as_mut() {
            Some(proposal) => Ok((&mut self.vault, proposal)),
            None => Err(VaultError::Storage(
                "no proposal staged in this transaction".to_string(),
            )),
        }
    }
}

/// Keyed storage for vaults and proposals with atomic multi-record commits.
pub trait VaultStore: Send + Sync {
    /// Committed vault record, if any.
    fn load_vault(&self, address: &Pubkey) -> Result<Option<Vault>, VaultError>;

    /// Committed proposal record, if any.
    fn load_proposal(&self, vault: &Pubkey, proposal_id: u64)
        -> Result<Option<Proposal>, VaultError>;

    /// All committed proposals of a vault, ordered by id.
    fn list_proposals(&self, vault: &Pubkey) -> Result<Vec<Proposal>, VaultError>;

    /// Writes a new vault record if its address is still free.
    ///
    /// Fails with [`VaultError::AlreadyExists`] otherwise. The check and the
    /// write are one atomic step.
    fn insert_vault(&self, vault: &Vault) -> Result<(), VaultError>;

    /// Runs `f` against staged copies and commits them iff it returns `Ok`.
    ///
    /// With `proposal_id = Some(id)` the proposal is loaded too, and a missing
    /// one fails with [`VaultError::ProposalNotFound`] before `f` runs. A
    /// missing vault fails with [`VaultError::VaultNotFound`].
    fn transact<T, F>(&self, vault: &Pubkey, proposal_id: Option<u64>, f: F) -> Result<T, VaultError>
    where
        F: FnOnce(&mut Staged) -> Result<T, VaultError>;
}

impl<S: VaultStore> VaultStore for std::sync::Arc<S> {
    fn load_vault(&self, address: &Pubkey) -> Result<Option<Vault>, VaultError> {
        (**self).load_vault(address)
    }

    fn load_proposal(
        &self,
        vault: &Pubkey,
        proposal_id: u64,
    ) -> Result<Option<Proposal>, VaultError> {
        (**self).load_proposal(vault, proposal_id)
    }

    fn list_proposals(&self, vault: &Pubkey) -> Result<Vec<Proposal>, VaultError> {
        (**self).list_proposals(vault)
    }

    fn insert_vault(&self, vault: &Vault) -> Result<(), VaultError> {
        (**self).insert_vault(vault)
    }

    fn transact<T, F>(&self, vault: &Pubkey, proposal_id: Option<u64>, f: F) -> Result<T, VaultError>
    where
        F: FnOnce(&mut Staged) -> Result<T, VaultError>,
    {
        (**self).transact(vault, proposal_id, f)
    }
}
