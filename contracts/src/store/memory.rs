//! In-memory record store.
//!
//! One `Mutex` covers both maps and is held for the whole of `transact`,
//! so staging and commit see no interleaving writers at all.

use std::collections::{BTreeMap, HashMap};

use parking_lot::Mutex;

use quorum_protocol::Pubkey;

use super::{Staged, VaultStore};
use crate::error::VaultError;
use crate::proposal::Proposal;
use crate::vault::Vault;

#[derive(Debug, Default)]
struct Records {
    vaults: HashMap<Pubkey, Vault>,
    /// Keyed by `(vault, id)`; `BTreeMap` keeps each vault's proposals in id order.
    proposals: BTreeMap<(Pubkey, u64), Proposal>,
}

/// A record store that lives entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Records>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vault_count(&self) -> usize {
        self.records.lock().vaults.len()
    }
}

impl VaultStore for MemoryStore {
    fn load_vault(&self, address: &Pubkey) -> Result<Option<Vault>, VaultError> {
        Ok(self.records.lock().vaults.get(address).cloned())
    }

    fn load_proposal(
        &self,
        vault: &Pubkey,
        proposal_id: u64,
    ) -> Result<Option<Proposal>, VaultError> {
        Ok(self
            .records
            .lock()
            .proposals
            .get(&(*vault, proposal_id))
            .cloned())
    }

    fn list_proposals(&self, vault: &Pubkey) -> Result<Vec<Proposal>, VaultError> {
        let records = self.records.lock();
        Ok(records
            .proposals
            .range((*vault, 0)..=(*vault, u64::MAX))
            .map(|(_, proposal)| proposal.clone())
            .collect())
    }

    fn insert_vault(&self, vault: &Vault) -> Result<(), VaultError> {
        let mut records = self.records.lock();
        if records.vaults.contains_key(&vault.address()) {
            return Err(VaultError::AlreadyExists(vault.address()));
        }
        records.vaults.insert(vault.address(), vault.clone());
        Ok(())
    }

    fn transact<T, F>(&self, vault: &Pubkey, proposal_id: Option<u64>, f: F) -> Result<T, VaultError>
    where
        F: FnOnce(&mut Staged) -> Result<T, VaultError>,
    {
        let mut records = self.records.lock();

        let staged_vault = records
            .vaults
            .get(vault)
            .cloned()
            .ok_or(VaultError::VaultNotFound(*vault))?;
        let staged_proposal = match proposal_id {
            Some(id) => Some(
                records
                    .proposals
                    .get(&(*vault, id))
                    .cloned()
                    .ok_or(VaultError::ProposalNotFound {
                        vault: *vault,
                        proposal_id: id,
                    })?,
            ),
            None => None,
        };

        let mut staged = Staged {
            vault: staged_vault,
            proposal: staged_proposal,
        };
        let out = f(&mut staged)?;

        if let Some(proposal) = staged.proposal {
            let key = (*vault, proposal.id);
            if proposal.vault != *vault
                || (proposal_id != Some(proposal.id) && records.proposals.contains_key(&key))
            {
                return Err(VaultError::StoreConflict);
            }
            records.proposals.insert(key, proposal);
        }
        records.vaults.insert(*vault, staged.vault);

        Ok(out)
    }
}
