//! # SledStore: Persistent Vault Records
//!
//! | Tree        | Key                               | Value               |
//! |-------------|-----------------------------------|---------------------|
//! | `vaults`    | vault address (32B)               | `bincode(Vault)`    |
//! | `proposals` | vault address (32B) ++ id (8B BE) | `bincode(Proposal)` |
//!
//! Big-endian ids make a prefix scan over one vault return its proposals in
//! id order.
//!
//! ## Commit protocol
//!
//! 1. Take the writer lock.
//! 2. Read the raw bytes of the vault (and proposal) and decode them.
//! 3. Run the caller's closure on the decoded copies, outside of sled.
//! 4. Open a multi-tree sled transaction that re-reads every key it is about
//!    to write, aborts with [`VaultError::StoreConflict`] if any of them no
//!    longer matches step 2, and otherwise writes all of them.
//!
//! The closure in step 3 runs exactly once. sled may retry the transaction
//! in step 4, but that body only compares and writes bytes.

use parking_lot::Mutex;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::{Db, Transactional, Tree};
use tracing::{debug, warn};

use quorum_protocol::config::{PROPOSALS_TREE, VAULTS_TREE};
use quorum_protocol::Pubkey;

use super::{Staged, VaultStore};
use crate::error::VaultError;
use crate::proposal::Proposal;
use crate::vault::Vault;

/// Store tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Flush to disk after every commit. Slower, but a commit that returned
    /// `Ok` survives a crash.
    pub flush_on_commit: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            flush_on_commit: true,
        }
    }
}

/// A record store persisted in sled.
#[derive(Debug)]
pub struct SledStore {
    db: Db,
    vaults: Tree,
    proposals: Tree,
    config: StoreConfig,
    writer: Mutex<()>,
}

impl SledStore {
    /// Opens (or creates) the store's trees inside an existing database.
    pub fn open(db: &Db, config: StoreConfig) -> Result<Self, VaultError> {
        let vaults = db.open_tree(VAULTS_TREE).map_err(storage)?;
        let proposals = db.open_tree(PROPOSALS_TREE).map_err(storage)?;
        Ok(Self {
            db: db.clone(),
            vaults,
            proposals,
            config,
            writer: Mutex::new(()),
        })
    }

    /// Creates a throwaway in-memory sled database. Ideal for tests.
    pub fn open_temporary() -> Result<Self, VaultError> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(storage)?;
        Self::open(
            &db,
            StoreConfig {
                flush_on_commit: false,
            },
        )
    }

    /// Forces pending writes to disk.
    pub fn flush(&self) -> Result<(), VaultError> {
        self.db.flush().map_err(storage)?;
        Ok(())
    }

    /// The commit already happened, so a failed flush is reported but does
    /// not turn the operation into a failure.
    fn after_commit(&self) {
        if self.config.flush_on_commit {
            if let Err(err) = self.flush() {
                warn!(error = %err, "flush after commit failed");
            }
        }
    }
}

impl VaultStore for SledStore {
    fn load_vault(&self, address: &Pubkey) -> Result<Option<Vault>, VaultError> {
        match self.vaults.get(address.as_ref()).map_err(storage)? {
            Some(bytes) => decode(&bytes).map(Some),
            None => Ok(None),
        }
    }

    fn load_proposal(
        &self,
        vault: &Pubkey,
        proposal_id: u64,
    ) -> Result<Option<Proposal>, VaultError> {
        match self
            .proposals
            .get(proposal_key(vault, proposal_id))
            .map_err(storage)?
        {
            Some(bytes) => decode(&bytes).map(Some),
            None => Ok(None),
        }
    }

    fn list_proposals(&self, vault: &Pubkey) -> Result<Vec<Proposal>, VaultError> {
        self.proposals
            .scan_prefix(vault.as_ref())
            .values()
            .map(|bytes| decode(&bytes.map_err(storage)?))
            .collect()
    }

    fn insert_vault(&self, vault: &Vault) -> Result<(), VaultError> {
        let _writer = self.writer.lock();
        let bytes = encode(vault)?;
        let swapped = self
            .vaults
            .compare_and_swap(vault.address().as_ref(), None as Option<&[u8]>, Some(bytes))
            .map_err(storage)?;
        if swapped.is_err() {
            return Err(VaultError::AlreadyExists(vault.address()));
        }
        self.after_commit();
        debug!(vault = %vault.address(), "vault record inserted");
        Ok(())
    }

    fn transact<T, F>(&self, vault: &Pubkey, proposal_id: Option<u64>, f: F) -> Result<T, VaultError>
    where
        F: FnOnce(&mut Staged) -> Result<T, VaultError>,
    {
        let _writer = self.writer.lock();

        let vault_snapshot = self
            .vaults
            .get(vault.as_ref())
            .map_err(storage)?
            .ok_or(VaultError::VaultNotFound(*vault))?;
        let proposal_snapshot = match proposal_id {
            Some(id) => Some(
                self.proposals
                    .get(proposal_key(vault, id))
                    .map_err(storage)?
                    .ok_or(VaultError::ProposalNotFound {
                        vault: *vault,
                        proposal_id: id,
                    })?,
            ),
            None => None,
        };

        let mut staged = Staged {
            vault: decode(&vault_snapshot)?,
            proposal: proposal_snapshot.as_deref().map(decode).transpose()?,
        };
        let out = f(&mut staged)?;

        let vault_bytes = encode(&staged.vault)?;
        let proposal_write = match &staged.proposal {
            Some(proposal) => {
                if proposal.vault != *vault {
                    return Err(VaultError::StoreConflict);
                }
                // Only the proposal that was loaded may be overwritten.
                let expected = if proposal_id == Some(proposal.id) {
                    proposal_snapshot.clone()
                } else {
                    None
                };
                Some((proposal_key(vault, proposal.id), encode(proposal)?, expected))
            }
            None => None,
        };

        let result = (&self.vaults, &self.proposals).transaction(|(vaults, proposals)| {
            let current = vaults.get(vault.as_ref())?;
            if current.as_deref() != Some(&vault_snapshot[..]) {
                return Err(ConflictableTransactionError::Abort(VaultError::StoreConflict));
            }
            if let Some((key, bytes, expected)) = &proposal_write {
                let current = proposals.get(key.as_slice())?;
                if current.as_deref() != expected.as_deref() {
                    return Err(ConflictableTransactionError::Abort(VaultError::StoreConflict));
                }
                proposals.insert(key.as_slice(), bytes.as_slice())?;
            }
            vaults.insert(vault.as_ref(), vault_bytes.as_slice())?;
            Ok(())
        });

        if let Err(err) = result {
            let err = unwrap_tx_error(err);
            warn!(vault = %vault, error = %err, "commit rejected");
            return Err(err);
        }
        self.after_commit();

        Ok(out)
    }
}

fn proposal_key(vault: &Pubkey, proposal_id: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(40);
    key.extend_from_slice(vault.as_ref());
    key.extend_from_slice(&proposal_id.to_be_bytes());
    key
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, VaultError> {
    bincode::serialize(value).map_err(|e| VaultError::Storage(e.to_string()))
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, VaultError> {
    bincode::deserialize(bytes).map_err(|e| VaultError::Storage(e.to_string()))
}

fn storage(err: sled::Error) -> VaultError {
    VaultError::Storage(err.to_string())
}

fn unwrap_tx_error(err: TransactionError<VaultError>) -> VaultError {
    match err {
        TransactionError::Abort(inner) => inner,
        TransactionError::Storage(e) => storage(e),
    }
}
