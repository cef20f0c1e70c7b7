//! # Vault Manager
//!
//! Owns the vault lifecycle: creation, deposits, proposal-id allocation and
//! read-only snapshots. Every mutation is one [`VaultStore::transact`] call.
//!
//! ## Deposits and the ledger
//!
//! A deposit stages the balance increase first, then asks the ledger to move
//! the funds into the vault's custody account, and only then lets the store
//! commit. If the ledger refuses, the staged increase is dropped. If the
//! ledger accepted but the commit fails, the funds are moved back
//! ([`compensate`]) so the depositor ends up where they started.

use std::sync::Arc;

use tracing::{debug, error, warn};

use quorum_protocol::{derive_vault_address, Ledger, Pubkey};

use crate::error::VaultError;
use crate::events::{EventSink, VaultEvent};
use crate::store::VaultStore;
use crate::vault::{Vault, VaultView};

/// Vault lifecycle operations over a record store and a ledger.
pub struct VaultManager<S> {
    store: Arc<S>,
    ledger: Arc<dyn Ledger>,
    events: Arc<dyn EventSink>,
}

impl<S> Clone for VaultManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            ledger: Arc::clone(&self.ledger),
            events: Arc::clone(&self.events),
        }
    }
}

impl<S: VaultStore> VaultManager<S> {
    pub fn new(store: Arc<S>, ledger: Arc<dyn Ledger>, events: Arc<dyn EventSink>) -> Self {
        Self {
            store,
            ledger,
            events,
        }
    }

    /// Creates the vault owned by `authority` and returns its address.
    ///
    /// Each authority gets exactly one vault, at
    /// `derive_vault_address(authority)`. The authority does not have to be
    /// one of the owners.
    pub fn create_vault(
        &self,
        authority: Pubkey,
        owners: Vec<Pubkey>,
        threshold: u8,
    ) -> Result<Pubkey, VaultError> {
        let address = derive_vault_address(&authority);
        let vault = Vault::new(address, authority, owners, threshold).map_err(|err| {
            debug!(authority = %authority, error = %err, "vault creation rejected");
            err
        })?;

        self.store.insert_vault(&vault).map_err(|err| {
            debug!(authority = %authority, error = %err, "vault creation rejected");
            err
        })?;

        self.events.emit(&VaultEvent::VaultInitialized {
            vault: address,
            authority,
            owners: vault.owners().to_vec(),
            threshold,
        });
        Ok(address)
    }

    /// Moves `amount` from `depositor` into the vault and returns the new
    /// vault balance.
    ///
    /// Anyone may deposit except the vault itself. The vault balance only
    /// grows if the ledger transfer succeeded and the record committed.
    pub fn deposit(
        &self,
        vault: &Pubkey,
        depositor: &Pubkey,
        amount: u64,
    ) -> Result<u64, VaultError> {
        if amount == 0 {
            return Err(VaultError::InvalidAmount);
        }
        if depositor == vault {
            return Err(VaultError::SelfTransfer(*vault));
        }

        let mut moved = false;
        let result = self.store.transact(vault, None, |staged| {
            let balance = staged.vault.credit(amount)?;
            self.ledger.transfer(depositor, vault, amount)?;
            moved = true;
            Ok(balance)
        });

        let balance = match result {
            Ok(balance) => balance,
            Err(err) if moved => {
                return Err(compensate(self.ledger.as_ref(), vault, depositor, amount, err))
            }
            Err(err) => {
                debug!(vault = %vault, depositor = %depositor, amount, error = %err, "deposit rejected");
                return Err(err);
            }
        };

        self.events.emit(&VaultEvent::Deposited {
            vault: *vault,
            depositor: *depositor,
            amount,
            balance,
        });
        Ok(balance)
    }

    /// Hands out the vault's next proposal id and advances the counter.
    ///
    /// The read and the increment commit together, so concurrent callers
    /// never get the same id. Proposal creation does not go through here:
    /// it allocates inside its own transaction so the id and the proposal
    /// record commit as one.
    pub fn allocate_proposal_id(&self, vault: &Pubkey) -> Result<u64, VaultError> {
        self.store
            .transact(vault, None, |staged| staged.vault.allocate_proposal_id())
    }

    /// Read-only snapshot of a vault.
    pub fn get_vault(&self, vault: &Pubkey) -> Result<VaultView, VaultError> {
        self.load(vault).map(|v| v.view())
    }

    /// The full committed vault record.
    pub fn load(&self, vault: &Pubkey) -> Result<Vault, VaultError> {
        self.store
            .load_vault(vault)?
            .ok_or(VaultError::VaultNotFound(*vault))
    }

    /// Balance of the vault's custody account as the ledger sees it.
    pub fn custody_balance(&self, vault: &Pubkey) -> Result<u64, VaultError> {
        Ok(self.ledger.balance(vault)?)
    }

    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    pub(crate) fn ledger(&self) -> &dyn Ledger {
        self.ledger.as_ref()
    }

    pub(crate) fn events(&self) -> &dyn EventSink {
        self.events.as_ref()
    }
}

/// Undoes a ledger transfer whose record commit failed.
///
/// `from`/`to` name the reverse direction, i.e. where the funds sit now and
/// where they came from. Returns the error the caller should report: the
/// commit error if the reversal worked, a storage error naming both
/// failures if it didn't.
pub(crate) fn compensate(
    ledger: &dyn Ledger,
    from: &Pubkey,
    to: &Pubkey,
    amount: u64,
    cause: VaultError,
) -> VaultError {
    warn!(from = %from, to = %to, amount, error = %cause, "commit failed after transfer, reversing");
    match ledger.transfer(from, to, amount) {
        Ok(()) => cause,
        Err(reverse) => {
            error!(
                from = %from,
                to = %to,
                amount,
                error = %reverse,
                "reversal failed, ledger and vault records disagree"
            );
            VaultError::Storage(format!(
                "commit failed ({cause}) and reversing the transfer failed ({reverse})"
            ))
        }
    }
}
