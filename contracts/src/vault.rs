//! # Vault Record
//!
//! A vault is a pool of value guarded by a fixed owner set and an approval
//! threshold. The record enforces its own invariants:
//!
//! - `1 <= threshold <= owners.len() <= MAX_OWNERS`, checked once at
//!   creation. The owner set and threshold have no setters afterward.
//! - `balance` only moves through [`Vault::credit`] and [`Vault::debit`],
//!   both overflow/underflow checked.
//! - `proposal_count` only moves through [`Vault::allocate_proposal_id`],
//!   one step at a time, never backward.
//!
//! The record itself is plain data. Atomicity comes from the store: every
//! mutation happens on a staged copy that commits as a unit (see
//! [`crate::store`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use quorum_protocol::config::{MAX_OWNERS, MIN_THRESHOLD};
use quorum_protocol::Pubkey;

use crate::error::VaultError;

/// A multisig vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vault {
    /// Derived address of this vault. Also its custody account on the ledger.
    address: Pubkey,
    /// Identity that created the vault. Need not be an owner.
    authority: Pubkey,
    /// Distinct owner identities, in the order they were supplied.
    owners: Vec<Pubkey>,
    /// Minimum number of distinct owner approvals to execute a proposal.
    threshold: u8,
    /// Funds held in custody, in the smallest value unit.
    balance: u64,
    /// Next proposal id to hand out.
    proposal_count: u64,
    /// When the vault was created.
    created_at: DateTime<Utc>,
}

impl Vault {
    /// Validates the owner set and threshold and builds a fresh vault with
    /// zero balance and zero proposals.
    ///
    /// # Errors
    ///
    /// - [`VaultError::InvalidThreshold`] if `threshold < 1` or
    ///   `threshold > owners.len()`.
    /// - [`VaultError::TooManyOwners`] if more than [`MAX_OWNERS`] owners.
    /// - [`VaultError::DuplicateOwner`] if any identity repeats.
    pub fn new(
        address: Pubkey,
        authority: Pubkey,
        owners: Vec<Pubkey>,
        threshold: u8,
    ) -> Result<Self, VaultError> {
        if threshold < MIN_THRESHOLD || threshold as usize > owners.len() {
            return Err(VaultError::InvalidThreshold {
                threshold,
                owners: owners.len(),
            });
        }

        if owners.len() > MAX_OWNERS {
            return Err(VaultError::TooManyOwners {
                count: owners.len(),
                max: MAX_OWNERS,
            });
        }

        for (i, owner) in owners.iter().enumerate() {
            if owners[..i].contains(owner) {
                return Err(VaultError::DuplicateOwner(*owner));
            }
        }

        Ok(Self {
            address,
            authority,
            owners,
            threshold,
            balance: 0,
            proposal_count: 0,
            created_at: Utc::now(),
        })
    }

    pub fn address(&self) -> Pubkey {
        self.address
    }

    pub fn authority(&self) -> Pubkey {
        self.authority
    }

    pub fn owners(&self) -> &[Pubkey] {
        &self.owners
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    pub fn proposal_count(&self) -> u64 {
        self.proposal_count
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns `true` if `identity` is one of the owners.
    pub fn is_owner(&self, identity: &Pubkey) -> bool {
        self.owners.contains(identity)
    }

    /// Rejects callers outside the owner set.
    pub fn ensure_owner(&self, identity: &Pubkey) -> Result<(), VaultError> {
        if self.is_owner(identity) {
            Ok(())
        } else {
            Err(VaultError::NotAnOwner(*identity))
        }
    }

    /// Adds `amount` to the custody balance and returns the new balance.
    ///
    /// # Errors
    ///
    /// [`VaultError::InvalidAmount`] for zero, [`VaultError::BalanceOverflow`]
    /// if the sum doesn't fit in `u64`.
    pub fn credit(&mut self, amount: u64) -> Result<u64, VaultError> {
        if amount == 0 {
            return Err(VaultError::InvalidAmount);
        }
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(VaultError::BalanceOverflow)?;
        Ok(self.balance)
    }

    /// Removes `amount` from the custody balance and returns what's left.
    ///
    /// # Errors
    ///
    /// [`VaultError::InsufficientFunds`] if the vault holds less than `amount`.
    pub fn debit(&mut self, amount: u64) -> Result<u64, VaultError> {
        self.balance = self
            .balance
            .checked_sub(amount)
            .ok_or(VaultError::InsufficientFunds {
                balance: self.balance,
                amount,
            })?;
        Ok(self.balance)
    }

    /// Hands out the current proposal counter and advances it by one.
    ///
    /// Read and increment happen on the same staged record, so whichever
    /// transaction commits first owns the id and the other one re-reads the
    /// bumped counter.
    pub fn allocate_proposal_id(&mut self) -> Result<u64, VaultError> {
        let id = self.proposal_count;
        self.proposal_count = id.checked_add(1).ok_or(VaultError::CounterOverflow)?;
        Ok(id)
    }

    /// Read-only snapshot for callers outside the engine.
    pub fn view(&self) -> VaultView {
        VaultView::from(self)
    }
}

/// A read-only snapshot of a vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultView {
    pub address: Pubkey,
    pub authority: Pubkey,
    pub owners: Vec<Pubkey>,
    pub threshold: u8,
    pub balance: u64,
    pub proposal_count: u64,
}

impl From<&Vault> for VaultView {
    fn from(vault: &Vault) -> Self {
        Self {
            address: vault.address,
            authority: vault.authority,
            owners: vault.owners.clone(),
            threshold: vault.threshold,
            balance: vault.balance,
            proposal_count: vault.proposal_count,
        }
    }
}
