//! # Proposal Record
//!
//! A proposal is one specific transfer (recipient, amount) out of a vault,
//! waiting for enough owners to sign off. Its lifecycle:
//!
//! 1. **Created**: approvals start empty. Any owner may open one; the
//!    vault balance is not checked yet.
//! 2. **Approving**: owners add themselves to `approvals`, one unit each,
//!    in any order. This is not a separate stored state; approvals simply
//!    accumulate on a `Created` proposal.
//! 3. **Executed**: terminal. Reached only once, when quorum is met and the
//!    vault can cover the amount.
//!
//! All checks here are pure: they read the vault and the proposal and
//! either reject or mutate the (staged) proposal. The engine decides when
//! those mutations commit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use quorum_protocol::Pubkey;

use crate::error::VaultError;
use crate::vault::Vault;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Where a proposal is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalStatus {
    /// Open for approvals.
    Created,
    /// Paid out. Final.
    Executed,
}

impl std::fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProposalStatus::Created => write!(f, "Created"),
            ProposalStatus::Executed => write!(f, "Executed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Proposal
// ---------------------------------------------------------------------------

/// A proposed transfer out of a vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    /// Derived address of this proposal record.
    pub address: Pubkey,
    /// The vault this proposal spends from.
    pub vault: Pubkey,
    /// Sequential id within the vault.
    pub id: u64,
    /// Owner that opened the proposal.
    pub creator: Pubkey,
    /// Who gets paid on execution.
    pub recipient: Pubkey,
    /// Amount to pay, fixed at creation.
    pub amount: u64,
    /// Owners that approved, in arrival order. No duplicates.
    approvals: Vec<Pubkey>,
    /// Current lifecycle state.
    status: ProposalStatus,
    pub created_at: DateTime<Utc>,
    pub executed_at: Option<DateTime<Utc>>,
}

impl Proposal {
    /// Opens a new proposal against `vault`.
    ///
    /// The caller supplies the id it allocated from the vault. The creator
    /// must be an owner, the amount must be positive, and the recipient must
    /// not be the vault itself. The vault balance is not consulted until
    /// execution.
    pub fn new(
        vault: &Vault,
        address: Pubkey,
        id: u64,
        creator: Pubkey,
        recipient: Pubkey,
        amount: u64,
    ) -> Result<Self, VaultError> {
        vault.ensure_owner(&creator)?;
        if amount == 0 {
            return Err(VaultError::InvalidAmount);
        }
        if recipient == vault.address() {
            return Err(VaultError::SelfTransfer(recipient));
        }

        Ok(Self {
            address,
            vault: vault.address(),
            id,
            creator,
            recipient,
            amount,
            approvals: Vec::new(),
            status: ProposalStatus::Created,
            created_at: Utc::now(),
            executed_at: None,
        })
    }

    pub fn approvals(&self) -> &[Pubkey] {
        &self.approvals
    }

    pub fn approval_count(&self) -> usize {
        self.approvals.len()
    }

    pub fn status(&self) -> ProposalStatus {
        self.status
    }

    pub fn is_executed(&self) -> bool {
        self.status == ProposalStatus::Executed
    }

    pub fn has_approved(&self, identity: &Pubkey) -> bool {
        self.approvals.contains(identity)
    }

    /// `approvals.len() >= vault.threshold`.
    pub fn is_threshold_met(&self, vault: &Vault) -> bool {
        self.approvals.len() >= vault.threshold() as usize
    }

    /// Records `approver`'s approval and returns the new total.
    ///
    /// Checks, in order: owner, not executed, not already approved.
    pub fn approve(&mut self, vault: &Vault, approver: Pubkey) -> Result<usize, VaultError> {
        vault.ensure_owner(&approver)?;
        self.ensure_open()?;
        if self.has_approved(&approver) {
            return Err(VaultError::DuplicateApproval(approver));
        }

        self.approvals.push(approver);
        Ok(self.approvals.len())
    }

    /// Runs every execution precondition without changing anything.
    ///
    /// Checks, in order: executor is an owner, not executed, quorum met,
    /// recipient matches, vault can cover the amount.
    pub fn check_executable(
        &self,
        vault: &Vault,
        executor: &Pubkey,
        recipient: &Pubkey,
    ) -> Result<(), VaultError> {
        vault.ensure_owner(executor)?;
        self.ensure_open()?;
        if !self.is_threshold_met(vault) {
            return Err(VaultError::InsufficientApprovals {
                approvals: self.approvals.len(),
                threshold: vault.threshold(),
            });
        }
        if *recipient != self.recipient {
            return Err(VaultError::RecipientMismatch {
                expected: self.recipient,
                supplied: *recipient,
            });
        }
        if vault.balance() < self.amount {
            return Err(VaultError::InsufficientFunds {
                balance: vault.balance(),
                amount: self.amount,
            });
        }
        Ok(())
    }

    /// Flips the proposal to `Executed`. One way only.
    pub fn mark_executed(&mut self) -> Result<(), VaultError> {
        self.ensure_open()?;
        self.status = ProposalStatus::Executed;
        self.executed_at = Some(Utc::now());
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), VaultError> {
        if self.is_executed() {
            return Err(VaultError::AlreadyExecuted {
                proposal_id: self.id,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn key(byte: u8) -> Pubkey {
        Pubkey::new_from_array([byte; 32])
    }

    fn vault_with_balance(balance: u64) -> Vault {
        let mut vault =
            Vault::new(key(0xAA), key(0xA0), vec![key(1), key(2), key(3)], 2).unwrap();
        if balance > 0 {
            vault.credit(balance).unwrap();
        }
        vault
    }

    fn proposal(vault: &Vault, amount: u64) -> Proposal {
        Proposal::new(vault, key(0xBB), 0, key(1), key(0xEE), amount).unwrap()
    }

    #[test]
    fn new_proposal_is_open_and_empty() {
        let vault = vault_with_balance(0);
        let p = proposal(&vault, 500);
        assert_eq!(p.status(), ProposalStatus::Created);
        assert_eq!(p.approval_count(), 0);
        assert_eq!(p.vault, vault.address());
        assert!(p.executed_at.is_none());
    }

    #[test]
    fn creator_must_be_owner() {
        let vault = vault_with_balance(0);
        let err = Proposal::new(&vault, key(0xBB), 0, key(9), key(0xEE), 1).unwrap_err();
        assert_eq!(err, VaultError::NotAnOwner(key(9)));
    }

    #[test]
    fn zero_amount_rejected() {
        let vault = vault_with_balance(0);
        let err = Proposal::new(&vault, key(0xBB), 0, key(1), key(0xEE), 0).unwrap_err();
        assert_eq!(err, VaultError::InvalidAmount);
    }

    #[test]
    fn vault_cannot_pay_itself() {
        let vault = vault_with_balance(100);
        let err = Proposal::new(&vault, key(0xBB), 0, key(1), vault.address(), 60).unwrap_err();
        assert_eq!(err, VaultError::SelfTransfer(vault.address()));
    }

    #[test]
    fn amount_above_balance_is_allowed_at_creation() {
        let vault = vault_with_balance(10);
        assert!(Proposal::new(&vault, key(0xBB), 0, key(1), key(0xEE), 1_000).is_ok());
    }

    #[test]
    fn approvals_accumulate() {
        let vault = vault_with_balance(0);
        let mut p = proposal(&vault, 5);
        assert_eq!(p.approve(&vault, key(3)).unwrap(), 1);
        assert!(!p.is_threshold_met(&vault));
        assert_eq!(p.approve(&vault, key(1)).unwrap(), 2);
        assert!(p.is_threshold_met(&vault));
        assert_eq!(p.approvals(), &[key(3), key(1)]);
    }

    #[test]
    fn duplicate_approval_rejected() {
        let vault = vault_with_balance(0);
        let mut p = proposal(&vault, 5);
        p.approve(&vault, key(2)).unwrap();
        assert_eq!(
            p.approve(&vault, key(2)).unwrap_err(),
            VaultError::DuplicateApproval(key(2))
        );
        assert_eq!(p.approval_count(), 1);
    }

    #[test]
    fn outsider_cannot_approve() {
        let vault = vault_with_balance(0);
        let mut p = proposal(&vault, 5);
        assert_eq!(
            p.approve(&vault, key(7)).unwrap_err(),
            VaultError::NotAnOwner(key(7))
        );
        assert_eq!(p.approval_count(), 0);
    }

    #[test]
    fn execution_checks_run_in_order() {
        let vault = vault_with_balance(1);
        let mut p = proposal(&vault, 5);

        // Outsider comes before everything else.
        assert_eq!(
            p.check_executable(&vault, &key(9), &key(0xEE)).unwrap_err(),
            VaultError::NotAnOwner(key(9))
        );

        assert!(matches!(
            p.check_executable(&vault, &key(1), &key(0xEE)),
            Err(VaultError::InsufficientApprovals {
                approvals: 0,
                threshold: 2
            })
        ));

        p.approve(&vault, key(1)).unwrap();
        p.approve(&vault, key(2)).unwrap();

        assert_eq!(
            p.check_executable(&vault, &key(3), &key(0xDD)).unwrap_err(),
            VaultError::RecipientMismatch {
                expected: key(0xEE),
                supplied: key(0xDD)
            }
        );

        assert_eq!(
            p.check_executable(&vault, &key(3), &key(0xEE)).unwrap_err(),
            VaultError::InsufficientFunds {
                balance: 1,
                amount: 5
            }
        );
    }

    #[test]
    fn executed_proposal_is_closed() {
        let vault = vault_with_balance(100);
        let mut p = proposal(&vault, 5);
        p.approve(&vault, key(1)).unwrap();
        p.approve(&vault, key(2)).unwrap();
        p.check_executable(&vault, &key(2), &key(0xEE)).unwrap();
        p.mark_executed().unwrap();

        assert!(p.is_executed());
        assert!(p.executed_at.is_some());
        assert_eq!(
            p.mark_executed().unwrap_err(),
            VaultError::AlreadyExecuted { proposal_id: 0 }
        );
        assert_eq!(
            p.approve(&vault, key(3)).unwrap_err(),
            VaultError::AlreadyExecuted { proposal_id: 0 }
        );
        assert_eq!(
            p.check_executable(&vault, &key(1), &key(0xEE)).unwrap_err(),
            VaultError::AlreadyExecuted { proposal_id: 0 }
        );
    }

    #[test]
    fn status_display() {
        assert_eq!(ProposalStatus::Created.to_string(), "Created");
        assert_eq!(ProposalStatus::Executed.to_string(), "Executed");
    }
}
