//! # Proposal Engine
//!
//! Drives a proposal from `Created` to `Executed`:
//!
//! ```text
//! create_proposal ──► Created ──approve──► Created (+1 approval) ──execute──► Executed
//!                        ▲                        │
//!                        └────────────────────────┘
//! ```
//!
//! Execution stages the vault debit and the `Executed` flip on the same
//! transaction, moves the funds through the ledger, and then commits. A
//! ledger failure drops both staged changes. A commit failure after the
//! ledger moved the funds sends them back to the vault.

use tracing::debug;

use quorum_protocol::{derive_proposal_address, Pubkey};

use crate::error::VaultError;
use crate::events::VaultEvent;
use crate::manager::{compensate, VaultManager};
use crate::proposal::Proposal;
use crate::store::VaultStore;

/// Proposal lifecycle operations.
pub struct ProposalEngine<S> {
    vaults: VaultManager<S>,
}

impl<S> Clone for ProposalEngine<S> {
    fn clone(&self) -> Self {
        Self {
            vaults: self.vaults.clone(),
        }
    }
}

impl<S: VaultStore> ProposalEngine<S> {
    pub fn new(vaults: VaultManager<S>) -> Self {
        Self { vaults }
    }

    /// Opens a proposal to pay `amount` to `recipient` and returns its id.
    ///
    /// The id comes from the vault's counter, bumped in the same commit that
    /// writes the proposal.
    pub fn create_proposal(
        &self,
        vault: &Pubkey,
        creator: &Pubkey,
        recipient: &Pubkey,
        amount: u64,
    ) -> Result<u64, VaultError> {
        let created = self.vaults.store().transact(vault, None, |staged| {
            staged.vault.ensure_owner(creator)?;
            if amount == 0 {
                return Err(VaultError::InvalidAmount);
            }
            let id = staged.vault.allocate_proposal_id()?;
            let proposal = Proposal::new(
                &staged.vault,
                derive_proposal_address(vault, id),
                id,
                *creator,
                *recipient,
                amount,
            )?;
            let address = proposal.address;
            staged.proposal = Some(proposal);
            Ok((id, address))
        });

        let (id, address) = created.map_err(|err| {
            debug!(vault = %vault, creator = %creator, amount, error = %err, "proposal creation rejected");
            err
        })?;

        self.vaults.events().emit(&VaultEvent::ProposalCreated {
            vault: *vault,
            proposal: address,
            proposal_id: id,
            creator: *creator,
            recipient: *recipient,
            amount,
        });
        Ok(id)
    }

    /// Records `approver`'s approval and returns the approval count.
    pub fn approve(
        &self,
        vault: &Pubkey,
        proposal_id: u64,
        approver: &Pubkey,
    ) -> Result<usize, VaultError> {
        let approved = self.vaults.store().transact(vault, Some(proposal_id), |staged| {
            let (vault, proposal) = staged.parts_mut()?;
            let total = proposal.approve(vault, *approver)?;
            Ok((total, proposal.address))
        });

        let (total_approvals, address) = approved.map_err(|err| {
            debug!(vault = %vault, proposal_id, approver = %approver, error = %err, "approval rejected");
            err
        })?;

        self.vaults.events().emit(&VaultEvent::ProposalApproved {
            vault: *vault,
            proposal: address,
            proposal_id,
            approver: *approver,
            total_approvals,
        });
        Ok(total_approvals)
    }

    /// Pays out a proposal that has reached quorum.
    ///
    /// `recipient` must repeat the recipient the owners approved. Any owner
    /// may execute, not just the creator.
    pub fn execute(
        &self,
        vault: &Pubkey,
        proposal_id: u64,
        executor: &Pubkey,
        recipient: &Pubkey,
    ) -> Result<(), VaultError> {
        let ledger = self.vaults.ledger();
        let mut moved = None;

        let result = self.vaults.store().transact(vault, Some(proposal_id), |staged| {
            let (staged_vault, proposal) = staged.parts_mut()?;
            proposal.check_executable(staged_vault, executor, recipient)?;

            staged_vault.debit(proposal.amount)?;
            proposal.mark_executed()?;

            ledger.transfer(vault, &proposal.recipient, proposal.amount)?;
            moved = Some(proposal.amount);
            Ok((proposal.address, proposal.amount))
        });

        let (address, amount) = match (result, moved) {
            (Ok(done), _) => done,
            (Err(err), Some(amount)) => {
                return Err(compensate(ledger, recipient, vault, amount, err));
            }
            (Err(err), None) => {
                debug!(vault = %vault, proposal_id, executor = %executor, error = %err, "execution rejected");
                return Err(err);
            }
        };

        self.vaults.events().emit(&VaultEvent::ProposalExecuted {
            vault: *vault,
            proposal: address,
            proposal_id,
            executor: *executor,
            recipient: *recipient,
            amount,
        });
        Ok(())
    }

    /// The committed proposal record.
    pub fn get_proposal(&self, vault: &Pubkey, proposal_id: u64) -> Result<Proposal, VaultError> {
        self.vaults
            .store()
            .load_proposal(vault, proposal_id)?
            .ok_or(VaultError::ProposalNotFound {
                vault: *vault,
                proposal_id,
            })
    }

    /// Every proposal of a vault, by id.
    pub fn list_proposals(&self, vault: &Pubkey) -> Result<Vec<Proposal>, VaultError> {
        self.vaults.load(vault)?;
        self.vaults.store().list_proposals(vault)
    }

    pub fn vaults(&self) -> &VaultManager<S> {
        &self.vaults
    }
}
