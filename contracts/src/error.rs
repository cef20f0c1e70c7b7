//! Error taxonomy for vault and proposal operations.
//!
//! Every variant is an ordinary, reportable rejection. Nothing here is
//! retried internally, and every rejection leaves vault, proposal, and
//! ledger state exactly as it was before the call.

use quorum_protocol::{LedgerError, Pubkey};
use thiserror::Error;

/// Errors returned by the vault manager and the proposal engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VaultError {
    /// Threshold is zero or larger than the owner set.
    #[error("invalid threshold {threshold}: must be between 1 and {owners} (owner count)")]
    InvalidThreshold {
        /// The threshold that was requested.
        threshold: u8,
        /// Number of owners supplied.
        owners: usize,
    },

    /// The owner list contains the same identity twice.
    #[error("duplicate owner: {0}")]
    DuplicateOwner(Pubkey),

    /// More owners than a vault can hold.
    #[error("too many owners: {count} supplied, at most {max} allowed")]
    TooManyOwners {
        /// Number of owners supplied.
        count: usize,
        /// The configured maximum.
        max: usize,
    },

    /// A vault already exists at this address.
    #[error("vault already exists at {0}")]
    AlreadyExists(Pubkey),

    /// Deposit or proposal amount is zero.
    #[error("amount must be greater than zero")]
    InvalidAmount,

    /// The vault is named as both ends of a transfer. The ledger would move
    /// nothing while the vault record changed.
    #[error("vault {0} cannot transfer to or from itself")]
    SelfTransfer(Pubkey),

    /// The caller is not in the vault's owner set.
    #[error("{0} is not an owner of this vault")]
    NotAnOwner(Pubkey),

    /// The proposal has already been executed.
    #[error("proposal {proposal_id} has already been executed")]
    AlreadyExecuted {
        /// The executed proposal.
        proposal_id: u64,
    },

    /// This owner has already approved the proposal.
    #[error("{0} has already approved this proposal")]
    DuplicateApproval(Pubkey),

    /// Quorum is not met yet.
    #[error("not enough approvals: have {approvals}, need {threshold}")]
    InsufficientApprovals {
        /// Approvals collected so far.
        approvals: usize,
        /// The vault's threshold.
        threshold: u8,
    },

    /// The recipient supplied at execution differs from the one approved.
    #[error("recipient mismatch: proposal pays {expected}, execution named {supplied}")]
    RecipientMismatch {
        /// Recipient recorded in the proposal.
        expected: Pubkey,
        /// Recipient supplied by the executor.
        supplied: Pubkey,
    },

    /// The vault cannot cover the proposal amount.
    #[error("insufficient funds: vault holds {balance}, proposal needs {amount}")]
    InsufficientFunds {
        /// Current vault balance.
        balance: u64,
        /// Amount the proposal would pay out.
        amount: u64,
    },

    /// No vault exists at this address.
    #[error("vault not found: {0}")]
    VaultNotFound(Pubkey),

    /// No proposal with this id exists under the vault.
    #[error("proposal {proposal_id} not found in vault {vault}")]
    ProposalNotFound {
        /// The vault that was searched.
        vault: Pubkey,
        /// The missing proposal id.
        proposal_id: u64,
    },

    /// Crediting the vault would overflow `u64`.
    #[error("vault balance overflow")]
    BalanceOverflow,

    /// The proposal counter has run out of ids.
    #[error("proposal id space exhausted")]
    CounterOverflow,

    /// The ledger refused the transfer.
    #[error("transfer failed: {0}")]
    Transfer(#[from] LedgerError),

    /// The record store failed or returned corrupt data.
    #[error("storage error: {0}")]
    Storage(String),

    /// A record changed underneath a commit. Nothing was written.
    #[error("store conflict: record changed during commit")]
    StoreConflict,
}
