//! # Ledger: the Value-Transfer Seam
//!
//! The vault engine never moves value itself. It asks a [`Ledger`] to move
//! `amount` from one account to another and trusts the answer: `Ok` means the
//! transfer happened in full, `Err` means nothing moved.
//!
//! ```text
//! memory.rs   MemoryLedger, a HashMap behind a RwLock, for tests and embedding
//! db.rs       SledLedger, balances persisted in a sled tree, for the CLI
//! ```
//!
//! Both implementations make a transfer atomic: the debit and the credit
//! land together or not at all.

pub mod db;
pub mod memory;

pub use db::SledLedger;
pub use memory::MemoryLedger;

use thiserror::Error;

use crate::crypto::keys::Pubkey;

/// Errors a ledger can report for a transfer or balance query.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// The source account does not hold enough to cover the transfer.
    #[error("insufficient balance in {account}: available {available}, requested {requested}")]
    InsufficientBalance {
        /// The account being debited.
        account: Pubkey,
        /// Its balance at the time of the attempt.
        available: u64,
        /// The amount requested.
        requested: u64,
    },

    /// Crediting the destination would overflow `u64`.
    #[error("balance overflow crediting {account}")]
    Overflow {
        /// The account being credited.
        account: Pubkey,
    },

    /// The backing store failed or returned corrupt data.
    #[error("ledger backend error: {0}")]
    Backend(String),
}

/// An atomic value-transfer primitive between two balances.
pub trait Ledger: Send + Sync {
    /// Current balance of `account`. Unknown accounts hold zero.
    fn balance(&self, account: &Pubkey) -> Result<u64, LedgerError>;

    /// Moves `amount` from `from` to `to`, all or nothing.
    fn transfer(&self, from: &Pubkey, to: &Pubkey, amount: u64) -> Result<(), LedgerError>;
}

impl<L: Ledger + ?Sized> Ledger for std::sync::Arc<L> {
    fn balance(&self, account: &Pubkey) -> Result<u64, LedgerError> {
        (**self).balance(account)
    }

    fn transfer(&self, from: &Pubkey, to: &Pubkey, amount: u64) -> Result<(), LedgerError> {
        (**self).transfer(from, to, amount)
    }
}
