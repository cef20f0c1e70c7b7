//! # SledLedger: Persistent Balances
//!
//! Balances live in the `balances` tree of a sled database:
//!
//! | Tree       | Key              | Value         |
//! |------------|------------------|---------------|
//! | `balances` | account (32B)    | `u64` (8B BE) |
//!
//! A transfer runs inside a single-tree sled transaction, so the debit and
//! the credit are committed together. sled may re-run the closure on
//! conflict; the closure is pure, so that is harmless.

use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::{Db, IVec, Tree};
use tracing::debug;

use super::{Ledger, LedgerError};
use crate::config::BALANCES_TREE;
use crate::crypto::keys::Pubkey;

/// A ledger persisted in sled.
///
/// Cloning is cheap (sled handles are reference counted) and every clone
/// sees the same balances.
#[derive(Debug, Clone)]
pub struct SledLedger {
    balances: Tree,
}

impl SledLedger {
    /// Opens (or creates) the balances tree inside an existing database.
    ///
    /// Sharing the `Db` with the vault store keeps a deployment to a single
    /// directory on disk.
    pub fn open(db: &Db) -> Result<Self, LedgerError> {
        let balances = db.open_tree(BALANCES_TREE).map_err(backend)?;
        Ok(Self { balances })
    }

    /// Creates a throwaway in-memory sled database. Ideal for tests.
    pub fn open_temporary() -> Result<Self, LedgerError> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(backend)?;
        Self::open(&db)
    }

    /// Devnet faucet: creates `amount` out of nothing for `account`.
    ///
    /// Returns the new balance.
    pub fn credit(&self, account: &Pubkey, amount: u64) -> Result<u64, LedgerError> {
        let result = self.balances.transaction(|tx| {
            let current = decode_balance(tx.get(account.as_ref())?)
                .map_err(ConflictableTransactionError::Abort)?;
            let updated = current
                .checked_add(amount)
                .ok_or(ConflictableTransactionError::Abort(LedgerError::Overflow {
                    account: *account,
                }))?;
            tx.insert(account.as_ref(), &updated.to_be_bytes())?;
            Ok(updated)
        });
        let balance = result.map_err(unwrap_tx_error)?;
        debug!(account = %account, amount, balance, "ledger credit");
        Ok(balance)
    }

    /// Flushes pending writes to disk.
    pub fn flush(&self) -> Result<(), LedgerError> {
        self.balances.flush().map_err(backend)?;
        Ok(())
    }
}

impl Ledger for SledLedger {
    fn balance(&self, account: &Pubkey) -> Result<u64, LedgerError> {
        decode_balance(self.balances.get(account.as_ref()).map_err(backend)?)
    }

    fn transfer(&self, from: &Pubkey, to: &Pubkey, amount: u64) -> Result<(), LedgerError> {
        let result = self.balances.transaction(|tx| {
            let available = decode_balance(tx.get(from.as_ref())?)
                .map_err(ConflictableTransactionError::Abort)?;
            if available < amount {
                return Err(ConflictableTransactionError::Abort(
                    LedgerError::InsufficientBalance {
                        account: *from,
                        available,
                        requested: amount,
                    },
                ));
            }
            if from == to {
                return Ok(());
            }

            let current_to = decode_balance(tx.get(to.as_ref())?)
                .map_err(ConflictableTransactionError::Abort)?;
            let new_to = current_to.checked_add(amount).ok_or(
                ConflictableTransactionError::Abort(LedgerError::Overflow { account: *to }),
            )?;

            tx.insert(from.as_ref(), &(available - amount).to_be_bytes())?;
            tx.insert(to.as_ref(), &new_to.to_be_bytes())?;
            Ok(())
        });
        result.map_err(unwrap_tx_error)?;
        debug!(from = %from, to = %to, amount, "ledger transfer");
        Ok(())
    }
}

fn decode_balance(bytes: Option<IVec>) -> Result<u64, LedgerError> {
    match bytes {
        Some(bytes) => {
            let raw: [u8; 8] = bytes
                .as_ref()
                .try_into()
                .map_err(|_| LedgerError::Backend("invalid balance bytes".to_string()))?;
            Ok(u64::from_be_bytes(raw))
        }
        None => Ok(0),
    }
}

fn backend(err: sled::Error) -> LedgerError {
    LedgerError::Backend(err.to_string())
}

fn unwrap_tx_error(err: TransactionError<LedgerError>) -> LedgerError {
    match err {
        TransactionError::Abort(inner) => inner,
        TransactionError::Storage(e) => backend(e),
    }
}
