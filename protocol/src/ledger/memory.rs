//! In-memory ledger.
//!
//! A single `RwLock` guards the whole balance map, so a transfer takes the
//! write lock once and applies debit and credit under it. Readers never see
//! one side of a transfer without the other.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::{Ledger, LedgerError};
use crate::crypto::keys::Pubkey;

/// A ledger that lives entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    balances: RwLock<HashMap<Pubkey, u64>>,
}

impl MemoryLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates value out of thin air for `account`. Test and devnet use only.
    ///
    /// Returns the new balance.
    pub fn credit(&self, account: &Pubkey, amount: u64) -> Result<u64, LedgerError> {
        let mut balances = self.balances.write();
        let entry = balances.entry(*account).or_insert(0);
        *entry = entry
            .checked_add(amount)
            .ok_or(LedgerError::Overflow { account: *account })?;
        Ok(*entry)
    }

    /// Number of accounts that have ever been touched.
    pub fn account_count(&self) -> usize {
        self.balances.read().len()
    }
}

impl Ledger for MemoryLedger {
    fn balance(&self, account: &Pubkey) -> Result<u64, LedgerError> {
        Ok(self.balances.read().get(account).copied().unwrap_or(0))
    }

    fn transfer(&self, from: &Pubkey, to: &Pubkey, amount: u64) -> Result<(), LedgerError> {
        let mut balances = self.balances.write();

        let available = balances.get(from).copied().unwrap_or(0);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                account: *from,
                available,
                requested: amount,
            });
        }
        if from == to {
            return Ok(());
        }

        let current_to = balances.get(to).copied().unwrap_or(0);
        let new_to = current_to
            .checked_add(amount)
            .ok_or(LedgerError::Overflow { account: *to })?;

        balances.insert(*from, available - amount);
        balances.insert(*to, new_to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(byte: u8) -> Pubkey {
        Pubkey::new_from_array([byte; 32])
    }

    #[test]
    fn unknown_account_has_zero_balance() {
        let ledger = MemoryLedger::new();
        assert_eq!(ledger.balance(&key(1)).unwrap(), 0);
    }

    #[test]
    fn transfer_moves_value() {
        let ledger = MemoryLedger::new();
        ledger.credit(&key(1), 1_000).unwrap();

        ledger.transfer(&key(1), &key(2), 400).unwrap();

        assert_eq!(ledger.balance(&key(1)).unwrap(), 600);
        assert_eq!(ledger.balance(&key(2)).unwrap(), 400);
    }

    #[test]
    fn insufficient_balance_moves_nothing() {
        let ledger = MemoryLedger::new();
        ledger.credit(&key(1), 100).unwrap();

        let err = ledger.transfer(&key(1), &key(2), 200).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientBalance {
                account: key(1),
                available: 100,
                requested: 200,
            }
        );
        assert_eq!(ledger.balance(&key(1)).unwrap(), 100);
        assert_eq!(ledger.balance(&key(2)).unwrap(), 0);
    }

    #[test]
    fn overflow_on_credit_side_moves_nothing() {
        let ledger = MemoryLedger::new();
        ledger.credit(&key(1), 10).unwrap();
        ledger.credit(&key(2), u64::MAX).unwrap();

        let err = ledger.transfer(&key(1), &key(2), 10).unwrap_err();
        assert_eq!(err, LedgerError::Overflow { account: key(2) });
        assert_eq!(ledger.balance(&key(1)).unwrap(), 10);
    }

    #[test]
    fn self_transfer_is_a_no_op() {
        let ledger = MemoryLedger::new();
        ledger.credit(&key(1), 50).unwrap();
        ledger.transfer(&key(1), &key(1), 50).unwrap();
        assert_eq!(ledger.balance(&key(1)).unwrap(), 50);
    }

    #[test]
    fn credit_overflow_rejected() {
        let ledger = MemoryLedger::new();
        ledger.credit(&key(1), u64::MAX).unwrap();
        assert!(ledger.credit(&key(1), 1).is_err());
        assert_eq!(ledger.account_count(), 1);
    }
}
