// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Quorum Protocol: Shared Primitives
//!
//! The pieces every Quorum component agrees on, independent of how vaults
//! and proposals behave:
//!
//! - **crypto**: Ed25519 identities and BLAKE3 hashing.
//! - **address**: Deterministic vault and proposal addresses.
//! - **ledger**: The value-transfer seam the vault engine moves funds through.
//! - **config**: Protocol constants: owner limits, seeds, tree names.
//!
//! The vault/proposal state machine itself lives in `quorum-contracts`.

pub mod address;
pub mod config;
pub mod crypto;
pub mod ledger;

pub use address::{derive_proposal_address, derive_vault_address};
pub use crypto::keys::{Keypair, Pubkey};
pub use ledger::{Ledger, LedgerError, MemoryLedger, SledLedger};
