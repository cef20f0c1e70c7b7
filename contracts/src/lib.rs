//! # Quorum Contracts
//!
//! The multisig custody core. A vault holds funds on behalf of a fixed owner
//! set; funds leave only through a proposal that enough owners approved.
//!
//! - **Vault Manager**: vault creation, deposits, proposal-id allocation.
//! - **Proposal Engine**: proposal creation, approval collection, and
//!   threshold-gated, single-shot execution.
//! - **Store**: keyed records with all-or-nothing multi-record commits,
//!   in memory or on sled.
//! - **Events**: one event per committed operation.
//!
//! ## Design Principles
//!
//! 1. Every rejection leaves the store and the ledger exactly as they were.
//!    Mutations happen on staged copies that commit only on success.
//! 2. Amounts use `checked_add` and `checked_sub`. No wrapping arithmetic.
//! 3. State transitions are explicit: `ProposalStatus`, not a boolean.
//! 4. The caller identity is an argument. Signature checks happen before
//!    anything reaches this crate.

pub mod engine;
pub mod error;
pub mod events;
pub mod manager;
pub mod program;
pub mod proposal;
pub mod store;
pub mod vault;

pub use engine::ProposalEngine;
pub use error::VaultError;
pub use events::{EventLog, EventSink, TracingSink, VaultEvent};
pub use manager::VaultManager;
pub use program::VaultProgram;
pub use proposal::{Proposal, ProposalStatus};
pub use store::{MemoryStore, SledStore, Staged, StoreConfig, VaultStore};
pub use vault::{Vault, VaultView};
