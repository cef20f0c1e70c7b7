//! # Cryptographic Primitives for Quorum
//!
//! Thin, type-safe wrappers around audited implementations:
//!
//! - **Ed25519** (`ed25519-dalek`) for caller identities.
//! - **BLAKE3** for address derivation.
//!
//! Nothing here is clever, and nothing here should become clever.

pub mod hash;
pub mod keys;

pub use hash::domain_separated_hash;
pub use keys::{KeyError, Keypair, Pubkey};
