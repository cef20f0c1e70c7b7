//! # Address Derivation
//!
//! Vault and proposal records are located by deterministic addresses, the
//! same way program-derived addresses work on account-model chains:
//!
//! ```text
//! vault    = BLAKE3-derive_key(VAULT_CTX,    "vault"    || authority)
//! proposal = BLAKE3-derive_key(PROPOSAL_CTX, "proposal" || vault || id_le)
//! ```
//!
//! Because the vault address depends only on the authority, each authority
//! can create exactly one vault. A second attempt lands on the same key and
//! is rejected by the store.
//!
//! The vault address doubles as the vault's custody account on the ledger.

use crate::config::{PROPOSAL_ADDRESS_CONTEXT, PROPOSAL_SEED, VAULT_ADDRESS_CONTEXT, VAULT_SEED};
use crate::crypto::hash::domain_separated_hash;
use crate::crypto::keys::Pubkey;

/// Derives the vault address for an authority.
pub fn derive_vault_address(authority: &Pubkey) -> Pubkey {
    Pubkey::new_from_array(domain_separated_hash(
        VAULT_ADDRESS_CONTEXT,
        &[VAULT_SEED, authority.as_ref()],
    ))
}

/// Derives the address of proposal `proposal_id` under `vault`.
pub fn derive_proposal_address(vault: &Pubkey, proposal_id: u64) -> Pubkey {
    Pubkey::new_from_array(domain_separated_hash(
        PROPOSAL_ADDRESS_CONTEXT,
        &[PROPOSAL_SEED, vault.as_ref(), &proposal_id.to_le_bytes()],
    ))
}
