//! # Hashing Utilities
//!
//! BLAKE3 is the only hash Quorum uses. Address derivation needs domain
//! separation from it, so that a vault address can never collide with a
//! proposal address even if someone lines the seed bytes up just right.

/// Domain-separated hash over a sequence of parts.
///
/// Uses BLAKE3's `derive_key` mode: the context string selects a different
/// internal IV, so outputs under different contexts are independent by
/// construction. Each part is length-prefixed so that `["ab", "c"]` and
/// `["a", "bc"]` hash differently.
pub fn domain_separated_hash(context: &str, parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(context);
    for part in parts {
        hasher.update(&(part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
    *hasher.finalize().as_bytes()
}
