//! # Protocol Configuration & Constants
//!
//! Every magic number in Quorum lives here. Seeds and domain tags are part
//! of the address derivation, so changing any of them after vaults exist
//! orphans every record keyed by the old values. Treat them as frozen.

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// Major version: bump when record layouts or address derivation change.
pub const PROTOCOL_VERSION_MAJOR: u16 = 0;

/// Minor version: bump on backward-compatible additions.
pub const PROTOCOL_VERSION_MINOR: u16 = 1;

/// Patch version: bump on non-consensus bug fixes.
pub const PROTOCOL_VERSION_PATCH: u16 = 0;

/// The full version string.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Vault Parameters
// ---------------------------------------------------------------------------

/// Upper bound on the owner set of a single vault.
///
/// Membership checks are linear scans over the owner list, and every
/// approval is stored inline in the proposal record. Ten keeps both the
/// scan and the record size trivially small.
pub const MAX_OWNERS: usize = 10;

/// Smallest accepted threshold. A zero threshold would let anyone execute
/// without a single approval, which is the one thing a multisig must not do.
pub const MIN_THRESHOLD: u8 = 1;

/// Seed mixed into every vault address derivation.
pub const VAULT_SEED: &[u8] = b"vault";

/// Seed mixed into every proposal address derivation.
pub const PROPOSAL_SEED: &[u8] = b"proposal";

/// BLAKE3 `derive_key` context for vault addresses.
pub const VAULT_ADDRESS_CONTEXT: &str = "quorum 2026-01 vault address";

/// BLAKE3 `derive_key` context for proposal addresses.
pub const PROPOSAL_ADDRESS_CONTEXT: &str = "quorum 2026-01 proposal address";

// ---------------------------------------------------------------------------
// Identity Parameters
// ---------------------------------------------------------------------------

/// Identity (public key) length in bytes. Ed25519 verifying keys are 32 bytes.
pub const PUBKEY_LENGTH: usize = 32;

/// Ed25519 secret key length in bytes.
pub const SECRET_KEY_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// sled tree holding vault records keyed by vault address.
pub const VAULTS_TREE: &str = "vaults";

/// sled tree holding proposal records keyed by vault address and id.
pub const PROPOSALS_TREE: &str = "proposals";

/// sled tree holding ledger balances keyed by account.
pub const BALANCES_TREE: &str = "balances";

/// Default data directory for the operator CLI, relative to the working
/// directory.
pub const DEFAULT_DATA_DIR: &str = ".quorum";
