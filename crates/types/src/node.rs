//! Discovered-peer descriptor handed to the sync subsystem.

use serde::{Deserialize, Serialize};

/// Number of leading characters of the full identifier used for display.
pub const SHORT_ID_LEN: usize = 8;

/// A peer as reported by the discovery layer.
///
/// The full identifier is opaque to the coordination core; peers are keyed
/// by `id_hash` and displayed by `short_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Full peer identifier (e.g. hex-encoded node public key).
    pub id: String,
    /// Key derived from the full identifier, used for equality and hashing.
    pub id_hash: i32,
    /// Truncated identifier for logs and display.
    pub short_id: String,
}

impl NodeRecord {
    /// Create a record from a full identifier, deriving the hash key and
    /// display form.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let id_hash = Self::id_hash_of(&id);
        let short_id = id.chars().take(SHORT_ID_LEN).collect();
        Self {
            id,
            id_hash,
            short_id,
        }
    }

    /// Deterministic identity-hash derivation.
    ///
    /// Independently implemented layers (discovery, sync, RPC) must agree on
    /// this key, so the derivation is a fixed wrapping polynomial over the
    /// identifier bytes rather than a process-seeded hasher.
    pub fn id_hash_of(id: &str) -> i32 {
        let mut hash: i32 = 0;
        for byte in id.bytes() {
            hash = hash.wrapping_mul(31).wrapping_add(byte as i32);
        }
        hash
    }
}
