//! Block types for the emberchain hybrid PoW/PoS chain.
//!
//! Only the header fields the coordination core actually consumes are
//! modeled here; full block validation and execution live in the
//! execution layer.

use alloy_primitives::{Bytes, B256, U256};
use serde::{Deserialize, Serialize};

/// Seal discriminator for the hybrid chain.
///
/// Before the Unity fork every block is proof-of-work sealed; afterwards
/// PoW and PoS blocks alternate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SealType {
    /// Block sealed by a mined PoW solution.
    ProofOfWork,
    /// Block sealed by a staker signature.
    ProofOfStake,
}

impl SealType {
    /// Check whether this is a PoW seal.
    pub fn is_pow(&self) -> bool {
        matches!(self, Self::ProofOfWork)
    }

    /// Check whether this is a PoS seal.
    pub fn is_pos(&self) -> bool {
        matches!(self, Self::ProofOfStake)
    }
}

/// A block header as seen by the coordination core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Block number (height).
    pub number: u64,
    /// Hash of the parent block.
    pub parent_hash: B256,
    /// Unix timestamp in seconds.
    pub timestamp: u64,
    /// Mining difficulty of this block.
    pub difficulty: U256,
    /// Maximum energy the block's transactions may consume.
    pub energy_limit: u64,
    /// Energy actually consumed by the block's transactions.
    pub energy_used: u64,
    /// How the block was sealed.
    pub seal_type: SealType,
}

impl BlockHeader {
    /// Create a new block header.
    pub fn new(
        number: u64,
        parent_hash: B256,
        timestamp: u64,
        difficulty: U256,
        energy_limit: u64,
        energy_used: u64,
        seal_type: SealType,
    ) -> Self {
        Self {
            number,
            parent_hash,
            timestamp,
            difficulty,
            energy_limit,
            energy_used,
            seal_type,
        }
    }

    /// Energy still unused under this header's limit.
    pub fn energy_remaining(&self) -> u64 {
        self.energy_limit.saturating_sub(self.energy_used)
    }
}

/// A block body: the transaction payload matching a fetched header.
///
/// Transactions stay opaque here; decoding them is the execution layer's
/// concern.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockBody {
    /// RLP-encoded transactions.
    pub transactions: Vec<Bytes>,
}

impl BlockBody {
    /// Create a new block body.
    pub fn new(transactions: Vec<Bytes>) -> Self {
        Self { transactions }
    }

    /// Number of transactions in the body.
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Check whether the body carries no transactions.
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}
