//! # Core Domain Entities
//!
//! Chain-level entities shared between the BFT finality core, the peer
//! network and the node runtime.
//!
//! ## Clusters
//!
//! - **Chain**: [`BlockHeader`], [`BlockId`], [`Height`]
//! - **Identity**: [`DelegatePublicKey`]
//! - **Time**: [`Timestamp`]

use serde::{Deserialize, Serialize};

/// A 32-byte block identifier (hash of the serialized block).
pub type BlockId = [u8; 32];

/// A 32-byte Ed25519 public key identifying a forging delegate.
pub type DelegatePublicKey = [u8; 32];

/// Block height in the chain. Heights start at 1; 0 is "no block".
pub type Height = u64;

/// The all-zero block id, used as the previous-id of the genesis block.
pub const EMPTY_BLOCK_ID: BlockId = [0u8; 32];

/// The header of a block as consumed by the finality core.
///
/// `delegate_min_height_active` is not part of the wire format; it is
/// stamped at ingestion from the delegate schedule and carries the first
/// height at which the forger is eligible in its current active round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BlockHeader {
    /// Block identifier.
    pub id: BlockId,
    /// Identifier of the parent block (creates the chain linkage).
    pub previous_block_id: BlockId,
    /// Block height in the chain.
    pub height: Height,
    /// The delegate who forged this block.
    pub delegate_public_key: DelegatePublicKey,
    /// Height of this delegate's previous block on this chain, 0 when none.
    pub max_height_previously_forged: Height,
    /// The pre-voted tip the delegate observed when forging.
    pub max_height_prevoted: Height,
    /// First height at which the forger is eligible in its active round.
    pub delegate_min_height_active: Height,
    /// Unix timestamp (seconds) when the block was forged.
    pub timestamp: u64,
    /// Unix timestamp (seconds) when this node ingested the header.
    pub received_at: u64,
}

impl BlockHeader {
    /// Lateness of arrival relative to the forge slot, in seconds.
    ///
    /// Used by the fork-choice received-late heuristic.
    pub fn reception_delay(&self) -> u64 {
        self.received_at.saturating_sub(self.timestamp)
    }
}

/// Unix timestamp in seconds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub fn new(secs: u64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Add seconds to timestamp.
    pub fn add_secs(&self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }

    /// Subtract seconds from timestamp (saturating).
    pub fn sub_secs(&self, secs: u64) -> Self {
        Self(self.0.saturating_sub(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reception_delay_saturates() {
        let header = BlockHeader {
            timestamp: 1000,
            received_at: 900,
            ..Default::default()
        };
        assert_eq!(header.reception_delay(), 0);
    }

    #[test]
    fn test_timestamp_arithmetic() {
        let ts = Timestamp::new(100);
        assert_eq!(ts.add_secs(50).as_secs(), 150);
        assert_eq!(ts.sub_secs(50).as_secs(), 50);
        assert_eq!(ts.sub_secs(200).as_secs(), 0); // Saturating
    }
}
