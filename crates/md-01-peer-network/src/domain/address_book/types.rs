//! Address book type definitions.

use crate::domain::peer::{NetgroupKey, PeerInfo};
use shared_types::Timestamp;

/// An address entry in one of the two tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookEntry {
    /// Full peer record.
    pub peer: PeerInfo,
    /// Network group of the source that told us about this address.
    pub source_group: NetgroupKey,
    /// When the entry was first added.
    pub added_at: Timestamp,
    /// When the entry was last upgraded to (or refreshed in) tried.
    pub last_upgraded_at: Option<Timestamp>,
    /// Downgrade failures since the last upgrade.
    pub failed_attempts: u32,
}

impl BookEntry {
    pub fn new(peer: PeerInfo, source_group: NetgroupKey, now: Timestamp) -> Self {
        Self {
            peer,
            source_group,
            added_at: now,
            last_upgraded_at: None,
            failed_attempts: 0,
        }
    }
}

/// Where a downgraded peer ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DowngradeOutcome {
    /// Failure recorded, peer kept in its table.
    Retained,
    /// Tried peer exhausted its failures and fell back into new.
    MovedToNew,
    /// Peer was removed from the book.
    Evicted,
}

/// Snapshot of book occupancy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressBookStats {
    /// Number of addresses in the new table.
    pub new_count: usize,
    /// Number of addresses in the tried table.
    pub tried_count: usize,
    /// Number of buckets in the new table.
    pub new_bucket_count: usize,
    /// Number of buckets in the tried table.
    pub tried_bucket_count: usize,
}
