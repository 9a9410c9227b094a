//! Address table: a bucket array with a peer-id index.

use super::bucket::AddressBucket;
use super::types::BookEntry;
use crate::domain::peer::PeerId;
use std::collections::HashMap;

/// One of the two tables (new or tried).
#[derive(Debug, Clone)]
pub struct AddressTable {
    buckets: Vec<AddressBucket>,
    /// Quick lookup: peer id to (bucket, slot).
    index: HashMap<PeerId, (usize, usize)>,
}

impl AddressTable {
    pub fn new(bucket_count: usize, bucket_size: usize) -> Self {
        Self {
            buckets: (0..bucket_count)
                .map(|_| AddressBucket::new(bucket_size))
                .collect(),
            index: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn contains(&self, peer_id: &str) -> bool {
        self.index.contains_key(peer_id)
    }

    pub fn get(&self, peer_id: &str) -> Option<&BookEntry> {
        let (bucket, slot) = self.index.get(peer_id)?;
        self.buckets[*bucket].get(*slot)
    }

    pub fn get_mut(&mut self, peer_id: &str) -> Option<&mut BookEntry> {
        let (bucket, slot) = self.index.get(peer_id).copied()?;
        self.buckets[bucket].get_mut(slot)
    }

    /// Place an entry at its computed coordinates. The displaced
    /// occupant, if any, is unindexed and returned to the caller.
    pub fn place(&mut self, bucket: usize, slot: usize, entry: BookEntry) -> Option<BookEntry> {
        let peer_id = entry.peer.peer_id.clone();
        let evicted = self.buckets[bucket].place(slot, entry);
        if let Some(ref displaced) = evicted {
            self.index.remove(&displaced.peer.peer_id);
        }
        self.index.insert(peer_id, (bucket, slot));
        evicted
    }

    pub fn remove(&mut self, peer_id: &str) -> Option<BookEntry> {
        let (bucket, slot) = self.index.remove(peer_id)?;
        self.buckets[bucket].remove(slot)
    }

    /// All entries, bucket order.
    pub fn entries(&self) -> impl Iterator<Item = &BookEntry> {
        self.buckets
            .iter()
            .flat_map(|bucket| bucket.iter().map(|(_, entry)| entry))
    }
}
