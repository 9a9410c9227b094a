//! Main address book implementation.

use super::config::AddressBookConfig;
use super::security::{bucket_slot, new_table_bucket, tried_table_bucket, PlacementSecret};
use super::table::AddressTable;
use super::types::{AddressBookStats, BookEntry, DowngradeOutcome};
use crate::domain::peer::{NetgroupKey, PeerInfo, PeerSharedState};
use crate::error::{NetworkError, NetworkResult};
use rand::seq::SliceRandom;
use rand::Rng;
use shared_types::Timestamp;
use std::net::IpAddr;

/// Address book with new/tried segregation.
///
/// A peer id appears in at most one table at a time. Lifecycle:
///
/// | From | Event | To |
/// |------|-------|----|
/// | absent | `add_peer` | new |
/// | new | `upgrade_peer` | tried |
/// | tried | `upgrade_peer` | tried (refresh) |
/// | tried | 3rd `downgrade_peer` | new, counter reset |
/// | new | `downgrade_peer` | evicted |
/// | any | `remove_peer` | evicted |
///
/// Whitelisted and fixed peers never leave the book through downgrades.
#[derive(Debug)]
pub struct PeerAddressBook {
    new_table: AddressTable,
    tried_table: AddressTable,
    secret: PlacementSecret,
    config: AddressBookConfig,
}

impl PeerAddressBook {
    pub fn new(secret: PlacementSecret, config: AddressBookConfig) -> Self {
        Self {
            new_table: AddressTable::new(config.new_bucket_count, config.bucket_size),
            tried_table: AddressTable::new(config.tried_bucket_count, config.bucket_size),
            secret,
            config,
        }
    }

    /// Add a freshly learned address to the new table.
    ///
    /// `source_ip` is the address of whoever told us about the peer; its
    /// network group keys the bucket so one gossip source cannot target a
    /// single bucket. Fails with `ExistingPeer` when the id is present in
    /// either table; a slot collision displaces the occupant silently.
    pub fn add_peer(
        &mut self,
        peer: PeerInfo,
        source_ip: &IpAddr,
        now: Timestamp,
    ) -> NetworkResult<()> {
        if let Some(existing) = self.get_peer(&peer.peer_id) {
            return Err(NetworkError::ExistingPeer {
                peer: Box::new(existing.clone()),
            });
        }

        let source_group = NetgroupKey::from_ip(source_ip);
        let peer_group = peer.netgroup();
        let bucket = new_table_bucket(
            &self.secret,
            &source_group,
            &peer_group,
            self.config.new_bucket_count,
        );
        let slot = bucket_slot(&self.secret, &peer.peer_id, self.config.bucket_size);

        let entry = BookEntry::new(peer, source_group, now);
        if let Some(displaced) = self.new_table.place(bucket, slot, entry) {
            tracing::debug!(
                peer_id = %displaced.peer.peer_id,
                "new-table slot collision displaced an unverified address"
            );
        }
        Ok(())
    }

    /// Promote a peer to the tried table after a confirmed connection, or
    /// refresh it if it is already tried. Idempotent.
    pub fn upgrade_peer(&mut self, peer_id: &str, now: Timestamp) -> NetworkResult<()> {
        if let Some(entry) = self.tried_table.get_mut(peer_id) {
            entry.last_upgraded_at = Some(now);
            entry.failed_attempts = 0;
            return Ok(());
        }

        let Some(mut entry) = self.new_table.remove(peer_id) else {
            return Err(NetworkError::PeerNotFound(peer_id.to_string()));
        };
        entry.last_upgraded_at = Some(now);
        entry.failed_attempts = 0;

        let bucket = tried_table_bucket(&self.secret, peer_id, self.config.tried_bucket_count);
        let slot = bucket_slot(&self.secret, peer_id, self.config.bucket_size);
        if let Some(displaced) = self.tried_table.place(bucket, slot, entry) {
            // A displaced tried peer keeps its reachability history but
            // must re-earn its table position.
            self.demote_into_new(displaced);
        }
        Ok(())
    }

    /// Record a connection failure.
    ///
    /// Tried peers absorb `max_tried_failures` failures before falling
    /// back into the new table; a new peer is dropped on its first
    /// failure. Whitelisted and fixed peers are exempt from removal.
    pub fn downgrade_peer(&mut self, peer_id: &str) -> NetworkResult<DowngradeOutcome> {
        let tried_outcome = self.tried_table.get_mut(peer_id).map(|entry| {
            entry.failed_attempts += 1;
            entry.peer.internal_state.failed_attempts += 1;
            let exhausted = entry.failed_attempts >= self.config.max_tried_failures;
            if exhausted && !entry.peer.internal_state.kind.is_privileged() {
                DowngradeOutcome::MovedToNew
            } else {
                DowngradeOutcome::Retained
            }
        });
        match tried_outcome {
            Some(DowngradeOutcome::MovedToNew) => {
                if let Some(entry) = self.tried_table.remove(peer_id) {
                    self.demote_into_new(entry);
                }
                return Ok(DowngradeOutcome::MovedToNew);
            }
            Some(outcome) => return Ok(outcome),
            None => {}
        }

        if let Some(entry) = self.new_table.get_mut(peer_id) {
            entry.peer.internal_state.failed_attempts += 1;
            if entry.peer.internal_state.kind.is_privileged() {
                return Ok(DowngradeOutcome::Retained);
            }
            self.new_table.remove(peer_id);
            return Ok(DowngradeOutcome::Evicted);
        }

        Err(NetworkError::PeerNotFound(peer_id.to_string()))
    }

    /// Evict a peer from whichever table holds it.
    pub fn remove_peer(&mut self, peer_id: &str) -> Option<PeerInfo> {
        self.new_table
            .remove(peer_id)
            .or_else(|| self.tried_table.remove(peer_id))
            .map(|entry| entry.peer)
    }

    /// Merge shared state without changing table membership.
    pub fn update_peer(&mut self, peer_id: &str, shared: &PeerSharedState) -> NetworkResult<()> {
        let entry = self
            .new_table
            .get_mut(peer_id)
            .or_else(|| self.tried_table.get_mut(peer_id));
        match entry {
            Some(entry) => {
                entry.peer.shared_state.merge(shared);
                Ok(())
            }
            None => Err(NetworkError::PeerNotFound(peer_id.to_string())),
        }
    }

    pub fn has_peer(&self, peer_id: &str) -> bool {
        self.new_table.contains(peer_id) || self.tried_table.contains(peer_id)
    }

    pub fn is_tried(&self, peer_id: &str) -> bool {
        self.tried_table.contains(peer_id)
    }

    pub fn is_new(&self, peer_id: &str) -> bool {
        self.new_table.contains(peer_id)
    }

    pub fn get_peer(&self, peer_id: &str) -> Option<&PeerInfo> {
        self.new_table
            .get(peer_id)
            .or_else(|| self.tried_table.get(peer_id))
            .map(|entry| &entry.peer)
    }

    pub fn new_count(&self) -> usize {
        self.new_table.len()
    }

    pub fn tried_count(&self) -> usize {
        self.tried_table.len()
    }

    pub fn len(&self) -> usize {
        self.new_count() + self.tried_count()
    }

    pub fn is_empty(&self) -> bool {
        self.new_table.is_empty() && self.tried_table.is_empty()
    }

    pub fn new_peers(&self) -> Vec<PeerInfo> {
        self.new_table.entries().map(|e| e.peer.clone()).collect()
    }

    pub fn tried_peers(&self) -> Vec<PeerInfo> {
        self.tried_table.entries().map(|e| e.peer.clone()).collect()
    }

    pub fn all_peers(&self) -> Vec<PeerInfo> {
        let mut peers = self.new_peers();
        peers.extend(self.tried_peers());
        peers
    }

    /// A freshly shuffled sample of between `min` and `max` advertisable
    /// peers, without replacement, for discovery responses.
    pub fn get_randomized_peer_list<R: Rng + ?Sized>(
        &self,
        min: usize,
        max: usize,
        rng: &mut R,
    ) -> Vec<PeerInfo> {
        let mut pool: Vec<PeerInfo> = self
            .all_peers()
            .into_iter()
            .filter(|peer| peer.internal_state.advertise_address)
            .collect();
        pool.shuffle(rng);

        let upper = max.min(pool.len());
        if upper == 0 {
            return Vec::new();
        }
        let lower = min.clamp(1, upper);
        let count = rng.gen_range(lower..=upper);
        pool.truncate(count);
        pool
    }

    pub fn stats(&self) -> AddressBookStats {
        AddressBookStats {
            new_count: self.new_count(),
            tried_count: self.tried_count(),
            new_bucket_count: self.new_table.bucket_count(),
            tried_bucket_count: self.tried_table.bucket_count(),
        }
    }

    /// Re-home a displaced or exhausted tried entry in the new table,
    /// keyed by its original gossip source. Whatever its slot holds is
    /// dropped.
    fn demote_into_new(&mut self, mut entry: BookEntry) {
        entry.failed_attempts = 0;
        let peer_group = entry.peer.netgroup();
        let bucket = new_table_bucket(
            &self.secret,
            &entry.source_group,
            &peer_group,
            self.config.new_bucket_count,
        );
        let slot = bucket_slot(&self.secret, &entry.peer.peer_id, self.config.bucket_size);
        self.new_table.place(bucket, slot, entry);
    }
}
