//! Deterministic, secret-keyed bucket placement.
//!
//! SECURITY-CRITICAL: placement unpredictability is the book's defense
//! against targeted bucket flooding. Isolate for security audits.

use crate::domain::peer::NetgroupKey;
use sha3::{Digest, Sha3_256};

/// Per-node placement secret.
///
/// 32 random bytes generated once per node identity and persisted with
/// it. Placement must be reproducible across restarts, so the secret is
/// configuration, not an in-process random seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementSecret(pub [u8; 32]);

impl PlacementSecret {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// Keyed hash over the secret and the given parts.
fn keyed_hash(secret: &PlacementSecret, parts: &[&[u8]]) -> u64 {
    let mut hasher = Sha3_256::new();
    hasher.update(secret.0);
    for part in parts {
        hasher.update(part);
    }
    let digest = hasher.finalize();
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix)
}

/// Bucket index in the new table: keyed by the gossip source's group and
/// the peer's own group, spreading one source's gossip across buckets.
pub fn new_table_bucket(
    secret: &PlacementSecret,
    source_group: &NetgroupKey,
    peer_group: &NetgroupKey,
    bucket_count: usize,
) -> usize {
    let hash = keyed_hash(secret, &[source_group.as_bytes(), peer_group.as_bytes()]);
    (hash % bucket_count as u64) as usize
}

/// Bucket index in the tried table: keyed by the peer identity alone.
pub fn tried_table_bucket(secret: &PlacementSecret, peer_id: &str, bucket_count: usize) -> usize {
    let hash = keyed_hash(secret, &[peer_id.as_bytes()]);
    (hash % bucket_count as u64) as usize
}

/// Slot inside a bucket, keyed by the peer identity.
pub fn bucket_slot(secret: &PlacementSecret, peer_id: &str, bucket_size: usize) -> usize {
    // Domain-separate from the tried bucket hash so slot and bucket are
    // independent coordinates.
    let hash = keyed_hash(secret, &[b"slot", peer_id.as_bytes()]);
    (hash % bucket_size as u64) as usize
}
