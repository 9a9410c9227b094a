//! Eviction protection.
//!
//! SECURITY-CRITICAL: this is what stops an attacker from churning
//! inbound slots until only their own connections remain. Isolate for
//! security audits.

use super::config::PeerPoolConfig;
use super::types::ConnectedPeer;
use crate::domain::peer::{NetgroupKey, PeerId};
use std::collections::{BTreeMap, HashSet};

/// The four protection fractions, each applied to the full current set.
#[derive(Debug, Clone, Copy)]
pub struct ProtectionRatios {
    pub netgroup: f64,
    pub latency: f64,
    pub productivity: f64,
    pub longevity: f64,
}

impl From<&PeerPoolConfig> for ProtectionRatios {
    fn from(config: &PeerPoolConfig) -> Self {
        Self {
            netgroup: config.netgroup_protection_ratio,
            latency: config.latency_protection_ratio,
            productivity: config.productivity_protection_ratio,
            longevity: config.longevity_protection_ratio,
        }
    }
}

/// Compute the protected subset of `peers`.
///
/// Privileged peers are protected unconditionally. Each ratio then
/// shields its own top fraction of the whole set; the protections
/// overlap, and the eviction candidates are the complement of the union.
pub fn protected_peers(peers: &[&ConnectedPeer], ratios: ProtectionRatios) -> HashSet<PeerId> {
    let mut protected: HashSet<PeerId> = peers
        .iter()
        .filter(|peer| peer.is_privileged())
        .map(|peer| peer.peer_id().clone())
        .collect();

    let total = peers.len();
    protect_by_netgroup(peers, quota(ratios.netgroup, total), &mut protected);
    protect_top(
        peers,
        quota(ratios.latency, total),
        &mut protected,
        |a, b| a.rtt_ms.cmp(&b.rtt_ms),
    );
    protect_top(
        peers,
        quota(ratios.productivity, total),
        &mut protected,
        |a, b| {
            b.productivity()
                .partial_cmp(&a.productivity())
                .unwrap_or(std::cmp::Ordering::Equal)
        },
    );
    protect_top(
        peers,
        quota(ratios.longevity, total),
        &mut protected,
        |a, b| a.connected_at.cmp(&b.connected_at),
    );

    protected
}

/// Pick the eviction victim from the unprotected complement: the peer
/// with the highest current message rate, ties broken toward the
/// youngest connection.
pub fn select_eviction_victim(
    peers: &[&ConnectedPeer],
    protected: &HashSet<PeerId>,
) -> Option<PeerId> {
    peers
        .iter()
        .filter(|peer| !protected.contains(peer.peer_id()))
        .max_by(|a, b| {
            // Highest rate wins; ties go to the youngest connection.
            a.interval_message_count
                .cmp(&b.interval_message_count)
                .then(a.connected_at.cmp(&b.connected_at))
                .then(a.peer_id().cmp(b.peer_id()))
        })
        .map(|peer| peer.peer_id().clone())
}

fn quota(ratio: f64, total: usize) -> usize {
    (ratio * total as f64) as usize
}

/// Protect up to `quota` peers, preferring one peer per network group
/// and, inside a group, the longest-connected member. Small groups are
/// served first so diversity survives a flood from one /16.
fn protect_by_netgroup(
    peers: &[&ConnectedPeer],
    quota: usize,
    protected: &mut HashSet<PeerId>,
) {
    if quota == 0 {
        return;
    }
    let mut groups: BTreeMap<NetgroupKey, Vec<&ConnectedPeer>> = BTreeMap::new();
    for peer in peers {
        groups.entry(peer.netgroup).or_default().push(peer);
    }
    let mut ordered: Vec<(NetgroupKey, Vec<&ConnectedPeer>)> = groups.into_iter().collect();
    for (_, members) in ordered.iter_mut() {
        members.sort_by(|a, b| {
            a.connected_at
                .cmp(&b.connected_at)
                .then(a.peer_id().cmp(b.peer_id()))
        });
    }
    ordered.sort_by_key(|(key, members)| (members.len(), *key));

    let mut picked = 0;
    let mut depth = 0;
    while picked < quota {
        let mut advanced = false;
        for (_, members) in &ordered {
            if let Some(peer) = members.get(depth) {
                advanced = true;
                if protected.insert(peer.peer_id().clone()) {
                    picked += 1;
                    if picked == quota {
                        return;
                    }
                }
            }
        }
        if !advanced {
            return;
        }
        depth += 1;
    }
}

/// Protect the top `quota` peers under the given ordering.
fn protect_top<F>(
    peers: &[&ConnectedPeer],
    quota: usize,
    protected: &mut HashSet<PeerId>,
    compare: F,
) where
    F: Fn(&ConnectedPeer, &ConnectedPeer) -> std::cmp::Ordering,
{
    if quota == 0 {
        return;
    }
    let mut ranked: Vec<&ConnectedPeer> = peers.to_vec();
    ranked.sort_by(|a, b| compare(a, b).then(a.peer_id().cmp(b.peer_id())));
    for peer in ranked.into_iter().take(quota) {
        protected.insert(peer.peer_id().clone());
    }
}
