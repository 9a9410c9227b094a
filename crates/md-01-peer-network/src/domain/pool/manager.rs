//! Live connection pool implementation.

use super::config::{PeerPoolConfig, BAN_PENALTY};
use super::protection::{protected_peers, select_eviction_victim, ProtectionRatios};
use super::types::{ConnectedPeer, ConnectionDirection, PoolStats, RateInterval};
use crate::domain::peer::{PeerId, PeerInfo};
use crate::error::{NetworkError, NetworkResult};
use shared_types::Timestamp;
use std::collections::HashMap;

/// Outcome of admitting an inbound connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundAdmission {
    /// A free slot was available.
    Added,
    /// The pool was full; the named peer was evicted to make room.
    AddedEvicting(PeerId),
}

/// Bounded sets of live inbound and outbound connections.
///
/// All mutations happen on the coordinator's event-loop task; the pool
/// itself is plain data.
#[derive(Debug)]
pub struct PeerPool {
    inbound: HashMap<PeerId, ConnectedPeer>,
    outbound: HashMap<PeerId, ConnectedPeer>,
    config: PeerPoolConfig,
}

impl PeerPool {
    pub fn new(config: PeerPoolConfig) -> Self {
        Self {
            inbound: HashMap::new(),
            outbound: HashMap::new(),
            config,
        }
    }

    pub fn inbound_count(&self) -> usize {
        self.inbound.len()
    }

    pub fn outbound_count(&self) -> usize {
        self.outbound.len()
    }

    pub fn has_peer(&self, peer_id: &str) -> bool {
        self.inbound.contains_key(peer_id) || self.outbound.contains_key(peer_id)
    }

    pub fn has_outbound_capacity(&self) -> bool {
        self.outbound.len() < self.config.max_outbound_connections
    }

    pub fn get(&self, peer_id: &str) -> Option<&ConnectedPeer> {
        self.inbound
            .get(peer_id)
            .or_else(|| self.outbound.get(peer_id))
    }

    pub fn get_mut(&mut self, peer_id: &str) -> Option<&mut ConnectedPeer> {
        if let Some(peer) = self.inbound.get_mut(peer_id) {
            return Some(peer);
        }
        self.outbound.get_mut(peer_id)
    }

    /// Admit an inbound connection, evicting an unprotected peer when the
    /// set is full.
    pub fn add_inbound(
        &mut self,
        peer: PeerInfo,
        now: Timestamp,
    ) -> NetworkResult<InboundAdmission> {
        let peer_id = peer.peer_id.clone();
        if self.has_peer(&peer_id) {
            return Err(NetworkError::PeerInboundHandshake {
                peer_id,
                reason: "duplicate connection",
            });
        }

        let mut evicted = None;
        if self.inbound.len() >= self.config.max_inbound_connections {
            let victim = self.find_inbound_eviction_victim().ok_or_else(|| {
                NetworkError::PeerInboundHandshake {
                    peer_id: peer_id.clone(),
                    reason: "inbound connections full, every peer protected",
                }
            })?;
            self.inbound.remove(&victim);
            evicted = Some(victim);
        }

        self.inbound.insert(
            peer_id,
            ConnectedPeer::new(peer, ConnectionDirection::Inbound, now),
        );
        Ok(match evicted {
            Some(victim) => InboundAdmission::AddedEvicting(victim),
            None => InboundAdmission::Added,
        })
    }

    /// Register an established outbound connection. Returns false when
    /// the peer is already connected or the outbound set is full.
    pub fn add_outbound(&mut self, peer: PeerInfo, now: Timestamp) -> bool {
        if self.has_peer(&peer.peer_id) || !self.has_outbound_capacity() {
            return false;
        }
        self.outbound.insert(
            peer.peer_id.clone(),
            ConnectedPeer::new(peer, ConnectionDirection::Outbound, now),
        );
        true
    }

    pub fn remove_peer(&mut self, peer_id: &str) -> Option<ConnectedPeer> {
        self.inbound
            .remove(peer_id)
            .or_else(|| self.outbound.remove(peer_id))
    }

    /// Drain every connection, for shutdown.
    pub fn drain(&mut self) -> Vec<ConnectedPeer> {
        let mut all: Vec<ConnectedPeer> = self.inbound.drain().map(|(_, peer)| peer).collect();
        all.extend(self.outbound.drain().map(|(_, peer)| peer));
        all
    }

    pub fn connected_peers(&self) -> Vec<&ConnectedPeer> {
        self.inbound.values().chain(self.outbound.values()).collect()
    }

    pub fn outbound_peers(&self) -> Vec<&ConnectedPeer> {
        self.outbound.values().collect()
    }

    pub fn inbound_peers(&self) -> Vec<&ConnectedPeer> {
        self.inbound.values().collect()
    }

    pub fn record_message(&mut self, peer_id: &str, useful: bool) {
        if let Some(peer) = self.get_mut(peer_id) {
            peer.record_message(useful);
        }
    }

    pub fn record_unanswered_request(&mut self, peer_id: &str) {
        if let Some(peer) = self.get_mut(peer_id) {
            peer.record_unanswered_request();
        }
    }

    pub fn record_rtt(&mut self, peer_id: &str, rtt_ms: u32) {
        if let Some(peer) = self.get_mut(peer_id) {
            peer.rtt_ms = rtt_ms;
        }
    }

    /// Close the current rate interval for every peer: reset counters,
    /// penalize rate violators and report peers that crossed the ban
    /// threshold.
    pub fn run_rate_interval(&mut self) -> RateInterval {
        let mut report = RateInterval::default();
        let max_rate = self.config.ws_max_message_rate;
        let penalty = self.config.ws_max_message_rate_penalty;
        for peer in self.inbound.values_mut().chain(self.outbound.values_mut()) {
            let count = peer.reset_interval();
            if count > max_rate {
                peer.rate_penalty = peer.rate_penalty.saturating_add(penalty);
                report.offenders.push(peer.peer_id().clone());
                if peer.rate_penalty >= BAN_PENALTY {
                    report.to_ban.push(peer.peer_id().clone());
                }
            }
        }
        report
    }

    /// The outbound peer to rotate out on a shuffle tick: the youngest
    /// non-privileged connection.
    pub fn shuffle_victim(&self) -> Option<PeerId> {
        self.outbound
            .values()
            .filter(|peer| !peer.is_privileged())
            .max_by(|a, b| {
                a.connected_at
                    .cmp(&b.connected_at)
                    .then(a.peer_id().cmp(b.peer_id()))
            })
            .map(|peer| peer.peer_id().clone())
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            inbound_count: self.inbound.len(),
            outbound_count: self.outbound.len(),
            max_inbound: self.config.max_inbound_connections,
            max_outbound: self.config.max_outbound_connections,
        }
    }

    /// Protected set of the current inbound peers, for inspection.
    pub fn protected_inbound(&self) -> std::collections::HashSet<PeerId> {
        let peers: Vec<&ConnectedPeer> = self.inbound.values().collect();
        protected_peers(&peers, ProtectionRatios::from(&self.config))
    }

    fn find_inbound_eviction_victim(&self) -> Option<PeerId> {
        let peers: Vec<&ConnectedPeer> = self.inbound.values().collect();
        let protected = protected_peers(&peers, ProtectionRatios::from(&self.config));
        select_eviction_victim(&peers, &protected)
    }
}
