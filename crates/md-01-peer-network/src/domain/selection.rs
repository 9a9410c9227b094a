//! Peer selection strategies.
//!
//! The pool delegates its three selection decisions to a strategy object
//! so deployments can wire alternatives through configuration. Randomness
//! is always injected, never ambient, so selection is reproducible under
//! test.

use crate::domain::peer::{PeerId, PeerInfo};
use crate::domain::pool::ConnectedPeer;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

/// The three pluggable selection decisions.
pub trait PeerSelectionStrategy: Send + Sync {
    /// Candidates for new outbound connections, at most `limit`.
    fn select_for_connection(
        &self,
        new_peers: &[PeerInfo],
        tried_peers: &[PeerInfo],
        limit: usize,
        rng: &mut dyn RngCore,
    ) -> Vec<PeerInfo>;

    /// The peer to forward an RPC to, among connected peers whose
    /// reported height is adequate for the request.
    fn select_for_request(
        &self,
        connected: &[&ConnectedPeer],
        min_height: u64,
        rng: &mut dyn RngCore,
    ) -> Option<PeerId>;

    /// The subset of connected peers receiving a `send` fan-out.
    fn select_for_send(
        &self,
        connected: &[&ConnectedPeer],
        limit: usize,
        rng: &mut dyn RngCore,
    ) -> Vec<PeerId>;
}

/// Default strategy: connection candidates are a shuffled sample biased
/// toward tried peers; request and send selection are uniform.
pub struct DefaultSelectionStrategy {
    /// Probability of drawing the next candidate from the tried list.
    pub tried_bias: f64,
}

impl Default for DefaultSelectionStrategy {
    fn default() -> Self {
        Self { tried_bias: 0.8 }
    }
}

impl PeerSelectionStrategy for DefaultSelectionStrategy {
    fn select_for_connection(
        &self,
        new_peers: &[PeerInfo],
        tried_peers: &[PeerInfo],
        limit: usize,
        rng: &mut dyn RngCore,
    ) -> Vec<PeerInfo> {
        let mut tried: Vec<PeerInfo> = tried_peers.to_vec();
        let mut fresh: Vec<PeerInfo> = new_peers.to_vec();
        tried.shuffle(rng);
        fresh.shuffle(rng);

        let mut picked = Vec::with_capacity(limit.min(tried.len() + fresh.len()));
        while picked.len() < limit && (!tried.is_empty() || !fresh.is_empty()) {
            let from_tried = if tried.is_empty() {
                false
            } else if fresh.is_empty() {
                true
            } else {
                rng.gen_bool(self.tried_bias)
            };
            let source = if from_tried { &mut tried } else { &mut fresh };
            if let Some(peer) = source.pop() {
                picked.push(peer);
            }
        }
        picked
    }

    fn select_for_request(
        &self,
        connected: &[&ConnectedPeer],
        min_height: u64,
        rng: &mut dyn RngCore,
    ) -> Option<PeerId> {
        let candidates: Vec<&&ConnectedPeer> = connected
            .iter()
            .filter(|peer| peer.peer.shared_state.chain_height >= min_height)
            .collect();
        candidates.choose(rng).map(|peer| peer.peer_id().clone())
    }

    fn select_for_send(
        &self,
        connected: &[&ConnectedPeer],
        limit: usize,
        rng: &mut dyn RngCore,
    ) -> Vec<PeerId> {
        let mut ids: Vec<PeerId> = connected.iter().map(|peer| peer.peer_id().clone()).collect();
        ids.shuffle(rng);
        ids.truncate(limit);
        ids
    }
}
