//! Pool type definitions.

use crate::domain::peer::{NetgroupKey, PeerId, PeerInfo};
use shared_types::Timestamp;

/// Direction of an active connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionDirection {
    Inbound,
    Outbound,
}

/// Per-connection bookkeeping.
#[derive(Debug, Clone)]
pub struct ConnectedPeer {
    pub peer: PeerInfo,
    pub direction: ConnectionDirection,
    pub netgroup: NetgroupKey,
    /// When the connection was established.
    pub connected_at: Timestamp,
    /// Measured round-trip time, u32::MAX until first measurement.
    pub rtt_ms: u32,
    /// Messages received in the current rate interval.
    pub interval_message_count: u32,
    /// Messages received over the connection's lifetime.
    pub total_messages: u64,
    /// Messages that advanced the node (valid blocks, useful responses).
    pub useful_messages: u64,
    /// Accumulated rate penalty; reaching the ban threshold bans the peer.
    pub rate_penalty: u32,
}

impl ConnectedPeer {
    pub fn new(peer: PeerInfo, direction: ConnectionDirection, now: Timestamp) -> Self {
        let netgroup = peer.netgroup();
        Self {
            peer,
            direction,
            netgroup,
            connected_at: now,
            rtt_ms: u32::MAX,
            interval_message_count: 0,
            total_messages: 0,
            useful_messages: 0,
            rate_penalty: 0,
        }
    }

    /// Useful-message ratio. A peer that has not spoken yet is treated as
    /// fully productive so it is not evicted before it had a chance.
    pub fn productivity(&self) -> f64 {
        if self.total_messages == 0 {
            1.0
        } else {
            self.useful_messages as f64 / self.total_messages as f64
        }
    }

    pub fn record_message(&mut self, useful: bool) {
        self.interval_message_count = self.interval_message_count.saturating_add(1);
        self.total_messages = self.total_messages.saturating_add(1);
        if useful {
            self.useful_messages = self.useful_messages.saturating_add(1);
        }
    }

    /// An issued request that never got its acknowledgement drags the
    /// useful-message ratio down without counting toward the rate.
    pub fn record_unanswered_request(&mut self) {
        self.total_messages = self.total_messages.saturating_add(1);
    }

    /// Close the current rate interval, returning its message count.
    pub fn reset_interval(&mut self) -> u32 {
        std::mem::take(&mut self.interval_message_count)
    }

    pub fn uptime_secs(&self, now: Timestamp) -> u64 {
        now.as_secs().saturating_sub(self.connected_at.as_secs())
    }

    pub fn is_privileged(&self) -> bool {
        self.peer.internal_state.kind.is_privileged()
    }

    pub fn peer_id(&self) -> &PeerId {
        &self.peer.peer_id
    }
}

/// Snapshot of pool occupancy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub inbound_count: usize,
    pub outbound_count: usize,
    pub max_inbound: usize,
    pub max_outbound: usize,
}

/// Outcome of one rate-calculation interval.
#[derive(Debug, Clone, Default)]
pub struct RateInterval {
    /// Peers that exceeded the message rate this interval.
    pub offenders: Vec<PeerId>,
    /// Peers whose accumulated penalty crossed the ban threshold.
    pub to_ban: Vec<PeerId>,
}
