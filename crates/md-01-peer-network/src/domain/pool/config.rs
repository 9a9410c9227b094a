//! Peer pool configuration.

/// Configuration for the live connection pool.
#[derive(Debug, Clone)]
pub struct PeerPoolConfig {
    /// Maximum inbound connections.
    pub max_inbound_connections: usize,
    /// Maximum outbound connections.
    pub max_outbound_connections: usize,
    /// Fraction of inbound peers protected for network-group diversity.
    pub netgroup_protection_ratio: f64,
    /// Fraction protected for best round-trip latency.
    pub latency_protection_ratio: f64,
    /// Fraction protected for highest useful-message ratio.
    pub productivity_protection_ratio: f64,
    /// Fraction protected for longest connection uptime.
    pub longevity_protection_ratio: f64,
    /// Messages per rate interval a peer may send without penalty.
    pub ws_max_message_rate: u32,
    /// Penalty applied for each interval above the rate.
    pub ws_max_message_rate_penalty: u32,
    /// Peers receiving each `send` fan-out.
    pub send_peer_limit: usize,
}

/// Accumulated penalty at which a peer is banned.
pub(crate) const BAN_PENALTY: u32 = 100;

impl Default for PeerPoolConfig {
    fn default() -> Self {
        Self {
            max_inbound_connections: 100,
            max_outbound_connections: 20,
            netgroup_protection_ratio: 0.034,
            latency_protection_ratio: 0.068,
            productivity_protection_ratio: 0.068,
            longevity_protection_ratio: 0.5,
            ws_max_message_rate: 100,
            ws_max_message_rate_penalty: 10,
            send_peer_limit: 25,
        }
    }
}

impl PeerPoolConfig {
    /// Testing config with a small pool and even protection ratios.
    #[cfg(test)]
    pub fn for_testing() -> Self {
        Self {
            max_inbound_connections: 10,
            max_outbound_connections: 4,
            netgroup_protection_ratio: 0.1,
            latency_protection_ratio: 0.1,
            productivity_protection_ratio: 0.1,
            longevity_protection_ratio: 0.1,
            ws_max_message_rate: 10,
            ws_max_message_rate_penalty: 10,
            send_peer_limit: 3,
        }
    }
}
