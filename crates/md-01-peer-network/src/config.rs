//! Network subsystem configuration.

use crate::domain::{AddressBookConfig, PeerPoolConfig};
use std::net::IpAddr;

/// A configured peer address (seeds, fixed, whitelist, previous).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerAddress {
    pub ip_address: IpAddr,
    pub ws_port: u16,
}

/// Top-level configuration for the peer network subsystem.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Unique node identity; two coordinators must never share one.
    pub node_nonce: String,
    /// 32-byte placement secret, generated with the node identity and
    /// persisted alongside it.
    pub secret: [u8; 32],
    pub address_book: AddressBookConfig,
    pub pool: PeerPoolConfig,
    /// Outbound top-up cadence.
    pub populator_interval_ms: u64,
    /// Outbound rotation cadence.
    pub outbound_shuffle_interval_ms: u64,
    /// Message-rate accounting cadence.
    pub rate_calculation_interval_ms: u64,
    /// How long a ban lasts.
    pub peer_ban_time_ms: u64,
    /// Request acknowledgement timeout.
    pub ack_timeout_ms: u64,
    /// Upper bound for any serialized wire payload.
    pub ws_max_payload: usize,
    /// Worst-case serialized size of one peer info entry.
    pub max_peer_info_size: usize,
    /// Most peers ever returned from discovery.
    pub max_peer_discovery_response_length: usize,
    /// Fewest peers aimed for in a discovery response.
    pub minimum_peer_discovery_threshold: usize,
    /// Below this tried count the populator runs seed discovery.
    pub min_tried_peer_count: usize,
    pub seed_peers: Vec<PeerAddress>,
    pub fixed_peers: Vec<PeerAddress>,
    pub whitelisted_peers: Vec<PeerAddress>,
    pub previous_peers: Vec<PeerAddress>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            node_nonce: "meridian-node".to_string(),
            secret: [0u8; 32],
            address_book: AddressBookConfig::default(),
            pool: PeerPoolConfig::default(),
            populator_interval_ms: 10_000,
            outbound_shuffle_interval_ms: 300_000,
            rate_calculation_interval_ms: 1_000,
            peer_ban_time_ms: 86_400_000,
            ack_timeout_ms: 15_000,
            ws_max_payload: 1_048_576,
            max_peer_info_size: 20_480,
            max_peer_discovery_response_length: 1_000,
            minimum_peer_discovery_threshold: 100,
            min_tried_peer_count: 100,
            seed_peers: Vec::new(),
            fixed_peers: Vec::new(),
            whitelisted_peers: Vec::new(),
            previous_peers: Vec::new(),
        }
    }
}
