//! Peer identity and state entities.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::net::IpAddr;

/// Canonical peer identifier: `"ip:port"`.
pub type PeerId = String;

/// Build the canonical peer id for an address.
pub fn peer_id_from_parts(ip: &IpAddr, ws_port: u16) -> PeerId {
    format!("{ip}:{ws_port}")
}

/// Network group used for diversity accounting.
///
/// IPv4 peers group by /16 (the first two octets); IPv6 peers by the
/// first four octets. Peers in one group are assumed to share an
/// operator or ISP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NetgroupKey(pub [u8; 4]);

impl NetgroupKey {
    pub fn from_ip(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(v4) => {
                let o = v4.octets();
                Self([o[0], o[1], 0, 0])
            }
            IpAddr::V6(v6) => {
                let o = v6.octets();
                Self([o[0], o[1], o[2], o[3]])
            }
        }
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

/// How a peer entered this node's view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeerKind {
    Seed,
    Fixed,
    Whitelisted,
    Previous,
    Inbound,
    Outbound,
}

impl PeerKind {
    /// Seed, fixed and whitelisted peers are exempt from downgrade
    /// removal and unconditionally protected from eviction.
    pub fn is_privileged(&self) -> bool {
        matches!(self, Self::Seed | Self::Fixed | Self::Whitelisted)
    }
}

/// Externally visible peer attributes, merged on `update_peer`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PeerSharedState {
    /// Protocol version string advertised by the peer.
    pub protocol_version: String,
    /// Chain height the peer last reported.
    pub chain_height: u64,
    /// Peer-chosen connection nonce.
    pub nonce: Option<String>,
    /// Free-form advertised attributes (os, wallet flags, ...).
    pub options: BTreeMap<String, Value>,
}

impl PeerSharedState {
    /// Merge an incoming snapshot into this one. Typed fields are
    /// replaced, options are merged key-wise.
    pub fn merge(&mut self, incoming: &PeerSharedState) {
        self.protocol_version = incoming.protocol_version.clone();
        self.chain_height = incoming.chain_height;
        if incoming.nonce.is_some() {
            self.nonce = incoming.nonce.clone();
        }
        for (key, value) in &incoming.options {
            self.options.insert(key.clone(), value.clone());
        }
    }
}

/// Node-local peer attributes, never shared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerInternalState {
    pub kind: PeerKind,
    /// Peers that opt out of advertisement are filtered from discovery
    /// responses.
    pub advertise_address: bool,
    pub connection_attempts: u32,
    pub failed_attempts: u32,
}

impl PeerInternalState {
    pub fn new(kind: PeerKind) -> Self {
        Self {
            kind,
            advertise_address: true,
            connection_attempts: 0,
            failed_attempts: 0,
        }
    }
}

/// Complete peer record as held by the address book and the pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerInfo {
    pub peer_id: PeerId,
    pub ip_address: IpAddr,
    pub ws_port: u16,
    pub shared_state: PeerSharedState,
    pub internal_state: PeerInternalState,
}

impl PeerInfo {
    pub fn new(ip_address: IpAddr, ws_port: u16, kind: PeerKind) -> Self {
        Self {
            peer_id: peer_id_from_parts(&ip_address, ws_port),
            ip_address,
            ws_port,
            shared_state: PeerSharedState::default(),
            internal_state: PeerInternalState::new(kind),
        }
    }

    pub fn netgroup(&self) -> NetgroupKey {
        NetgroupKey::from_ip(&self.ip_address)
    }

    /// Sanitized view for discovery responses: address plus shared state,
    /// nothing internal.
    pub fn public_view(&self) -> PeerInfoPublic {
        PeerInfoPublic {
            ip_address: self.ip_address.to_string(),
            ws_port: self.ws_port,
            protocol_version: self.shared_state.protocol_version.clone(),
            chain_height: self.shared_state.chain_height,
            options: self.shared_state.options.clone(),
        }
    }
}

/// Discovery-safe peer representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerInfoPublic {
    pub ip_address: String,
    pub ws_port: u16,
    pub protocol_version: String,
    pub chain_height: u64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, Value>,
}

/// Response payload of the `getPeersList` procedure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeersListResponse {
    pub success: bool,
    pub peers: Vec<PeerInfoPublic>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_peer_id_is_canonical() {
        let ip = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7));
        assert_eq!(peer_id_from_parts(&ip, 7001), "10.0.0.7:7001");
    }

    #[test]
    fn test_netgroup_is_slash_16_for_ipv4() {
        let a = NetgroupKey::from_ip(&IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1)));
        let b = NetgroupKey::from_ip(&IpAddr::V4(Ipv4Addr::new(192, 168, 200, 9)));
        let c = NetgroupKey::from_ip(&IpAddr::V4(Ipv4Addr::new(192, 169, 1, 1)));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_shared_state_merge_is_keywise() {
        let mut state = PeerSharedState {
            protocol_version: "1.0".into(),
            chain_height: 10,
            nonce: Some("abc".into()),
            options: BTreeMap::from([("os".to_string(), Value::from("linux"))]),
        };
        let incoming = PeerSharedState {
            protocol_version: "1.1".into(),
            chain_height: 12,
            nonce: None,
            options: BTreeMap::from([("wallet".to_string(), Value::from(true))]),
        };
        state.merge(&incoming);
        assert_eq!(state.protocol_version, "1.1");
        assert_eq!(state.chain_height, 12);
        assert_eq!(state.nonce.as_deref(), Some("abc"));
        assert_eq!(state.options.len(), 2);
    }
}
