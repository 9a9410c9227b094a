//! Error types for the peer network subsystem.

use crate::domain::peer::{PeerId, PeerInfo};
use thiserror::Error;

/// Peer network subsystem errors.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The address is already present in the book. Carries the existing
    /// entry so the caller can refresh it instead of inserting.
    #[error("peer {} already exists in the address book", .peer.peer_id)]
    ExistingPeer { peer: Box<PeerInfo> },

    /// Inbound handshake rejected (duplicate, banned or invalid).
    #[error("inbound handshake rejected for {peer_id}: {reason}")]
    PeerInboundHandshake { peer_id: PeerId, reason: &'static str },

    /// A request was issued while the coordinator is stopped.
    #[error("network coordinator is not running")]
    NodeNotReady,

    /// Two coordinators were started with the same node nonce.
    #[error("a coordinator is already registered for node nonce {0}")]
    DuplicateInstance(String),

    /// The peer is not known to the book or the pool.
    #[error("peer {0} not found")]
    PeerNotFound(PeerId),

    /// A request did not receive its acknowledgement in time.
    #[error("request to {peer_id} timed out after {timeout_ms} ms")]
    RequestTimeout { peer_id: PeerId, timeout_ms: u64 },

    /// No connected peer satisfied the selection constraints.
    #[error("no eligible peer for {0}")]
    NoEligiblePeer(&'static str),

    /// Transport-level failure surfaced by the socket layer.
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Result type for peer network operations.
pub type NetworkResult<T> = Result<T, NetworkError>;
