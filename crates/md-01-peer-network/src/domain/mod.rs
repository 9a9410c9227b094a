//! # Peer Network Domain
//!
//! Pure peer bookkeeping, free of sockets:
//!
//! - [`address_book`]: new/tried bucket tables with deterministic placement
//! - [`pool`]: live connection sets and protection-ratio eviction
//! - [`banned`]: IP ban table with expiry
//! - [`selection`]: pluggable peer selection strategies
//! - [`peer`]: identity and state entities

pub mod address_book;
pub mod banned;
pub mod peer;
pub mod pool;
pub mod selection;

pub use address_book::{
    AddressBookConfig, AddressBookStats, DowngradeOutcome, PeerAddressBook, PlacementSecret,
};
pub use banned::BannedIps;
pub use peer::{
    peer_id_from_parts, NetgroupKey, PeerId, PeerInfo, PeerInfoPublic, PeerInternalState,
    PeerKind, PeerSharedState, PeersListResponse,
};
pub use pool::{
    ConnectedPeer, ConnectionDirection, InboundAdmission, PeerPool, PeerPoolConfig, PoolStats,
    RateInterval,
};
pub use selection::{DefaultSelectionStrategy, PeerSelectionStrategy};

/// Serialized size of a value as it would go over the wire, for payload
/// capping. Serialization of these message types cannot fail; an error
/// degrades to "too large".
pub fn serialized_size<T: serde::Serialize>(value: &T) -> usize {
    serde_json::to_vec(value).map(|bytes| bytes.len()).unwrap_or(usize::MAX)
}
