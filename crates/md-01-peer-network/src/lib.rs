//! # MD-01 Peer Network - P2P Subsystem
//!
//! Peer bookkeeping and connection management for the Meridian node:
//! a bucketed new/tried address book, a bounded connection pool with
//! protection-ratio eviction, and a coordinator tying both to the wire
//! transport.
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - **Domain Layer:** pure tables, pool and selection logic
//! - **Ports Layer:** `PeerTransport` and `TimeSource` dependencies,
//!   `NetworkApi` surface
//! - **Service Layer:** the `NetworkCoordinator` event loop
//!
//! ## Security Features
//!
//! - **Eclipse Resistance:** new/tried segregation with secret-keyed
//!   deterministic bucket placement
//! - **Eviction Protection:** netgroup, latency, productivity and
//!   longevity ratios shield honest long-lived connections
//! - **Rate Defense:** per-interval message accounting with escalating
//!   penalties up to a timed ban
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | A peer id lives in at most one table | `domain/address_book/book.rs` - `add_peer()` / `upgrade_peer()` |
//! | Privileged peers survive downgrades and eviction | `book.rs` - `downgrade_peer()`, `pool/protection.rs` |
//! | Discovery responses respect the payload budget | `service/coordinator.rs` - `build_peers_list()` |
//!
//! ## Concurrency
//!
//! Tables, pool and ban set mutate only on the coordinator's event-loop
//! task; the three maintenance timers are multiplexed onto that task and
//! cannot race. Locks are never held across an await.

pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod metrics;
pub mod ports;
pub mod service;

pub use config::{NetworkConfig, PeerAddress};
pub use domain::{
    peer_id_from_parts, serialized_size, AddressBookConfig, AddressBookStats, BannedIps,
    ConnectedPeer, DefaultSelectionStrategy, DowngradeOutcome, InboundAdmission, NetgroupKey,
    PeerAddressBook, PeerId, PeerInfo, PeerInfoPublic, PeerInternalState, PeerKind, PeerPool,
    PeerPoolConfig, PeerSelectionStrategy, PeerSharedState, PeersListResponse, PlacementSecret,
    PoolStats,
};
pub use error::{NetworkError, NetworkResult};
pub use events::NetworkEvent;
pub use ports::inbound::NetworkApi;
pub use ports::outbound::{PeerTransport, SystemTimeSource, TimeSource};
pub use service::NetworkCoordinator;
