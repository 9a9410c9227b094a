//! # Peer Pool - Live Connection Management
//!
//! Bounded inbound/outbound connection sets with protection-ratio
//! eviction. When the inbound set is full, a new arrival may only
//! displace a peer that no protection shields: network-group diversity,
//! latency, productivity and longevity each protect a configured
//! fraction of the set, and privileged peers are never candidates.

mod config;
mod manager;
mod protection;
mod types;

pub use config::PeerPoolConfig;
pub use manager::{InboundAdmission, PeerPool};
pub use protection::{protected_peers, select_eviction_victim, ProtectionRatios};
pub use types::{ConnectedPeer, ConnectionDirection, PoolStats, RateInterval};
