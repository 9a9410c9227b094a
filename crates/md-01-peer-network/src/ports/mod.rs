//! Port definitions for the peer network subsystem.

pub mod inbound;
pub mod outbound;

pub use inbound::NetworkApi;
pub use outbound::{PeerTransport, SystemTimeSource, TimeSource};
