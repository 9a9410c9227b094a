//! Driven Ports (SPI - Outbound Dependencies)

use crate::domain::peer::{PeerId, PeerInfo};
use crate::error::NetworkResult;
use async_trait::async_trait;
use serde_json::Value;
use shared_types::Timestamp;

/// Socket-layer operations, implemented by the wire transport.
///
/// Per-peer delivery is FIFO; the transport owns the ordering guarantee.
/// Failures surface as errors here and become events at the coordinator,
/// never panics.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Open an outbound connection to the peer.
    async fn connect(&self, peer: &PeerInfo) -> NetworkResult<()>;

    /// Issue an RPC and await its response.
    async fn request(&self, peer_id: &PeerId, procedure: &str, payload: Value)
        -> NetworkResult<Value>;

    /// Fire-and-forget message.
    async fn send(&self, peer_id: &PeerId, event: &str, payload: Value) -> NetworkResult<()>;

    /// Close the peer's socket with a status code.
    async fn close(&self, peer_id: &PeerId, status_code: u16) -> NetworkResult<()>;
}

/// Clock abstraction so domain timing is testable.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time source.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        let secs = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0);
        Timestamp::new(secs)
    }
}
