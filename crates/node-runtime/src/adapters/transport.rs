//! Placeholder transport.
//!
//! The WebSocket cluster adapter plugs in here; until it is wired, the
//! node runs its bookkeeping loops against a transport that reports
//! itself offline rather than pretending connections succeed.

use async_trait::async_trait;
use md_01_peer_network::{NetworkError, NetworkResult, PeerInfo, PeerTransport};
use serde_json::Value;

pub struct NullTransport;

#[async_trait]
impl PeerTransport for NullTransport {
    async fn connect(&self, peer: &PeerInfo) -> NetworkResult<()> {
        tracing::debug!(peer_id = %peer.peer_id, "transport offline, connect skipped");
        Err(NetworkError::Transport("transport offline".into()))
    }

    async fn request(
        &self,
        peer_id: &String,
        procedure: &str,
        _payload: Value,
    ) -> NetworkResult<Value> {
        tracing::debug!(%peer_id, procedure, "transport offline, request skipped");
        Err(NetworkError::Transport("transport offline".into()))
    }

    async fn send(&self, peer_id: &String, event: &str, _payload: Value) -> NetworkResult<()> {
        tracing::debug!(%peer_id, event, "transport offline, send skipped");
        Err(NetworkError::Transport("transport offline".into()))
    }

    async fn close(&self, _peer_id: &String, _status_code: u16) -> NetworkResult<()> {
        Ok(())
    }
}
