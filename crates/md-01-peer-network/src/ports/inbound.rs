//! Driving Ports (API - Inbound)

use crate::domain::peer::{PeerSharedState, PeersListResponse};
use crate::error::NetworkResult;
use async_trait::async_trait;
use serde_json::Value;
use std::net::IpAddr;

/// Primary network API, implemented by the coordinator.
#[async_trait]
pub trait NetworkApi: Send + Sync {
    /// Register the instance, seed the address book and start the timers.
    async fn start(&self) -> NetworkResult<()>;

    /// Cancel timers, close every socket and reject further requests with
    /// `NodeNotReady`.
    async fn stop(&self) -> NetworkResult<()>;

    /// Forward an RPC to one selected peer of adequate height.
    async fn request(
        &self,
        procedure: &str,
        payload: Value,
        min_height: u64,
    ) -> NetworkResult<Value>;

    /// Fan a message out to the configured send subset.
    async fn send(&self, event: &str, payload: Value) -> NetworkResult<()>;

    /// Fan a message out to every outbound peer.
    async fn broadcast(&self, event: &str, payload: Value) -> NetworkResult<()>;

    /// Build the discovery response: a sanitized randomized sample capped
    /// by the payload budget.
    async fn get_peers_list(&self) -> NetworkResult<PeersListResponse>;

    /// Ban a peer's address and evict it everywhere (unless whitelisted).
    async fn ban_peer(&self, peer_id: &str) -> NetworkResult<()>;

    /// Explicitly evict a peer from the book and the pool.
    async fn remove_peer(&self, peer_id: &str) -> NetworkResult<()>;

    /// Push this node's shared state to every connected peer. Per-peer
    /// failures surface as `FailedToPushNodeInfo` events.
    async fn push_node_info(&self, info: Value) -> NetworkResult<()>;

    /// Admit a new inbound socket.
    async fn on_inbound_connection(
        &self,
        ip_address: IpAddr,
        ws_port: u16,
        shared_state: PeerSharedState,
        advertise_address: bool,
    ) -> NetworkResult<()>;
}
