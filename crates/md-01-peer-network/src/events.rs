//! Network lifecycle events.
//!
//! One sum type instead of stringly-named topics: every observable
//! transition in the coordinator, pool or book surfaces as a variant on
//! the coordinator's event channel.

use crate::domain::peer::PeerId;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Events emitted on the coordinator's channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkEvent {
    NewInboundPeer { peer_id: PeerId },
    OutboundConnect { peer_id: PeerId },
    OutboundConnectAbort { peer_id: PeerId },
    CloseInbound { peer_id: PeerId },
    CloseOutbound { peer_id: PeerId },
    RemovePeer { peer_id: PeerId },
    BanPeer { peer_id: PeerId, ip_address: IpAddr },
    UnbanPeer { ip_address: IpAddr },
    DiscoveredPeer { peer_id: PeerId },
    UpdatedPeerInfo { peer_id: PeerId },
    MessageReceived { peer_id: PeerId, event: String },
    RequestReceived { peer_id: PeerId, procedure: String },
    NetworkReady,
    FailedPeerInfoUpdate { peer_id: PeerId, reason: String },
    FailedToFetchPeerInfo { peer_id: PeerId, reason: String },
    FailedToFetchPeers { reason: String },
    FailedToPushNodeInfo { peer_id: PeerId, reason: String },
    FailedToSendMessage { peer_id: PeerId, reason: String },
    FailedToAddInboundPeer { peer_id: PeerId, reason: String },
    InboundSocketError { peer_id: PeerId, reason: String },
    OutboundSocketError { peer_id: PeerId, reason: String },
    FailedToCollectPeerDetailsOnConnect { peer_id: PeerId },
}
