//! Network coordinator: glue between the address book, the pool and the
//! transport.
//!
//! All table and pool mutations happen on one logical task; the three
//! maintenance timers are multiplexed onto it with `select!` and can
//! never race each other. Locks are never held across an await.

use crate::config::NetworkConfig;
use crate::domain::peer::{
    peer_id_from_parts, PeerId, PeerInfo, PeerKind, PeerSharedState, PeersListResponse,
};
use crate::domain::{
    serialized_size, BannedIps, ConnectionDirection, DowngradeOutcome, InboundAdmission,
    PeerAddressBook, PeerPool, PeerSelectionStrategy, PlacementSecret,
};
use crate::error::{NetworkError, NetworkResult};
use crate::events::NetworkEvent;
use crate::metrics;
use crate::ports::inbound::NetworkApi;
use crate::ports::outbound::{PeerTransport, TimeSource};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::Value;
use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Close status: node is shutting down.
const CLOSE_STATUS_SHUTDOWN: u16 = 1001;
/// Close status: peer displaced by eviction or rotation.
const CLOSE_STATUS_EVICTED: u16 = 4100;
/// Close status: peer banned.
const CLOSE_STATUS_BANNED: u16 = 4101;

/// Process-wide registry of running coordinator identities.
fn instance_registry() -> &'static Mutex<HashSet<String>> {
    static REGISTRY: OnceLock<Mutex<HashSet<String>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashSet::new()))
}

/// The network coordinator.
///
/// Cheap to clone; all state lives behind one shared inner.
pub struct NetworkCoordinator<T: PeerTransport + 'static> {
    inner: Arc<Inner<T>>,
}

impl<T: PeerTransport + 'static> Clone for NetworkCoordinator<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

pub(crate) struct Inner<T: PeerTransport> {
    pub(crate) config: NetworkConfig,
    pub(crate) book: RwLock<PeerAddressBook>,
    pub(crate) pool: RwLock<PeerPool>,
    pub(crate) banned: RwLock<BannedIps>,
    strategy: Box<dyn PeerSelectionStrategy>,
    transport: Arc<T>,
    time: Arc<dyn TimeSource>,
    events: mpsc::UnboundedSender<NetworkEvent>,
    rng: Mutex<StdRng>,
    running: AtomicBool,
    timer_task: Mutex<Option<JoinHandle<()>>>,
}

impl<T: PeerTransport + 'static> NetworkCoordinator<T> {
    /// Create a coordinator and the receiving end of its event channel.
    pub fn new(
        config: NetworkConfig,
        transport: Arc<T>,
        strategy: Box<dyn PeerSelectionStrategy>,
        time: Arc<dyn TimeSource>,
    ) -> (Self, mpsc::UnboundedReceiver<NetworkEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let book = PeerAddressBook::new(
            PlacementSecret::from_bytes(config.secret),
            config.address_book.clone(),
        );
        let pool = PeerPool::new(config.pool.clone());
        let coordinator = Self {
            inner: Arc::new(Inner {
                config,
                book: RwLock::new(book),
                pool: RwLock::new(pool),
                banned: RwLock::new(BannedIps::new()),
                strategy,
                transport,
                time,
                events,
                rng: Mutex::new(StdRng::from_entropy()),
                running: AtomicBool::new(false),
                timer_task: Mutex::new(None),
            }),
        };
        (coordinator, receiver)
    }

    #[cfg(test)]
    pub(crate) fn inner(&self) -> &Inner<T> {
        &self.inner
    }

    /// Record a message arriving from a peer (called by the transport).
    pub fn on_message_received(&self, peer_id: &str, event: &str, useful: bool) {
        self.inner.on_message_received(peer_id, event, useful);
    }

    /// Record an RPC arriving from a peer (called by the transport).
    pub fn on_request_received(&self, peer_id: &str, procedure: &str) {
        self.inner.on_request_received(peer_id, procedure);
    }

    /// Merge a fresh shared-state snapshot for a known peer.
    pub fn update_peer_info(&self, peer_id: &str, shared: &PeerSharedState) {
        self.inner.update_peer_info(peer_id, shared);
    }

    /// Refresh a known peer's shared state on demand. Failure is also
    /// surfaced as `FailedToFetchPeerInfo` on the event channel.
    pub async fn fetch_peer_info(&self, peer_id: &str) -> NetworkResult<()> {
        self.inner.ensure_running()?;
        self.inner.fetch_peer_info(peer_id).await
    }

    /// Fold an address learned out-of-band (e.g. from a handshake
    /// payload) into the book. Emits `DiscoveredPeer` when it is new;
    /// an already-known address is left untouched.
    pub fn add_discovered_peer(&self, peer: PeerInfo, source_ip: IpAddr) -> NetworkResult<()> {
        let now = self.inner.time.now();
        let peer_id = peer.peer_id.clone();
        match self.inner.book.write().add_peer(peer, &source_ip, now) {
            Ok(()) => {
                self.inner.emit(NetworkEvent::DiscoveredPeer { peer_id });
                Ok(())
            }
            Err(NetworkError::ExistingPeer { .. }) => Ok(()),
            Err(error) => Err(error),
        }
    }

    /// Address book occupancy snapshot.
    pub fn book_stats(&self) -> crate::domain::AddressBookStats {
        self.inner.book.read().stats()
    }

    /// Connection pool occupancy snapshot.
    pub fn pool_stats(&self) -> crate::domain::PoolStats {
        self.inner.pool.read().stats()
    }
}

#[async_trait]
impl<T: PeerTransport + 'static> NetworkApi for NetworkCoordinator<T> {
    async fn start(&self) -> NetworkResult<()> {
        {
            let mut registry = instance_registry().lock();
            if !registry.insert(self.inner.config.node_nonce.clone()) {
                return Err(NetworkError::DuplicateInstance(
                    self.inner.config.node_nonce.clone(),
                ));
            }
        }
        self.inner.running.store(true, Ordering::SeqCst);
        self.inner.seed_address_book();

        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move { run_timers(inner).await });
        *self.inner.timer_task.lock() = Some(handle);

        self.inner.emit(NetworkEvent::NetworkReady);
        tracing::info!(nonce = %self.inner.config.node_nonce, "network coordinator started");
        Ok(())
    }

    async fn stop(&self) -> NetworkResult<()> {
        if !self.inner.running.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        if let Some(handle) = self.inner.timer_task.lock().take() {
            handle.abort();
        }
        let drained = self.inner.pool.write().drain();
        for peer in &drained {
            let _ = self
                .inner
                .transport
                .close(peer.peer_id(), CLOSE_STATUS_SHUTDOWN)
                .await;
        }
        instance_registry()
            .lock()
            .remove(&self.inner.config.node_nonce);
        tracing::info!(nonce = %self.inner.config.node_nonce, "network coordinator stopped");
        Ok(())
    }

    async fn request(
        &self,
        procedure: &str,
        payload: Value,
        min_height: u64,
    ) -> NetworkResult<Value> {
        self.inner.ensure_running()?;
        let peer_id = {
            let pool = self.inner.pool.read();
            let peers = pool.connected_peers();
            let mut rng = self.inner.rng.lock();
            self.inner
                .strategy
                .select_for_request(&peers, min_height, &mut *rng)
        }
        .ok_or(NetworkError::NoEligiblePeer("request"))?;

        let timeout_ms = self.inner.config.ack_timeout_ms;
        let pending = self
            .inner
            .transport
            .request(&peer_id, procedure, payload);
        match tokio::time::timeout(Duration::from_millis(timeout_ms), pending).await {
            Ok(Ok(response)) => {
                self.inner.pool.write().record_message(&peer_id, true);
                Ok(response)
            }
            Ok(Err(error)) => {
                self.inner.emit_socket_error(&peer_id, error.to_string());
                Err(error)
            }
            Err(_) => {
                // Unanswered requests erode productivity; bans only come
                // from the rate accounting.
                self.inner.pool.write().record_unanswered_request(&peer_id);
                Err(NetworkError::RequestTimeout {
                    peer_id,
                    timeout_ms,
                })
            }
        }
    }

    async fn send(&self, event: &str, payload: Value) -> NetworkResult<()> {
        self.inner.ensure_running()?;
        let targets = {
            let pool = self.inner.pool.read();
            let peers = pool.connected_peers();
            let mut rng = self.inner.rng.lock();
            self.inner.strategy.select_for_send(
                &peers,
                self.inner.config.pool.send_peer_limit,
                &mut *rng,
            )
        };
        self.inner.fan_out(&targets, event, payload).await;
        Ok(())
    }

    async fn broadcast(&self, event: &str, payload: Value) -> NetworkResult<()> {
        self.inner.ensure_running()?;
        let targets: Vec<PeerId> = {
            let pool = self.inner.pool.read();
            pool.outbound_peers()
                .iter()
                .map(|peer| peer.peer_id().clone())
                .collect()
        };
        self.inner.fan_out(&targets, event, payload).await;
        Ok(())
    }

    async fn get_peers_list(&self) -> NetworkResult<PeersListResponse> {
        self.inner.ensure_running()?;
        Ok(self.inner.build_peers_list())
    }

    async fn ban_peer(&self, peer_id: &str) -> NetworkResult<()> {
        self.inner.ban_peer(peer_id).await
    }

    async fn remove_peer(&self, peer_id: &str) -> NetworkResult<()> {
        self.inner.remove_peer(peer_id).await
    }

    async fn push_node_info(&self, info: Value) -> NetworkResult<()> {
        self.inner.ensure_running()?;
        let targets: Vec<PeerId> = {
            let pool = self.inner.pool.read();
            pool.connected_peers()
                .iter()
                .map(|peer| peer.peer_id().clone())
                .collect()
        };
        for peer_id in targets {
            if let Err(error) = self
                .inner
                .transport
                .send(&peer_id, "postNodeInfo", info.clone())
                .await
            {
                self.inner.emit(NetworkEvent::FailedToPushNodeInfo {
                    peer_id: peer_id.clone(),
                    reason: error.to_string(),
                });
            }
        }
        Ok(())
    }

    async fn on_inbound_connection(
        &self,
        ip_address: IpAddr,
        ws_port: u16,
        shared_state: PeerSharedState,
        advertise_address: bool,
    ) -> NetworkResult<()> {
        self.inner.ensure_running()?;
        self.inner
            .admit_inbound(ip_address, ws_port, shared_state, advertise_address)
            .await
    }
}

impl<T: PeerTransport> Inner<T> {
    fn emit(&self, event: NetworkEvent) {
        // A closed receiver only means nobody is listening anymore.
        let _ = self.events.send(event);
    }

    /// Surface a transport-level failure as the direction-appropriate
    /// socket-error event. The pool keeps operating.
    fn emit_socket_error(&self, peer_id: &str, reason: String) {
        let direction = self.pool.read().get(peer_id).map(|peer| peer.direction);
        match direction {
            Some(ConnectionDirection::Inbound) => self.emit(NetworkEvent::InboundSocketError {
                peer_id: peer_id.to_string(),
                reason,
            }),
            _ => self.emit(NetworkEvent::OutboundSocketError {
                peer_id: peer_id.to_string(),
                reason,
            }),
        }
    }

    fn ensure_running(&self) -> NetworkResult<()> {
        if self.running.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(NetworkError::NodeNotReady)
        }
    }

    fn is_whitelisted_ip(&self, ip: &IpAddr) -> bool {
        self.config
            .whitelisted_peers
            .iter()
            .any(|address| address.ip_address == *ip)
    }

    /// Load configured peers into the book; everything but seeds is
    /// upgraded to tried immediately.
    fn seed_address_book(&self) {
        let now = self.time.now();
        let mut book = self.book.write();
        let groups = [
            (PeerKind::Seed, &self.config.seed_peers),
            (PeerKind::Fixed, &self.config.fixed_peers),
            (PeerKind::Whitelisted, &self.config.whitelisted_peers),
            (PeerKind::Previous, &self.config.previous_peers),
        ];
        for (kind, addresses) in groups {
            for address in addresses {
                let peer = PeerInfo::new(address.ip_address, address.ws_port, kind);
                let peer_id = peer.peer_id.clone();
                let source = address.ip_address;
                match book.add_peer(peer, &source, now) {
                    Ok(()) | Err(NetworkError::ExistingPeer { .. }) => {}
                    Err(error) => {
                        tracing::warn!(%peer_id, %error, "failed to seed address book");
                        continue;
                    }
                }
                if kind != PeerKind::Seed {
                    let _ = book.upgrade_peer(&peer_id, now);
                }
            }
        }
        metrics::set_book_counts(book.new_count(), book.tried_count());
    }

    async fn fan_out(&self, targets: &[PeerId], event: &str, payload: Value) {
        for peer_id in targets {
            if let Err(error) = self
                .transport
                .send(peer_id, event, payload.clone())
                .await
            {
                self.emit(NetworkEvent::FailedToSendMessage {
                    peer_id: peer_id.clone(),
                    reason: error.to_string(),
                });
            }
        }
    }

    fn build_peers_list(&self) -> PeersListResponse {
        let sample = {
            let book = self.book.read();
            let mut rng = self.rng.lock();
            book.get_randomized_peer_list(
                self.config.minimum_peer_discovery_threshold,
                self.config.max_peer_discovery_response_length,
                &mut *rng,
            )
        };
        let mut response = PeersListResponse {
            success: true,
            peers: sample.iter().map(|peer| peer.public_view()).collect(),
        };
        if serialized_size(&response) > self.config.ws_max_payload {
            let keep = (self.config.ws_max_payload / self.config.max_peer_info_size)
                .saturating_sub(1);
            response.peers.truncate(keep);
        }
        response
    }

    pub(crate) async fn admit_inbound(
        &self,
        ip_address: IpAddr,
        ws_port: u16,
        shared_state: PeerSharedState,
        advertise_address: bool,
    ) -> NetworkResult<()> {
        let peer_id = peer_id_from_parts(&ip_address, ws_port);
        let now = self.time.now();

        // Duplicate detection comes before the ban table so an operator
        // reading the events can tell the two rejections apart.
        if self.pool.read().has_peer(&peer_id) {
            self.emit(NetworkEvent::FailedToAddInboundPeer {
                peer_id: peer_id.clone(),
                reason: "duplicate connection".to_string(),
            });
            return Err(NetworkError::PeerInboundHandshake {
                peer_id,
                reason: "duplicate connection",
            });
        }

        if self.banned.read().is_banned(&ip_address, now) && !self.is_whitelisted_ip(&ip_address)
        {
            self.emit(NetworkEvent::FailedToAddInboundPeer {
                peer_id: peer_id.clone(),
                reason: "address is banned".to_string(),
            });
            return Err(NetworkError::PeerInboundHandshake {
                peer_id,
                reason: "address is banned",
            });
        }

        let mut peer = PeerInfo::new(ip_address, ws_port, PeerKind::Inbound);
        peer.shared_state = shared_state;
        peer.internal_state.advertise_address = advertise_address;

        let admission = self
            .pool
            .write()
            .add_inbound(peer.clone(), now)
            .map_err(|error| {
                self.emit(NetworkEvent::FailedToAddInboundPeer {
                    peer_id: peer_id.clone(),
                    reason: error.to_string(),
                });
                error
            })?;
        if let InboundAdmission::AddedEvicting(victim) = &admission {
            let _ = self.transport.close(victim, CLOSE_STATUS_EVICTED).await;
            self.emit(NetworkEvent::CloseInbound {
                peer_id: victim.clone(),
            });
        }

        let added = self.book.write().add_peer(peer.clone(), &ip_address, now);
        if let Err(NetworkError::ExistingPeer { .. }) = added {
            let _ = self
                .book
                .write()
                .update_peer(&peer_id, &peer.shared_state);
        }

        metrics::set_pool_counts(self.pool.read().inbound_count(), self.pool.read().outbound_count());
        self.emit(NetworkEvent::NewInboundPeer { peer_id });
        Ok(())
    }

    pub(crate) async fn ban_peer(&self, peer_id: &str) -> NetworkResult<()> {
        let peer = {
            let pool = self.pool.read();
            pool.get(peer_id).map(|connected| connected.peer.clone())
        }
        .or_else(|| self.book.read().get_peer(peer_id).cloned());
        let Some(peer) = peer else {
            return Err(NetworkError::PeerNotFound(peer_id.to_string()));
        };

        if peer.internal_state.kind.is_privileged() || self.is_whitelisted_ip(&peer.ip_address) {
            tracing::debug!(%peer_id, "refusing to ban privileged peer");
            return Ok(());
        }

        let until = self
            .time
            .now()
            .add_secs(self.config.peer_ban_time_ms / 1000);
        self.banned.write().ban(peer.ip_address, until);
        self.book.write().remove_peer(peer_id);
        if self.pool.write().remove_peer(peer_id).is_some() {
            let _ = self.transport.close(&peer_id.to_string(), CLOSE_STATUS_BANNED).await;
        }
        metrics::record_ban();
        self.emit(NetworkEvent::BanPeer {
            peer_id: peer_id.to_string(),
            ip_address: peer.ip_address,
        });
        Ok(())
    }

    /// Explicitly evict a peer from the book and the pool.
    pub(crate) async fn remove_peer(&self, peer_id: &str) -> NetworkResult<()> {
        let in_book = self.book.write().remove_peer(peer_id).is_some();
        let in_pool = self.pool.write().remove_peer(peer_id).is_some();
        if !in_book && !in_pool {
            return Err(NetworkError::PeerNotFound(peer_id.to_string()));
        }
        if in_pool {
            let _ = self
                .transport
                .close(&peer_id.to_string(), CLOSE_STATUS_EVICTED)
                .await;
        }
        self.emit(NetworkEvent::RemovePeer {
            peer_id: peer_id.to_string(),
        });
        Ok(())
    }

    /// Request a peer's node info over the transport.
    async fn request_node_info(&self, peer_id: &str) -> NetworkResult<PeerSharedState> {
        let peer_id_string = peer_id.to_string();
        let pending = self
            .transport
            .request(&peer_id_string, "getNodeInfo", Value::Null);
        let value = match tokio::time::timeout(
            Duration::from_millis(self.config.ack_timeout_ms),
            pending,
        )
        .await
        {
            Ok(Ok(value)) => value,
            Ok(Err(error)) => return Err(error),
            Err(_) => {
                return Err(NetworkError::RequestTimeout {
                    peer_id: peer_id.to_string(),
                    timeout_ms: self.config.ack_timeout_ms,
                })
            }
        };
        serde_json::from_value(value).map_err(|error| NetworkError::Transport(error.to_string()))
    }

    /// Pull a freshly connected peer's details into the book.
    async fn collect_peer_details(&self, peer_id: &str) {
        match self.request_node_info(peer_id).await {
            Ok(shared) => self.update_peer_info(peer_id, &shared),
            Err(error) => {
                tracing::debug!(%peer_id, %error, "could not collect peer details");
                self.emit(NetworkEvent::FailedToCollectPeerDetailsOnConnect {
                    peer_id: peer_id.to_string(),
                });
            }
        }
    }

    /// Refresh a known peer's shared state on demand.
    pub(crate) async fn fetch_peer_info(&self, peer_id: &str) -> NetworkResult<()> {
        match self.request_node_info(peer_id).await {
            Ok(shared) => {
                self.update_peer_info(peer_id, &shared);
                Ok(())
            }
            Err(error) => {
                self.emit(NetworkEvent::FailedToFetchPeerInfo {
                    peer_id: peer_id.to_string(),
                    reason: error.to_string(),
                });
                Err(error)
            }
        }
    }

    /// Top up outbound connections from the book.
    pub(crate) async fn populator_tick(&self) {
        if self.book.read().tried_count() < self.config.min_tried_peer_count {
            self.discover_peers().await;
        }

        let needed = {
            let pool = self.pool.read();
            self.config
                .pool
                .max_outbound_connections
                .saturating_sub(pool.outbound_count())
        };
        if needed == 0 {
            return;
        }

        let now = self.time.now();
        let candidates: Vec<PeerInfo> = {
            let book = self.book.read();
            let pool = self.pool.read();
            let banned = self.banned.read();
            let mut rng = self.rng.lock();
            self.strategy
                .select_for_connection(
                    &book.new_peers(),
                    &book.tried_peers(),
                    needed * 2,
                    &mut *rng,
                )
                .into_iter()
                .filter(|peer| !pool.has_peer(&peer.peer_id))
                .filter(|peer| !banned.is_banned(&peer.ip_address, now))
                .take(needed)
                .collect()
        };

        for peer in candidates {
            let peer_id = peer.peer_id.clone();
            match self.transport.connect(&peer).await {
                Ok(()) => {
                    let now = self.time.now();
                    if self.pool.write().add_outbound(peer, now) {
                        let _ = self.book.write().upgrade_peer(&peer_id, now);
                        self.emit(NetworkEvent::OutboundConnect {
                            peer_id: peer_id.clone(),
                        });
                        self.collect_peer_details(&peer_id).await;
                    }
                }
                Err(error) => {
                    tracing::debug!(%peer_id, %error, "outbound connect failed");
                    self.emit(NetworkEvent::OutboundSocketError {
                        peer_id: peer_id.clone(),
                        reason: error.to_string(),
                    });
                    let downgraded = self.book.write().downgrade_peer(&peer_id);
                    self.emit(NetworkEvent::OutboundConnectAbort {
                        peer_id: peer_id.clone(),
                    });
                    if let Ok(DowngradeOutcome::Evicted) = downgraded {
                        self.emit(NetworkEvent::RemovePeer { peer_id });
                    }
                }
            }
        }

        let (inbound, outbound) = {
            let pool = self.pool.read();
            (pool.inbound_count(), pool.outbound_count())
        };
        metrics::set_pool_counts(inbound, outbound);
        let (new_count, tried_count) = {
            let book = self.book.read();
            (book.new_count(), book.tried_count())
        };
        metrics::set_book_counts(new_count, tried_count);
    }

    /// Ask connected peers for their peer lists and fold the results into
    /// the book.
    pub(crate) async fn discover_peers(&self) {
        let targets: Vec<(PeerId, IpAddr)> = {
            let pool = self.pool.read();
            pool.connected_peers()
                .iter()
                .take(3)
                .map(|peer| (peer.peer_id().clone(), peer.peer.ip_address))
                .collect()
        };

        for (peer_id, source_ip) in targets {
            let pending = self
                .transport
                .request(&peer_id, "getPeersList", Value::Null);
            let response = tokio::time::timeout(
                Duration::from_millis(self.config.ack_timeout_ms),
                pending,
            )
            .await;
            let parsed: Option<PeersListResponse> = match response {
                Ok(Ok(value)) => serde_json::from_value(value).ok(),
                _ => None,
            };
            let Some(list) = parsed else {
                self.emit(NetworkEvent::FailedToFetchPeers {
                    reason: format!("no usable peer list from {peer_id}"),
                });
                continue;
            };

            let now = self.time.now();
            let mut book = self.book.write();
            for public in list.peers {
                let Ok(ip) = public.ip_address.parse::<IpAddr>() else {
                    continue;
                };
                let mut peer = PeerInfo::new(ip, public.ws_port, PeerKind::Outbound);
                peer.shared_state.protocol_version = public.protocol_version.clone();
                peer.shared_state.chain_height = public.chain_height;
                peer.shared_state.options = public.options.clone();
                let discovered_id = peer.peer_id.clone();
                match book.add_peer(peer, &source_ip, now) {
                    Ok(()) => {
                        self.emit(NetworkEvent::DiscoveredPeer {
                            peer_id: discovered_id,
                        });
                    }
                    Err(NetworkError::ExistingPeer { .. }) => {}
                    Err(error) => {
                        tracing::debug!(%error, "discovered peer rejected");
                    }
                }
            }
        }
    }

    /// Rotate the lowest-priority outbound peer out to make room for
    /// fresh candidates.
    pub(crate) async fn shuffle_tick(&self) {
        let victim = {
            let pool = self.pool.read();
            if pool.outbound_count() < self.config.pool.max_outbound_connections {
                None
            } else {
                pool.shuffle_victim()
            }
        };
        let Some(peer_id) = victim else {
            return;
        };
        self.pool.write().remove_peer(&peer_id);
        let _ = self.transport.close(&peer_id, CLOSE_STATUS_EVICTED).await;
        self.emit(NetworkEvent::CloseOutbound { peer_id });
    }

    /// Close the rate interval: penalize flooders, ban repeat offenders,
    /// lift expired bans.
    pub(crate) async fn rate_tick(&self) {
        let report = self.pool.write().run_rate_interval();
        for peer_id in report.to_ban {
            if let Err(error) = self.ban_peer(&peer_id).await {
                tracing::debug!(%peer_id, %error, "rate ban failed");
            }
        }
        let now = self.time.now();
        for ip_address in self.banned.write().gc_expired(now) {
            self.emit(NetworkEvent::UnbanPeer { ip_address });
        }
    }

    /// Record a message arriving from a peer.
    pub(crate) fn on_message_received(&self, peer_id: &str, event: &str, useful: bool) {
        self.pool.write().record_message(peer_id, useful);
        self.emit(NetworkEvent::MessageReceived {
            peer_id: peer_id.to_string(),
            event: event.to_string(),
        });
    }

    /// Record an RPC arriving from a peer.
    pub(crate) fn on_request_received(&self, peer_id: &str, procedure: &str) {
        self.pool.write().record_message(peer_id, true);
        self.emit(NetworkEvent::RequestReceived {
            peer_id: peer_id.to_string(),
            procedure: procedure.to_string(),
        });
    }

    /// Merge a fresh shared-state snapshot for a known peer.
    pub(crate) fn update_peer_info(&self, peer_id: &str, shared: &PeerSharedState) {
        match self.book.write().update_peer(peer_id, shared) {
            Ok(()) => self.emit(NetworkEvent::UpdatedPeerInfo {
                peer_id: peer_id.to_string(),
            }),
            Err(error) => self.emit(NetworkEvent::FailedPeerInfoUpdate {
                peer_id: peer_id.to_string(),
                reason: error.to_string(),
            }),
        }
    }
}

/// Timer multiplexer: one task drives all three maintenance cadences.
async fn run_timers<T: PeerTransport>(inner: Arc<Inner<T>>) {
    let mut populator =
        tokio::time::interval(Duration::from_millis(inner.config.populator_interval_ms));
    let mut shuffle = tokio::time::interval(Duration::from_millis(
        inner.config.outbound_shuffle_interval_ms,
    ));
    let mut rate = tokio::time::interval(Duration::from_millis(
        inner.config.rate_calculation_interval_ms,
    ));
    // The first tick of a fresh interval completes immediately.
    populator.tick().await;
    shuffle.tick().await;
    rate.tick().await;

    while inner.running.load(Ordering::SeqCst) {
        tokio::select! {
            _ = populator.tick() => inner.populator_tick().await,
            _ = shuffle.tick() => inner.shuffle_tick().await,
            _ = rate.tick() => inner.rate_tick().await,
        }
    }
}
