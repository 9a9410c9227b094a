//! Subsystem construction and wiring.

use crate::adapters::{InMemoryChainStateStore, NullTransport, StaticDelegateSchedule};
use crate::config::NodeConfig;
use md_01_peer_network::{
    DefaultSelectionStrategy, NetworkCoordinator, NetworkEvent, SystemTimeSource,
};
use md_02_bft_finality::FinalityService;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

/// A wired node: both cores plus their adapters.
pub struct Node {
    pub finality: Arc<FinalityService<InMemoryChainStateStore, StaticDelegateSchedule>>,
    pub network: NetworkCoordinator<NullTransport>,
    pub chain_state: Arc<InMemoryChainStateStore>,
    pub schedule: Arc<StaticDelegateSchedule>,
    network_events: Option<UnboundedReceiver<NetworkEvent>>,
}

impl Node {
    /// Take the network event stream; yields once.
    pub fn take_network_events(&mut self) -> Option<UnboundedReceiver<NetworkEvent>> {
        self.network_events.take()
    }
}

/// Build both subsystems against the in-memory adapters.
pub async fn build_node(config: &NodeConfig) -> anyhow::Result<Node> {
    let chain_state = Arc::new(InMemoryChainStateStore::new(config.finalized_height));
    let schedule = Arc::new(StaticDelegateSchedule::new());

    let finality = Arc::new(
        FinalityService::init(
            config.active_delegates,
            chain_state.clone(),
            schedule.clone(),
        )
        .await?,
    );
    finality.on_finality_changed(Box::new(|signal| {
        tracing::info!(height = signal.finalized_height, "block finalized");
    }));

    let (network, network_events) = NetworkCoordinator::new(
        config.network.clone(),
        Arc::new(NullTransport),
        Box::new(DefaultSelectionStrategy::default()),
        Arc::new(SystemTimeSource),
    );

    Ok(Node {
        finality,
        network,
        chain_state,
        schedule,
        network_events: Some(network_events),
    })
}
