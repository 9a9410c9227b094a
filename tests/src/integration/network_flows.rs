//! End-to-end peer network flows: coordinator, book and pool driven
//! through a scripted transport.

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use md_01_peer_network::{
        AddressBookConfig, DefaultSelectionStrategy, DowngradeOutcome, NetworkApi,
        NetworkConfig, NetworkCoordinator, NetworkError, NetworkEvent, NetworkResult,
        PeerAddress, PeerAddressBook, PeerInfo, PeerKind, PeerSharedState, PeerTransport,
        PeersListResponse, PlacementSecret, SystemTimeSource,
    };
    use parking_lot::Mutex;
    use serde_json::Value;
    use shared_types::Timestamp;
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc::UnboundedReceiver;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    /// Transport that connects successfully and answers `getPeersList`
    /// with a scripted set of addresses.
    struct ScriptedTransport {
        discovered: Vec<(u8, u8)>,
        closes: Mutex<Vec<(String, u16)>>,
    }

    impl ScriptedTransport {
        fn new(discovered: Vec<(u8, u8)>) -> Self {
            Self {
                discovered,
                closes: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PeerTransport for ScriptedTransport {
        async fn connect(&self, _peer: &PeerInfo) -> NetworkResult<()> {
            Ok(())
        }

        async fn request(
            &self,
            _peer_id: &String,
            procedure: &str,
            _payload: Value,
        ) -> NetworkResult<Value> {
            if procedure != "getPeersList" {
                return Err(NetworkError::Transport("unknown procedure".into()));
            }
            let peers = self
                .discovered
                .iter()
                .map(|(second, third)| {
                    let peer = PeerInfo::new(
                        IpAddr::V4(Ipv4Addr::new(10, *second, *third, 1)),
                        7001,
                        PeerKind::Outbound,
                    );
                    peer.public_view()
                })
                .collect();
            let response = PeersListResponse {
                success: true,
                peers,
            };
            Ok(serde_json::to_value(response).expect("response serializes"))
        }

        async fn send(
            &self,
            _peer_id: &String,
            _event: &str,
            _payload: Value,
        ) -> NetworkResult<()> {
            Ok(())
        }

        async fn close(&self, peer_id: &String, status_code: u16) -> NetworkResult<()> {
            self.closes.lock().push((peer_id.clone(), status_code));
            Ok(())
        }
    }

    fn drain(receiver: &mut UnboundedReceiver<NetworkEvent>) -> Vec<NetworkEvent> {
        let mut events = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            events.push(event);
        }
        events
    }

    fn addr(second: u8, third: u8) -> PeerAddress {
        PeerAddress {
            ip_address: IpAddr::V4(Ipv4Addr::new(10, second, third, 1)),
            ws_port: 7001,
        }
    }

    // =============================================================================
    // SCENARIO: peer book downgrade cycle
    // =============================================================================

    #[test]
    fn test_full_downgrade_cycle() {
        let mut book = PeerAddressBook::new(
            PlacementSecret::from_bytes([5u8; 32]),
            AddressBookConfig::default(),
        );
        let ip = IpAddr::V4(Ipv4Addr::new(10, 1, 1, 1));
        let peer = PeerInfo::new(ip, 7001, PeerKind::Outbound);
        let now = Timestamp::new(1000);

        book.add_peer(peer.clone(), &ip, now).unwrap();
        book.upgrade_peer(&peer.peer_id, now).unwrap();
        assert!(book.is_tried(&peer.peer_id));

        for _ in 0..2 {
            assert_eq!(
                book.downgrade_peer(&peer.peer_id).unwrap(),
                DowngradeOutcome::Retained
            );
        }
        assert_eq!(
            book.downgrade_peer(&peer.peer_id).unwrap(),
            DowngradeOutcome::MovedToNew
        );
        assert!(book.is_new(&peer.peer_id));

        assert_eq!(
            book.downgrade_peer(&peer.peer_id).unwrap(),
            DowngradeOutcome::Evicted
        );
        assert!(!book.has_peer(&peer.peer_id));
    }

    // =============================================================================
    // SCENARIO: discovery response size cap at production scale
    // =============================================================================

    #[tokio::test]
    async fn test_discovery_response_capped_at_payload_budget() {
        let config = NetworkConfig {
            node_nonce: "itest-discovery-cap".to_string(),
            secret: [3u8; 32],
            max_peer_info_size: 10 * 1024,
            ..Default::default()
        };
        let transport = Arc::new(ScriptedTransport::new(Vec::new()));
        let (coordinator, _events) = NetworkCoordinator::new(
            config,
            transport,
            Box::new(DefaultSelectionStrategy::default()),
            Arc::new(SystemTimeSource),
        );
        coordinator.start().await.unwrap();

        // 2000 addresses across 200 network groups, each entry padded past
        // the 10 KiB per-peer budget estimate
        {
            let padding = "x".repeat(10_300);
            for second in 1..=200u8 {
                for third in 1..=10u8 {
                    let ip = IpAddr::V4(Ipv4Addr::new(10, second, third, 1));
                    let mut peer = PeerInfo::new(ip, 7001, PeerKind::Outbound);
                    peer.shared_state
                        .options
                        .insert("blob".to_string(), Value::from(padding.clone()));
                    coordinator.add_discovered_peer(peer, ip).unwrap();
                }
            }
        }

        let response = coordinator.get_peers_list().await.unwrap();
        assert!(response.success);
        // 1 MiB / 10 KiB - 1 = 101
        assert!(
            response.peers.len() <= 101,
            "cap exceeded: {} entries",
            response.peers.len()
        );
        assert!(response.peers.len() >= 100, "sample below discovery floor");

        coordinator.stop().await.unwrap();
    }

    // =============================================================================
    // SCENARIO: populate, discover, rotate, stop
    // =============================================================================

    #[tokio::test]
    async fn test_coordinator_discovers_and_connects_over_time() {
        let config = NetworkConfig {
            node_nonce: "itest-discovery-loop".to_string(),
            secret: [4u8; 32],
            populator_interval_ms: 50,
            outbound_shuffle_interval_ms: 3_600_000,
            rate_calculation_interval_ms: 3_600_000,
            previous_peers: vec![addr(1, 1), addr(2, 1)],
            ..Default::default()
        };
        let transport = Arc::new(ScriptedTransport::new(vec![(21, 1), (22, 1), (23, 1)]));
        let (coordinator, mut events) = NetworkCoordinator::new(
            config,
            transport.clone(),
            Box::new(DefaultSelectionStrategy::default()),
            Arc::new(SystemTimeSource),
        );
        coordinator.start().await.unwrap();

        // Let a few populator rounds run: connect the previous peers,
        // then fold their advertised addresses into the book
        tokio::time::sleep(Duration::from_millis(400)).await;

        let seen = drain(&mut events);
        assert!(seen.contains(&NetworkEvent::NetworkReady));
        assert!(seen
            .iter()
            .any(|event| matches!(event, NetworkEvent::OutboundConnect { .. })));
        assert!(seen
            .iter()
            .any(|event| matches!(event, NetworkEvent::DiscoveredPeer { .. })));

        let stats = coordinator.pool_stats();
        assert!(stats.outbound_count >= 2, "previous peers reconnected");
        let book = coordinator.book_stats();
        assert!(
            book.new_count + book.tried_count >= 5,
            "discovered peers recorded alongside the previous ones"
        );

        coordinator.stop().await.unwrap();
        assert!(
            !transport.closes.lock().is_empty(),
            "stop closes live sockets"
        );

        // Stopped coordinator rejects traffic
        assert!(matches!(
            coordinator.request("getStatus", Value::Null, 0).await,
            Err(NetworkError::NodeNotReady)
        ));
    }

    // =============================================================================
    // SCENARIO: rate flooding ends in a ban
    // =============================================================================

    #[tokio::test]
    async fn test_message_flood_leads_to_ban() {
        let mut config = NetworkConfig {
            node_nonce: "itest-rate-ban".to_string(),
            secret: [6u8; 32],
            populator_interval_ms: 3_600_000,
            outbound_shuffle_interval_ms: 3_600_000,
            rate_calculation_interval_ms: 50,
            ..Default::default()
        };
        config.pool.ws_max_message_rate = 5;
        config.pool.ws_max_message_rate_penalty = 100;
        let transport = Arc::new(ScriptedTransport::new(Vec::new()));
        let (coordinator, mut events) = NetworkCoordinator::new(
            config,
            transport,
            Box::new(DefaultSelectionStrategy::default()),
            Arc::new(SystemTimeSource),
        );
        coordinator.start().await.unwrap();

        let flooder_ip = IpAddr::V4(Ipv4Addr::new(10, 9, 9, 9));
        coordinator
            .on_inbound_connection(flooder_ip, 7001, PeerSharedState::default(), true)
            .await
            .unwrap();
        for _ in 0..20 {
            coordinator.on_message_received("10.9.9.9:7001", "postTransactions", false);
        }

        tokio::time::sleep(Duration::from_millis(300)).await;

        let seen = drain(&mut events);
        assert!(
            seen.iter().any(|event| matches!(
                event,
                NetworkEvent::BanPeer { ip_address, .. } if *ip_address == flooder_ip
            )),
            "flooder should be banned, saw {seen:?}"
        );
        assert_eq!(coordinator.pool_stats().inbound_count, 0);

        // A banned address cannot come back
        assert!(matches!(
            coordinator
                .on_inbound_connection(flooder_ip, 7001, PeerSharedState::default(), true)
                .await,
            Err(NetworkError::PeerInboundHandshake { .. })
        ));

        coordinator.stop().await.unwrap();
    }
}
