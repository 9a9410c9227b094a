//! Tests for the address book lifecycle and placement.

use super::*;
use crate::domain::peer::{NetgroupKey, PeerInfo, PeerKind, PeerSharedState};
use crate::error::NetworkError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared_types::Timestamp;
use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr};

fn secret() -> PlacementSecret {
    PlacementSecret::from_bytes([42u8; 32])
}

fn make_book() -> PeerAddressBook {
    PeerAddressBook::new(secret(), AddressBookConfig::for_testing())
}

fn make_peer(second: u8, third: u8) -> PeerInfo {
    PeerInfo::new(
        IpAddr::V4(Ipv4Addr::new(10, second, third, 1)),
        7001,
        PeerKind::Outbound,
    )
}

fn source_ip() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(172, 16, 0, 1))
}

fn now() -> Timestamp {
    Timestamp::new(1000)
}

/// Peers whose new-table coordinates are pairwise distinct under the test
/// secret, so slot displacement cannot interfere with lifecycle tests.
fn coexisting_peers(count: usize) -> Vec<PeerInfo> {
    let config = AddressBookConfig::for_testing();
    let s = secret();
    let source_group = NetgroupKey::from_ip(&source_ip());
    let mut coords = HashSet::new();
    let mut peers = Vec::new();
    'outer: for second in 1..=255u8 {
        for third in 1..=254u8 {
            let peer = make_peer(second, third);
            let position = (
                new_table_bucket(&s, &source_group, &peer.netgroup(), config.new_bucket_count),
                bucket_slot(&s, &peer.peer_id, config.bucket_size),
            );
            if coords.insert(position) {
                peers.push(peer);
                if peers.len() == count {
                    break 'outer;
                }
            }
        }
    }
    assert_eq!(peers.len(), count, "test table too small for {count} peers");
    peers
}

// =============================================================================
// TEST GROUP 1: Add / Remove Lifecycle
// =============================================================================

#[test]
fn test_add_places_in_new_table() {
    let mut book = make_book();
    let peer = make_peer(1, 10);
    book.add_peer(peer.clone(), &source_ip(), now()).unwrap();

    assert!(book.is_new(&peer.peer_id));
    assert!(!book.is_tried(&peer.peer_id));
    assert_eq!(book.stats().new_count, 1);
}

#[test]
fn test_add_fails_for_existing_peer_in_either_table() {
    let mut book = make_book();
    let peer = make_peer(1, 10);
    book.add_peer(peer.clone(), &source_ip(), now()).unwrap();

    let err = book.add_peer(peer.clone(), &source_ip(), now());
    assert!(matches!(err, Err(NetworkError::ExistingPeer { .. })));

    book.upgrade_peer(&peer.peer_id, now()).unwrap();
    let err = book.add_peer(peer.clone(), &source_ip(), now());
    match err {
        Err(NetworkError::ExistingPeer { peer: existing }) => {
            assert_eq!(existing.peer_id, peer.peer_id);
        }
        other => panic!("expected ExistingPeer, got {other:?}"),
    }
}

#[test]
fn test_add_remove_add_is_equivalent_to_single_add() {
    let mut book = make_book();
    let peer = make_peer(1, 10);

    book.add_peer(peer.clone(), &source_ip(), now()).unwrap();
    assert!(book.remove_peer(&peer.peer_id).is_some());
    book.add_peer(peer.clone(), &source_ip(), now()).unwrap();

    assert!(book.is_new(&peer.peer_id));
    assert_eq!(book.len(), 1);
}

#[test]
fn test_remove_evicts_from_either_table() {
    let mut book = make_book();
    let peers = coexisting_peers(2);
    let (in_new, in_tried) = (peers[0].clone(), peers[1].clone());
    book.add_peer(in_new.clone(), &source_ip(), now()).unwrap();
    book.add_peer(in_tried.clone(), &source_ip(), now()).unwrap();
    book.upgrade_peer(&in_tried.peer_id, now()).unwrap();

    assert!(book.remove_peer(&in_new.peer_id).is_some());
    assert!(book.remove_peer(&in_tried.peer_id).is_some());
    assert!(book.is_empty());
}

// =============================================================================
// TEST GROUP 2: Upgrade / Downgrade State Machine
// =============================================================================

#[test]
fn test_upgrade_moves_to_tried_and_is_idempotent() {
    let mut book = make_book();
    let peer = make_peer(1, 10);
    book.add_peer(peer.clone(), &source_ip(), now()).unwrap();

    book.upgrade_peer(&peer.peer_id, now()).unwrap();
    let after_first = book.stats();
    book.upgrade_peer(&peer.peer_id, Timestamp::new(2000))
        .unwrap();
    let after_second = book.stats();

    assert!(book.is_tried(&peer.peer_id));
    assert_eq!(after_first.new_count, 0);
    assert_eq!(after_first.tried_count, 1);
    assert_eq!(after_first, after_second);
}

#[test]
fn test_upgrade_unknown_peer_fails() {
    let mut book = make_book();
    assert!(matches!(
        book.upgrade_peer("10.9.9.9:7001", now()),
        Err(NetworkError::PeerNotFound(_))
    ));
}

#[test]
fn test_downgrade_cycle_tried_to_new_to_evicted() {
    let mut book = make_book();
    let peer = make_peer(1, 10);
    book.add_peer(peer.clone(), &source_ip(), now()).unwrap();
    book.upgrade_peer(&peer.peer_id, now()).unwrap();

    // Two failures are absorbed in tried
    assert_eq!(
        book.downgrade_peer(&peer.peer_id).unwrap(),
        DowngradeOutcome::Retained
    );
    assert_eq!(
        book.downgrade_peer(&peer.peer_id).unwrap(),
        DowngradeOutcome::Retained
    );
    assert!(book.is_tried(&peer.peer_id));

    // The third moves it back to new with a fresh counter
    assert_eq!(
        book.downgrade_peer(&peer.peer_id).unwrap(),
        DowngradeOutcome::MovedToNew
    );
    assert!(book.is_new(&peer.peer_id));

    // One failure as a new peer drops it entirely
    assert_eq!(
        book.downgrade_peer(&peer.peer_id).unwrap(),
        DowngradeOutcome::Evicted
    );
    assert!(!book.has_peer(&peer.peer_id));
}

#[test]
fn test_downgrade_never_removes_privileged_peers() {
    let mut book = make_book();
    let mut peer = make_peer(1, 10);
    peer.internal_state.kind = PeerKind::Whitelisted;
    book.add_peer(peer.clone(), &source_ip(), now()).unwrap();

    for _ in 0..5 {
        assert_eq!(
            book.downgrade_peer(&peer.peer_id).unwrap(),
            DowngradeOutcome::Retained
        );
    }
    assert!(book.is_new(&peer.peer_id));

    book.upgrade_peer(&peer.peer_id, now()).unwrap();
    for _ in 0..5 {
        assert_eq!(
            book.downgrade_peer(&peer.peer_id).unwrap(),
            DowngradeOutcome::Retained
        );
    }
    assert!(book.is_tried(&peer.peer_id));
}

#[test]
fn test_peer_is_in_exactly_one_table() {
    let mut book = make_book();
    for (idx, peer) in coexisting_peers(12).into_iter().enumerate() {
        book.add_peer(peer.clone(), &source_ip(), now()).unwrap();
        if idx % 2 == 0 {
            book.upgrade_peer(&peer.peer_id, now()).unwrap();
        }
    }
    for peer in book.all_peers() {
        assert_ne!(
            book.is_new(&peer.peer_id),
            book.is_tried(&peer.peer_id),
            "{} must live in exactly one table",
            peer.peer_id
        );
    }
}

#[test]
fn test_tried_slot_collision_demotes_displaced_peer() {
    let config = AddressBookConfig::for_testing();
    let mut book = PeerAddressBook::new(secret(), config.clone());

    // Hunt for two distinct addresses mapping to the same tried
    // coordinates under the test secret.
    let first = make_peer(1, 1);
    let target = (
        tried_table_bucket(&secret(), &first.peer_id, config.tried_bucket_count),
        bucket_slot(&secret(), &first.peer_id, config.bucket_size),
    );
    let collider = (2u8..=255)
        .flat_map(|second| (1u8..=254).map(move |third| make_peer(second, third)))
        .find(|candidate| {
            (
                tried_table_bucket(&secret(), &candidate.peer_id, config.tried_bucket_count),
                bucket_slot(&secret(), &candidate.peer_id, config.bucket_size),
            ) == target
        })
        .expect("a 4x4 tried table collides quickly");

    book.add_peer(first.clone(), &source_ip(), now()).unwrap();
    book.upgrade_peer(&first.peer_id, now()).unwrap();
    book.add_peer(collider.clone(), &source_ip(), now())
        .unwrap();
    book.upgrade_peer(&collider.peer_id, now()).unwrap();

    assert!(book.is_tried(&collider.peer_id));
    assert!(
        book.is_new(&first.peer_id),
        "displaced tried peer falls back to new"
    );
}

// =============================================================================
// TEST GROUP 3: Shared-State Updates
// =============================================================================

#[test]
fn test_update_merges_without_moving_peer() {
    let mut book = make_book();
    let peer = make_peer(1, 10);
    book.add_peer(peer.clone(), &source_ip(), now()).unwrap();

    let shared = PeerSharedState {
        protocol_version: "2.0".into(),
        chain_height: 777,
        ..Default::default()
    };
    book.update_peer(&peer.peer_id, &shared).unwrap();

    assert!(book.is_new(&peer.peer_id));
    assert_eq!(
        book.get_peer(&peer.peer_id).unwrap().shared_state.chain_height,
        777
    );
}

#[test]
fn test_update_unknown_peer_fails() {
    let mut book = make_book();
    assert!(matches!(
        book.update_peer("10.9.9.9:7001", &PeerSharedState::default()),
        Err(NetworkError::PeerNotFound(_))
    ));
}

// =============================================================================
// TEST GROUP 4: Randomized Sampling
// =============================================================================

#[test]
fn test_randomized_list_respects_bounds_and_advertise_flag() {
    let mut book = make_book();
    let mut hidden_ids = Vec::new();
    for (idx, mut peer) in coexisting_peers(10).into_iter().enumerate() {
        if idx < 3 {
            peer.internal_state.advertise_address = false;
            hidden_ids.push(peer.peer_id.clone());
        }
        book.add_peer(peer, &source_ip(), now()).unwrap();
    }

    let mut rng = StdRng::seed_from_u64(11);
    let sample = book.get_randomized_peer_list(2, 5, &mut rng);

    assert!(sample.len() >= 2 && sample.len() <= 5);
    for peer in &sample {
        assert!(!hidden_ids.contains(&peer.peer_id));
    }
    // Without replacement
    let mut ids: Vec<_> = sample.iter().map(|p| p.peer_id.clone()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), sample.len());
}

#[test]
fn test_randomized_list_on_empty_book() {
    let book = make_book();
    let mut rng = StdRng::seed_from_u64(11);
    assert!(book.get_randomized_peer_list(2, 5, &mut rng).is_empty());
}
