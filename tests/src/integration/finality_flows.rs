//! End-to-end finality flows: a realistic delegate rotation feeding the
//! finality service through the runtime adapters.

#[cfg(test)]
mod tests {
    use md_02_bft_finality::{
        classify, ChainStateStore, FinalityApi, FinalityManager, FinalityService,
        ForkChoiceDecision,
    };
    use node_runtime::adapters::{InMemoryChainStateStore, StaticDelegateSchedule};
    use shared_types::{BlockHeader, BlockId, DelegatePublicKey, Height};
    use std::sync::Arc;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn block_id(seed: u64) -> BlockId {
        let mut id = [0u8; 32];
        id[..8].copy_from_slice(&seed.to_be_bytes());
        id
    }

    fn delegate_key(slot: usize) -> DelegatePublicKey {
        let mut key = [0u8; 32];
        key[0] = (slot % 256) as u8;
        key[1] = (slot / 256) as u8;
        key[31] = 1; // keys must be non-zero to pass schema validation
        key
    }

    /// A header from a chain where `delegates` forgers rotate in order,
    /// each claiming the prevote tip its position implies.
    fn cycle_header(delegates: usize, height: Height, threshold: u64) -> BlockHeader {
        let slot = ((height - 1) as usize) % delegates;
        BlockHeader {
            id: block_id(height),
            previous_block_id: block_id(height - 1),
            height,
            delegate_public_key: delegate_key(slot),
            max_height_previously_forged: height.checked_sub(delegates as u64).unwrap_or(0),
            max_height_prevoted: height.saturating_sub(threshold),
            delegate_min_height_active: 1,
            timestamp: height * 10,
            received_at: height * 10,
        }
    }

    // =============================================================================
    // SCENARIO: finalization across three rounds at D=101
    // =============================================================================

    #[test]
    fn test_three_rounds_of_101_delegates_reach_finality() {
        let delegates = 101;
        let mut manager = FinalityManager::new(delegates, 0);
        let threshold = manager.pre_vote_threshold() as u64;
        assert_eq!(threshold, 68);

        let mut last_finalized = 0;
        for height in 1..=303u64 {
            manager
                .add_block_header(cycle_header(delegates, height, threshold))
                .unwrap();
            let finalized = manager.finalized_height();
            assert!(finalized >= last_finalized, "finality must never regress");
            last_finalized = finalized;

            if height == 202 {
                assert!(finalized >= 1, "two rounds must finalize the chain start");
            }
        }
        assert!(
            manager.finalized_height() >= 101,
            "three rounds must finalize the first round, got {}",
            manager.finalized_height()
        );
        assert!(manager.chain_max_height_prevoted() <= 303);
    }

    // =============================================================================
    // SCENARIO: equivocating delegate is ignored
    // =============================================================================

    #[tokio::test]
    async fn test_equivocating_headers_append_without_votes() {
        let store = Arc::new(InMemoryChainStateStore::new(0));
        let schedule = Arc::new(StaticDelegateSchedule::new());
        let service = FinalityService::init(5, store.clone(), schedule)
            .await
            .unwrap();

        for height in [150u64, 151u64] {
            let header = BlockHeader {
                id: block_id(height),
                previous_block_id: block_id(height - 1),
                height,
                delegate_public_key: delegate_key(7),
                max_height_previously_forged: 200,
                max_height_prevoted: 0,
                delegate_min_height_active: 0,
                timestamp: height,
                received_at: height,
            };
            service.add_block_header(header).await.unwrap();
        }

        assert_eq!(service.finalized_height().await, 0);
        assert_eq!(service.chain_max_height_prevoted().await, 0);
        assert_eq!(store.load_finalized_height().await.unwrap(), 0);
    }

    // =============================================================================
    // SCENARIO: fork choice tie break
    // =============================================================================

    #[test]
    fn test_tie_break_prefers_punctual_arrival() {
        let shared_parent = block_id(9);
        let last_block = BlockHeader {
            id: block_id(1),
            previous_block_id: shared_parent,
            height: 10,
            delegate_public_key: delegate_key(1),
            max_height_previously_forged: 0,
            max_height_prevoted: 5,
            delegate_min_height_active: 1,
            timestamp: 1000,
            received_at: 2000,
        };
        let new_block = BlockHeader {
            id: block_id(2),
            previous_block_id: shared_parent,
            height: 10,
            delegate_public_key: delegate_key(2),
            max_height_previously_forged: 0,
            max_height_prevoted: 5,
            delegate_min_height_active: 1,
            timestamp: 1000,
            received_at: 1500,
        };

        assert_eq!(
            classify(&new_block, &last_block),
            ForkChoiceDecision::TieBreak
        );
        // The mirrored comparison loses the heuristic and is dropped
        assert_eq!(
            classify(&last_block, &new_block),
            ForkChoiceDecision::Discard
        );
    }

    // =============================================================================
    // SCENARIO: persistence across the service boundary
    // =============================================================================

    #[tokio::test]
    async fn test_finality_persists_through_store_and_reinit() {
        let delegates = 5;
        let store = Arc::new(InMemoryChainStateStore::new(0));
        let schedule = Arc::new(StaticDelegateSchedule::new());
        let service = FinalityService::init(delegates, store.clone(), schedule.clone())
            .await
            .unwrap();

        for height in 1..=25u64 {
            let header = cycle_header(delegates, height, 4);
            store.insert_header(header.clone());
            service.add_block_header(header).await.unwrap();
        }
        let finalized = service.finalized_height().await;
        assert_eq!(finalized, 18);
        assert_eq!(store.load_finalized_height().await.unwrap(), finalized);

        // A fresh service over the same store resumes from the floor and
        // can replay the stored window
        let restarted = FinalityService::init(delegates, store.clone(), schedule)
            .await
            .unwrap();
        assert_eq!(restarted.finalized_height().await, finalized);
        restarted.bootstrap(1, 25).await.unwrap();
        assert_eq!(restarted.finalized_height().await, finalized);
        assert_eq!(
            restarted.chain_max_height_prevoted().await,
            service.chain_max_height_prevoted().await
        );
    }

    // =============================================================================
    // SCENARIO: rollback and re-ingestion reproduce identical state
    // =============================================================================

    #[tokio::test]
    async fn test_rollback_then_reingest_is_idempotent() {
        let delegates = 5;
        let store = Arc::new(InMemoryChainStateStore::new(0));
        let schedule = Arc::new(StaticDelegateSchedule::new());
        let service = FinalityService::init(delegates, store.clone(), schedule)
            .await
            .unwrap();

        for height in 1..=20u64 {
            let header = cycle_header(delegates, height, 4);
            store.insert_header(header.clone());
            service.add_block_header(header).await.unwrap();
        }
        let finalized = service.finalized_height().await;
        let prevoted = service.chain_max_height_prevoted().await;

        service.remove_block_headers(19).await.unwrap();
        service
            .add_block_header(cycle_header(delegates, 20, 4))
            .await
            .unwrap();

        assert_eq!(service.finalized_height().await, finalized);
        assert_eq!(service.chain_max_height_prevoted().await, prevoted);
    }
}
