//! Finality service wiring the accounting core to its ports.

use crate::domain::{classify, FinalityManager, ForkChoiceDecision};
use crate::error::{BftError, BftResult};
use crate::events::{FinalityChanged, FinalityObserver};
use crate::metrics;
use crate::ports::inbound::FinalityApi;
use crate::ports::outbound::{ChainStateStore, DelegateScheduleProvider};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{BlockHeader, Height};
use std::sync::Arc;

/// Finality service.
///
/// Wraps the [`FinalityManager`] behind [`FinalityApi`], stamps ingested
/// headers with the delegate schedule, persists the finalized height on
/// every advance and delivers [`FinalityChanged`] to registered observers
/// synchronously, before the mutating call returns.
///
/// The internal lock is never held across an await.
pub struct FinalityService<S, D>
where
    S: ChainStateStore,
    D: DelegateScheduleProvider,
{
    manager: RwLock<FinalityManager>,
    store: Arc<S>,
    schedule: Arc<D>,
    observers: RwLock<Vec<FinalityObserver>>,
}

impl<S, D> FinalityService<S, D>
where
    S: ChainStateStore,
    D: DelegateScheduleProvider,
{
    /// Create a service with an explicit finalized floor.
    pub fn new(
        active_delegates: usize,
        finalized_height: Height,
        store: Arc<S>,
        schedule: Arc<D>,
    ) -> Self {
        metrics::set_finalized_height(finalized_height);
        Self {
            manager: RwLock::new(FinalityManager::new(active_delegates, finalized_height)),
            store,
            schedule,
            observers: RwLock::new(Vec::new()),
        }
    }

    /// Create a service with the floor loaded from persistent chain state.
    pub async fn init(
        active_delegates: usize,
        store: Arc<S>,
        schedule: Arc<D>,
    ) -> BftResult<Self> {
        let finalized_height = store.load_finalized_height().await?;
        Ok(Self::new(active_delegates, finalized_height, store, schedule))
    }

    /// Register a synchronous observer for finality advances.
    pub fn on_finality_changed(&self, observer: FinalityObserver) {
        self.observers.write().push(observer);
    }

    /// Rebuild the header window from storage, replaying vote accounting.
    pub async fn bootstrap(&self, from: Height, till: Height) -> BftResult<()> {
        let headers = self.store.load_headers(from, till).await?;
        if !headers.is_empty() {
            self.manager.write().restore(headers);
        }
        Ok(())
    }

    fn notify(&self, finalized_height: Height) {
        let signal = FinalityChanged { finalized_height };
        for observer in self.observers.read().iter() {
            observer(signal);
        }
        metrics::set_finalized_height(finalized_height);
    }

    fn rejection_reason(error: &BftError) -> &'static str {
        match error {
            BftError::InvalidHeaderSchema { .. } => "invalid_schema",
            BftError::ForkChoiceViolation { .. } => "fork_choice_violation",
            BftError::ChainDisjoint { .. } => "chain_disjoint",
            BftError::LowerChainBranch { .. } => "lower_chain_branch",
            BftError::InvalidAttribute { .. } => "invalid_attribute",
            BftError::ArgumentMissing(_) => "argument_missing",
            BftError::Storage(_) => "storage",
        }
    }
}

#[async_trait]
impl<S, D> FinalityApi for FinalityService<S, D>
where
    S: ChainStateStore + 'static,
    D: DelegateScheduleProvider + 'static,
{
    async fn add_block_header(&self, mut header: BlockHeader) -> BftResult<()> {
        let active_heights = self
            .schedule
            .min_active_heights_of(&header.delegate_public_key)
            .await?;
        header.delegate_min_height_active = active_heights
            .iter()
            .copied()
            .filter(|&start| start <= header.height)
            .max()
            .unwrap_or(1);

        let outcome = {
            let mut manager = self.manager.write();
            manager.add_block_header(header).map_err(|error| {
                metrics::record_header_rejected(Self::rejection_reason(&error));
                error
            })?
        };
        metrics::record_header_processed();
        metrics::set_prevoted_height(self.manager.read().chain_max_height_prevoted());

        if let Some(finalized) = outcome.finality_advanced {
            self.notify(finalized);
            self.store.persist_finalized_height(finalized).await?;
        }
        Ok(())
    }

    async fn remove_block_headers(&self, height: Height) -> BftResult<()> {
        let outcome = self.manager.write().remove_block_headers(height);
        if !outcome.needs_refill {
            return Ok(());
        }

        // The remaining window is below two rounds; pull older headers
        // back in from storage and replay.
        let (from, till, existing) = {
            let manager = self.manager.read();
            let Some(min_height) = manager.headers().min_height() else {
                return Ok(());
            };
            if min_height <= 1 {
                return Ok(());
            }
            let max_height = manager.headers().max_height().unwrap_or(min_height);
            let from = max_height
                .saturating_sub(manager.max_headers() as u64 - 1)
                .max(1);
            let existing: Vec<BlockHeader> = manager.headers().iter().cloned().collect();
            (from, min_height - 1, existing)
        };
        if from > till {
            return Ok(());
        }

        let mut headers = self.store.load_headers(from, till).await?;
        if headers.is_empty() {
            return Ok(());
        }
        headers.extend(existing);
        self.manager.write().restore(headers);
        Ok(())
    }

    async fn fork_choice(
        &self,
        new_block: &BlockHeader,
        last_block: Option<&BlockHeader>,
    ) -> BftResult<ForkChoiceDecision> {
        let last_block = last_block.ok_or(BftError::ArgumentMissing("last block"))?;
        Ok(classify(new_block, last_block))
    }

    async fn is_bft_protocol_compliant(&self, block: Option<&BlockHeader>) -> BftResult<bool> {
        let block = block.ok_or(BftError::ArgumentMissing("block"))?;
        Ok(self.manager.read().is_bft_protocol_compliant(block))
    }

    async fn finalized_height(&self) -> Height {
        self.manager.read().finalized_height()
    }

    async fn chain_max_height_prevoted(&self) -> Height {
        self.manager.read().chain_max_height_prevoted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use shared_types::{BlockId, DelegatePublicKey};

    struct MockChainStateStore {
        headers: Mutex<Vec<BlockHeader>>,
        finalized: Mutex<Height>,
        persisted: Mutex<Vec<Height>>,
    }

    impl MockChainStateStore {
        fn new(finalized: Height) -> Self {
            Self {
                headers: Mutex::new(Vec::new()),
                finalized: Mutex::new(finalized),
                persisted: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChainStateStore for MockChainStateStore {
        async fn load_headers(&self, from: Height, till: Height) -> BftResult<Vec<BlockHeader>> {
            Ok(self
                .headers
                .lock()
                .iter()
                .filter(|h| h.height >= from && h.height <= till)
                .cloned()
                .collect())
        }

        async fn load_finalized_height(&self) -> BftResult<Height> {
            Ok(*self.finalized.lock())
        }

        async fn persist_finalized_height(&self, height: Height) -> BftResult<()> {
            self.persisted.lock().push(height);
            *self.finalized.lock() = height;
            Ok(())
        }
    }

    struct MockSchedule;

    #[async_trait]
    impl DelegateScheduleProvider for MockSchedule {
        async fn min_active_heights_of(
            &self,
            _delegate: &DelegatePublicKey,
        ) -> BftResult<Vec<Height>> {
            Ok(vec![1])
        }
    }

    fn block_id(seed: u64) -> BlockId {
        let mut id = [0u8; 32];
        id[..8].copy_from_slice(&seed.to_be_bytes());
        id
    }

    fn cycle_header(delegates: usize, height: Height, threshold: u64) -> BlockHeader {
        let slot = ((height - 1) as usize) % delegates;
        let mut key = [0u8; 32];
        key[0] = slot as u8;
        key[31] = 1; // keys must be non-zero to pass schema validation
        BlockHeader {
            id: block_id(height),
            previous_block_id: block_id(height - 1),
            height,
            delegate_public_key: key,
            max_height_previously_forged: height.checked_sub(delegates as u64).unwrap_or(0),
            max_height_prevoted: height.saturating_sub(threshold),
            delegate_min_height_active: 0, // stamped by the service
            timestamp: height,
            received_at: height,
        }
    }

    fn create_service(
        delegates: usize,
        store: Arc<MockChainStateStore>,
    ) -> FinalityService<MockChainStateStore, MockSchedule> {
        FinalityService::new(delegates, 0, store, Arc::new(MockSchedule))
    }

    #[tokio::test]
    async fn test_finality_advance_persists_each_step() {
        let store = Arc::new(MockChainStateStore::new(0));
        let service = create_service(5, store.clone());

        for height in 1..=25 {
            service
                .add_block_header(cycle_header(5, height, 4))
                .await
                .unwrap();
        }

        let persisted = store.persisted.lock().clone();
        assert!(!persisted.is_empty());
        assert!(persisted.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(persisted.last().copied(), Some(18));
        assert_eq!(service.finalized_height().await, 18);
    }

    #[tokio::test]
    async fn test_observers_receive_synchronous_signal() {
        let store = Arc::new(MockChainStateStore::new(0));
        let service = create_service(5, store);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        service.on_finality_changed(Box::new(move |signal| {
            sink.lock().push(signal.finalized_height);
        }));

        for height in 1..=25 {
            service
                .add_block_header(cycle_header(5, height, 4))
                .await
                .unwrap();
        }

        let heights = seen.lock().clone();
        assert!(!heights.is_empty());
        assert!(heights.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_init_loads_persisted_floor() {
        let store = Arc::new(MockChainStateStore::new(33));
        let service = FinalityService::init(5, store, Arc::new(MockSchedule))
            .await
            .unwrap();
        assert_eq!(service.finalized_height().await, 33);
    }

    #[tokio::test]
    async fn test_fork_choice_requires_a_tip() {
        let store = Arc::new(MockChainStateStore::new(0));
        let service = create_service(5, store);
        let block = cycle_header(5, 1, 4);
        assert!(matches!(
            service.fork_choice(&block, None).await,
            Err(BftError::ArgumentMissing(_))
        ));
    }

    #[tokio::test]
    async fn test_compliance_check_requires_a_block() {
        let store = Arc::new(MockChainStateStore::new(0));
        let service = create_service(5, store);
        assert!(matches!(
            service.is_bft_protocol_compliant(None).await,
            Err(BftError::ArgumentMissing(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_refills_from_storage() {
        let store = Arc::new(MockChainStateStore::new(0));
        // Storage knows the whole chain
        {
            let mut stored = store.headers.lock();
            for height in 1..=25 {
                stored.push(cycle_header(5, height, 4));
            }
        }
        let service = create_service(5, store.clone());
        service.bootstrap(16, 25).await.unwrap();

        // Cutting to 17 leaves two headers, well below two rounds
        service.remove_block_headers(17).await.unwrap();

        // The window was refilled from storage and replayed: with headers
        // 1..=17 back in, the tip prevotes to 14 and height 10 finalizes.
        assert_eq!(service.chain_max_height_prevoted().await, 14);
        assert_eq!(service.finalized_height().await, 10);
    }
}
