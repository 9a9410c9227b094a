//! In-memory chain-state store.
//!
//! Stands in for the persistent storage collaborator: the finalized
//! height and header window survive for the process lifetime, which is
//! enough for the finality core's load/persist contract and for tests.

use async_trait::async_trait;
use md_02_bft_finality::{BftResult, ChainStateStore};
use parking_lot::RwLock;
use shared_types::{BlockHeader, Height};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

pub struct InMemoryChainStateStore {
    headers: RwLock<BTreeMap<Height, BlockHeader>>,
    finalized_height: AtomicU64,
}

impl InMemoryChainStateStore {
    pub fn new(finalized_height: Height) -> Self {
        Self {
            headers: RwLock::new(BTreeMap::new()),
            finalized_height: AtomicU64::new(finalized_height),
        }
    }

    /// Record a header as it is applied by the block processor.
    pub fn insert_header(&self, header: BlockHeader) {
        self.headers.write().insert(header.height, header);
    }

    /// Drop headers above the given height after a chain rollback.
    pub fn remove_headers_above(&self, height: Height) {
        self.headers.write().retain(|&h, _| h <= height);
    }
}

#[async_trait]
impl ChainStateStore for InMemoryChainStateStore {
    async fn load_headers(&self, from: Height, till: Height) -> BftResult<Vec<BlockHeader>> {
        Ok(self
            .headers
            .read()
            .range(from..=till)
            .map(|(_, header)| header.clone())
            .collect())
    }

    async fn load_finalized_height(&self) -> BftResult<Height> {
        Ok(self.finalized_height.load(Ordering::SeqCst))
    }

    async fn persist_finalized_height(&self, height: Height) -> BftResult<()> {
        self.finalized_height.store(height, Ordering::SeqCst);
        Ok(())
    }
}
