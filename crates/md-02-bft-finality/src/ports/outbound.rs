//! Driven Ports (SPI - Outbound Dependencies)

use crate::error::BftResult;
use async_trait::async_trait;
use shared_types::{BlockHeader, DelegatePublicKey, Height};

/// Persistent chain-state access.
///
/// The finalized height must survive restarts: it is loaded at
/// initialization and persisted on every advance.
#[async_trait]
pub trait ChainStateStore: Send + Sync {
    /// Load stored headers in `[from, till]`, ascending by height.
    async fn load_headers(&self, from: Height, till: Height) -> BftResult<Vec<BlockHeader>>;

    /// Load the persisted finalized height, 0 when never persisted.
    async fn load_finalized_height(&self) -> BftResult<Height>;

    /// Persist a newly finalized height.
    async fn persist_finalized_height(&self, height: Height) -> BftResult<()>;
}

/// Delegate round scheduling, owned by the DPoS collaborator.
#[async_trait]
pub trait DelegateScheduleProvider: Send + Sync {
    /// Heights at which the delegate's active rounds began, ascending.
    /// Empty when the delegate has never been active.
    async fn min_active_heights_of(
        &self,
        delegate: &DelegatePublicKey,
    ) -> BftResult<Vec<Height>>;
}
