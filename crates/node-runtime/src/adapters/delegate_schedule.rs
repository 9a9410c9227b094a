//! Delegate schedule adapter.
//!
//! The round math lives in the DPoS collaborator; this adapter caches its
//! answers. Until a real schedule is pushed, every delegate is treated as
//! active from the chain start.

use async_trait::async_trait;
use md_02_bft_finality::{BftResult, DelegateScheduleProvider};
use parking_lot::RwLock;
use shared_types::{DelegatePublicKey, Height};
use std::collections::HashMap;

pub struct StaticDelegateSchedule {
    active_rounds: RwLock<HashMap<DelegatePublicKey, Vec<Height>>>,
}

impl StaticDelegateSchedule {
    pub fn new() -> Self {
        Self {
            active_rounds: RwLock::new(HashMap::new()),
        }
    }

    /// Replace the cached active-round starts for a delegate.
    pub fn set_active_heights(&self, delegate: DelegatePublicKey, heights: Vec<Height>) {
        self.active_rounds.write().insert(delegate, heights);
    }
}

impl Default for StaticDelegateSchedule {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DelegateScheduleProvider for StaticDelegateSchedule {
    async fn min_active_heights_of(
        &self,
        delegate: &DelegatePublicKey,
    ) -> BftResult<Vec<Height>> {
        let cached = self.active_rounds.read().get(delegate).cloned();
        Ok(cached.unwrap_or_else(|| vec![1]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_defaults_to_active_from_genesis() {
        let schedule = StaticDelegateSchedule::new();
        let heights = schedule.min_active_heights_of(&[1u8; 32]).await.unwrap();
        assert_eq!(heights, vec![1]);
    }

    #[tokio::test]
    async fn test_cached_rounds_returned() {
        let schedule = StaticDelegateSchedule::new();
        schedule.set_active_heights([2u8; 32], vec![101, 202]);
        let heights = schedule.min_active_heights_of(&[2u8; 32]).await.unwrap();
        assert_eq!(heights, vec![101, 202]);
    }
}
