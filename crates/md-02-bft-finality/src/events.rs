//! Outgoing signals for the BFT finality subsystem.
//!
//! Delivery is synchronous: observers run inside the mutating call, before
//! it returns, in registration order.

use serde::{Deserialize, Serialize};
use shared_types::Height;

/// Emitted when `finalized_height` advances.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalityChanged {
    /// The new, higher finalized height.
    pub finalized_height: Height,
}

/// Synchronous observer invoked on every [`FinalityChanged`].
pub type FinalityObserver = Box<dyn Fn(FinalityChanged) + Send + Sync>;
