//! # Finality Metrics
//!
//! Prometheus metrics for monitoring finality progress.
//!
//! Enable with the `metrics` feature:
//! ```toml
//! md-02-bft-finality = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `bft_headers_processed_total` - Counter of headers ingested
//! - `bft_headers_rejected_total` - Counter of rejected headers (by reason)
//! - `bft_finalized_height` - Gauge of the current finalized height
//! - `bft_prevoted_height` - Gauge of the chain-level prevoted tip

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_counter_vec, register_gauge, register_int_counter, CounterVec, Gauge, IntCounter};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Total headers ingested
    pub static ref HEADERS_PROCESSED: IntCounter = register_int_counter!(
        "bft_headers_processed_total",
        "Total number of block headers ingested"
    )
    .expect("Failed to create HEADERS_PROCESSED metric");

    /// Total headers rejected, labeled by reason
    pub static ref HEADERS_REJECTED: CounterVec = register_counter_vec!(
        "bft_headers_rejected_total",
        "Total number of block headers rejected",
        &["reason"]
    )
    .expect("Failed to create HEADERS_REJECTED metric");

    /// Current finalized height
    pub static ref FINALIZED_HEIGHT: Gauge = register_gauge!(
        "bft_finalized_height",
        "Highest finalized block height"
    )
    .expect("Failed to create FINALIZED_HEIGHT metric");

    /// Current prevoted tip
    pub static ref PREVOTED_HEIGHT: Gauge = register_gauge!(
        "bft_prevoted_height",
        "Chain-level prevoted tip height"
    )
    .expect("Failed to create PREVOTED_HEIGHT metric");
}

/// Record a header ingested
#[cfg(feature = "metrics")]
pub fn record_header_processed() {
    HEADERS_PROCESSED.inc();
}

/// Record a header rejected with reason
#[cfg(feature = "metrics")]
pub fn record_header_rejected(reason: &str) {
    HEADERS_REJECTED.with_label_values(&[reason]).inc();
}

/// Update the finalized height gauge
#[cfg(feature = "metrics")]
pub fn set_finalized_height(height: u64) {
    FINALIZED_HEIGHT.set(height as f64);
}

/// Update the prevoted tip gauge
#[cfg(feature = "metrics")]
pub fn set_prevoted_height(height: u64) {
    PREVOTED_HEIGHT.set(height as f64);
}

#[cfg(not(feature = "metrics"))]
pub fn record_header_processed() {}

#[cfg(not(feature = "metrics"))]
pub fn record_header_rejected(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn set_finalized_height(_height: u64) {}

#[cfg(not(feature = "metrics"))]
pub fn set_prevoted_height(_height: u64) {}
