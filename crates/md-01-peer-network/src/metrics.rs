//! # Network Metrics
//!
//! Prometheus metrics for monitoring the peer network.
//!
//! Enable with the `metrics` feature:
//! ```toml
//! md-01-peer-network = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `network_peers_inbound` - Gauge of live inbound connections
//! - `network_peers_outbound` - Gauge of live outbound connections
//! - `network_book_new` - Gauge of new-table occupancy
//! - `network_book_tried` - Gauge of tried-table occupancy
//! - `network_bans_total` - Counter of peer bans

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_gauge, register_int_counter, Gauge, IntCounter};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Live inbound connections
    pub static ref PEERS_INBOUND: Gauge = register_gauge!(
        "network_peers_inbound",
        "Live inbound connections"
    )
    .expect("Failed to create PEERS_INBOUND metric");

    /// Live outbound connections
    pub static ref PEERS_OUTBOUND: Gauge = register_gauge!(
        "network_peers_outbound",
        "Live outbound connections"
    )
    .expect("Failed to create PEERS_OUTBOUND metric");

    /// New-table occupancy
    pub static ref BOOK_NEW: Gauge = register_gauge!(
        "network_book_new",
        "Addresses in the new table"
    )
    .expect("Failed to create BOOK_NEW metric");

    /// Tried-table occupancy
    pub static ref BOOK_TRIED: Gauge = register_gauge!(
        "network_book_tried",
        "Addresses in the tried table"
    )
    .expect("Failed to create BOOK_TRIED metric");

    /// Total peer bans
    pub static ref BANS_TOTAL: IntCounter = register_int_counter!(
        "network_bans_total",
        "Total number of peer bans"
    )
    .expect("Failed to create BANS_TOTAL metric");
}

/// Update the live connection gauges
#[cfg(feature = "metrics")]
pub fn set_pool_counts(inbound: usize, outbound: usize) {
    PEERS_INBOUND.set(inbound as f64);
    PEERS_OUTBOUND.set(outbound as f64);
}

/// Update the address book gauges
#[cfg(feature = "metrics")]
pub fn set_book_counts(new_count: usize, tried_count: usize) {
    BOOK_NEW.set(new_count as f64);
    BOOK_TRIED.set(tried_count as f64);
}

/// Record a peer ban
#[cfg(feature = "metrics")]
pub fn record_ban() {
    BANS_TOTAL.inc();
}

#[cfg(not(feature = "metrics"))]
pub fn set_pool_counts(_inbound: usize, _outbound: usize) {}

#[cfg(not(feature = "metrics"))]
pub fn set_book_counts(_new_count: usize, _tried_count: usize) {}

#[cfg(not(feature = "metrics"))]
pub fn record_ban() {}
