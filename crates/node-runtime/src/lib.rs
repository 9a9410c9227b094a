//! # Meridian Node Runtime
//!
//! Entry point and wiring for the Meridian DPoS node. Two subsystem
//! cores do the real work:
//!
//! - `md-02-bft-finality`: header accounting, fork choice, finality
//! - `md-01-peer-network`: address book, connection pool, coordinator
//!
//! This crate owns what neither core should: configuration loading,
//! adapter implementations for their outbound ports, and process
//! lifecycle.

pub mod adapters;
pub mod config;
pub mod wiring;

pub use config::NodeConfig;
pub use wiring::{build_node, Node};
