//! # Meridian Test Suite
//!
//! Unified test crate containing cross-subsystem integration tests:
//! - **integration/finality_flows**: header stream to finalized height
//! - **integration/network_flows**: address book, pool and coordinator

#![allow(dead_code)]

pub mod integration;
