//! # Shared Types Crate
//!
//! Cross-subsystem domain entities for the Meridian node.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every type consumed by more than one
//!   subsystem crate is defined here.
//! - **One Header Stream**: the BFT finality core and the block processor
//!   consume the same [`BlockHeader`] shape; there is no per-subsystem
//!   re-definition of chain entities.

pub mod entities;

pub use entities::{BlockHeader, BlockId, DelegatePublicKey, Height, Timestamp, EMPTY_BLOCK_ID};
