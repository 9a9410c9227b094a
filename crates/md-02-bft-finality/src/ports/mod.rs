//! Port definitions for the finality subsystem.

pub mod inbound;
pub mod outbound;

pub use inbound::FinalityApi;
pub use outbound::{ChainStateStore, DelegateScheduleProvider};
