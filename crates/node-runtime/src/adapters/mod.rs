//! Port implementations wiring the subsystem crates together.

mod chain_state;
mod delegate_schedule;
mod transport;

pub use chain_state::InMemoryChainStateStore;
pub use delegate_schedule::StaticDelegateSchedule;
pub use transport::NullTransport;
