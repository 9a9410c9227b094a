//! Cross-subsystem integration tests.

mod finality_flows;
mod network_flows;
