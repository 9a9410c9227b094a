//! # BFT Finality Domain
//!
//! Pure consensus accounting, free of I/O:
//!
//! - [`HeaderList`]: bounded contiguous window of recent block headers
//! - [`ForkChoiceDecision`] / [`classify`]: ordered tip classification
//! - [`VoteTallies`] / [`DelegateVoteState`]: pre-vote and pre-commit books
//! - [`FinalityManager`]: the accounting core tying the above together

mod finality;
mod fork_choice;
mod header_list;
mod votes;

pub use finality::{AddHeaderOutcome, FinalityManager, RemoveHeadersOutcome};
pub use fork_choice::{classify, ForkChoiceDecision};
pub use header_list::HeaderList;
pub use votes::{DelegateVoteState, VoteTallies};
