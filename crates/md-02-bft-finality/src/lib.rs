//! # MD-02 BFT Finality - Consensus Finality Subsystem
//!
//! Pre-vote/pre-commit accounting for the delegated-proof-of-stake chain.
//! Each ingested block header is an implicit endorsement of the heights it
//! transitively acknowledges; once two thirds of the active delegates have
//! pre-committed a height, that height is finalized and irreversible.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | A header claiming a previously-forged height at or above itself contributes zero votes | `domain/finality.rs` - `apply_votes()` |
//! | `finalized_height` is monotonically non-decreasing | `domain/finality.rs` - `update_prevoted_and_finalized()` |
//! | The prevoted tip never exceeds the highest windowed header | follows from tally trimming in `add_block_header()` |
//! | Validation failures leave the manager untouched | validation precedes the first mutation |
//!
//! ## Concurrency
//!
//! The domain core is single-threaded cooperative: callers serialize all
//! mutating operations and no suspension happens inside them. The service
//! layer guards the core with a `parking_lot::RwLock` that is never held
//! across an await, and delivers `FinalityChanged` synchronously before
//! the mutating call returns.
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use md_02_bft_finality::{FinalityApi, FinalityService};
//!
//! let service = FinalityService::init(101, chain_state, schedule).await?;
//! service.on_finality_changed(Box::new(|signal| {
//!     tracing::info!(height = signal.finalized_height, "finalized");
//! }));
//! service.add_block_header(header).await?;
//! ```

pub mod domain;
pub mod error;
pub mod events;
pub mod metrics;
pub mod ports;
pub mod service;

pub use domain::{
    classify, AddHeaderOutcome, DelegateVoteState, FinalityManager, ForkChoiceDecision,
    HeaderList, RemoveHeadersOutcome, VoteTallies,
};
pub use error::{BftError, BftResult};
pub use events::{FinalityChanged, FinalityObserver};
pub use ports::inbound::FinalityApi;
pub use ports::outbound::{ChainStateStore, DelegateScheduleProvider};
pub use service::FinalityService;
