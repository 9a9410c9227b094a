//! Error types for the BFT finality subsystem.

use shared_types::Height;
use thiserror::Error;

/// BFT finality subsystem errors.
///
/// Header-validation variants abort `add_block_header` before any state is
/// mutated, so a failed call leaves the manager untouched.
#[derive(Debug, Error)]
pub enum BftError {
    /// Header failed schema validation; it was never appended.
    #[error("invalid block header schema at height {height}: {reason}")]
    InvalidHeaderSchema { height: Height, reason: &'static str },

    /// Same-delegate double forging detected against the header window.
    #[error("fork choice violation: delegate forged conflicting headers at height {height}")]
    ForkChoiceViolation { height: Height },

    /// Gap between this delegate's two headers larger than its forge chain permits.
    #[error(
        "chain disjoint: header at height {earlier_height} is above the later \
         header's previously-forged height {max_height_previously_forged}"
    )]
    ChainDisjoint {
        earlier_height: Height,
        max_height_previously_forged: Height,
    },

    /// A later header by this delegate prevoted lower than an earlier one.
    #[error("lower chain branch: prevoted height regressed from {earlier} to {later}")]
    LowerChainBranch { earlier: Height, later: Height },

    /// Header's `max_height_prevoted` disagrees with the chain value while
    /// the processing window is full.
    #[error("invalid attribute: header claims prevoted height {claimed}, chain has {chain}")]
    InvalidAttribute { claimed: Height, chain: Height },

    /// A required block argument was not supplied.
    #[error("required block argument missing: {0}")]
    ArgumentMissing(&'static str),

    /// Chain-state storage failure surfaced by an outbound port.
    #[error("chain state storage error: {0}")]
    Storage(String),
}

/// Result type for finality operations.
pub type BftResult<T> = Result<T, BftError>;
