//! Driving Ports (API - Inbound)

use crate::domain::ForkChoiceDecision;
use crate::error::BftResult;
use async_trait::async_trait;
use shared_types::{BlockHeader, Height};

/// Primary finality API.
///
/// This is the driving port for the finality subsystem; the block
/// processor is its only caller. All mutating methods must be serialized
/// by the caller.
#[async_trait]
pub trait FinalityApi: Send + Sync {
    /// Ingest the next block header. Stamps the delegate's minimum active
    /// height from the schedule before accounting.
    async fn add_block_header(&self, header: BlockHeader) -> BftResult<()>;

    /// Remove headers strictly above `height` and rebuild vote state,
    /// refilling the window from storage when it shrinks below two rounds.
    async fn remove_block_headers(&self, height: Height) -> BftResult<()>;

    /// Classify an incoming block against the current tip.
    ///
    /// Fails with `ArgumentMissing` when the tip is not supplied (e.g. an
    /// empty chain).
    async fn fork_choice(
        &self,
        new_block: &BlockHeader,
        last_block: Option<&BlockHeader>,
    ) -> BftResult<ForkChoiceDecision>;

    /// Protocol-compliance check for a freshly proposed block. Fails with
    /// `ArgumentMissing` when no block is supplied.
    async fn is_bft_protocol_compliant(&self, block: Option<&BlockHeader>) -> BftResult<bool>;

    /// Highest finalized height. Irreversible.
    async fn finalized_height(&self) -> Height;

    /// Current chain-level prevoted tip.
    async fn chain_max_height_prevoted(&self) -> Height;
}
