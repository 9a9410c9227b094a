//! Fork-choice classification.
//!
//! A pure, ordered classifier comparing an incoming block header against
//! the current chain tip. The evaluation order is part of the contract:
//! identity is checked before succession so a re-delivered tip is never
//! double-counted, and same-delegate equivocation is flagged before the
//! tie-break so it cannot masquerade as a competing forger.

use shared_types::BlockHeader;

/// Outcome of classifying an incoming block against the tip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForkChoiceDecision {
    /// The incoming block is the current tip itself.
    Identical,
    /// The incoming block extends the tip by exactly one height.
    ValidSuccessor,
    /// Same slot, same chain, same delegate: equivocation.
    DoubleForging,
    /// Same slot, same chain, different delegate; the incoming block won
    /// the received-late heuristic and displaces the tip.
    TieBreak,
    /// The incoming block belongs to a chain with a better prevoted tip.
    DifferentChain,
    /// Nothing above applies; drop the block.
    Discard,
}

/// Classify `new_block` against `last_block` (the current tip).
pub fn classify(new_block: &BlockHeader, last_block: &BlockHeader) -> ForkChoiceDecision {
    if new_block.id == last_block.id {
        return ForkChoiceDecision::Identical;
    }

    if new_block.previous_block_id == last_block.id && new_block.height == last_block.height + 1 {
        return ForkChoiceDecision::ValidSuccessor;
    }

    if is_duplicate_slot(new_block, last_block) {
        if new_block.delegate_public_key == last_block.delegate_public_key {
            return ForkChoiceDecision::DoubleForging;
        }
        // Received-late heuristic: the block closer to its forge slot wins;
        // equality breaks toward the incoming block.
        if new_block.reception_delay() <= last_block.reception_delay() {
            return ForkChoiceDecision::TieBreak;
        }
    }

    if new_block.max_height_prevoted > last_block.max_height_prevoted
        || (new_block.height > last_block.height
            && new_block.max_height_prevoted == last_block.max_height_prevoted)
    {
        return ForkChoiceDecision::DifferentChain;
    }

    ForkChoiceDecision::Discard
}

/// Same height, same claimed prevoted tip, same parent.
fn is_duplicate_slot(new_block: &BlockHeader, last_block: &BlockHeader) -> bool {
    new_block.height == last_block.height
        && new_block.max_height_prevoted == last_block.max_height_prevoted
        && new_block.previous_block_id == last_block.previous_block_id
}
