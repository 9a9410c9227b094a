//! The finality accounting core.

use super::header_list::HeaderList;
use super::votes::{DelegateVoteState, VoteTallies};
use crate::error::{BftError, BftResult};
use shared_types::{BlockHeader, DelegatePublicKey, Height};
use std::collections::HashMap;

/// Result of a successful `add_block_header` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddHeaderOutcome {
    /// New finalized height, when the call advanced it.
    pub finality_advanced: Option<Height>,
}

/// Result of `remove_block_headers`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveHeadersOutcome {
    /// The remaining window shrank below two rounds; the caller may reload
    /// older headers from storage and call `restore`.
    pub needs_refill: bool,
}

/// Per-delegate pre-vote/pre-commit accounting over a bounded header
/// window.
///
/// For `active_delegates = D` the derived constants are:
///
/// | Constant | Value | Meaning |
/// |---|---|---|
/// | `pre_vote_threshold` | ceil(2D/3) | votes needed to prevote a height |
/// | `pre_commit_threshold` | ceil(2D/3) | commits needed to finalize |
/// | `processing_threshold` | 3D - 1 | retroactive vote window |
/// | `max_headers` | 5D | header/tally retention |
///
/// All mutating operations must be serialized by the caller; nothing here
/// suspends or performs I/O.
#[derive(Debug)]
pub struct FinalityManager {
    active_delegates: usize,
    pre_vote_threshold: u32,
    pre_commit_threshold: u32,
    processing_threshold: u64,
    max_headers: usize,
    headers: HeaderList,
    delegate_state: HashMap<DelegatePublicKey, DelegateVoteState>,
    tallies: VoteTallies,
    chain_max_height_prevoted: Height,
    finalized_height: Height,
}

impl FinalityManager {
    /// Create a manager for `active_delegates` forgers with a persisted
    /// finalized floor.
    pub fn new(active_delegates: usize, finalized_height: Height) -> Self {
        assert!(active_delegates > 0, "active delegate count must be positive");
        let d = active_delegates as u64;
        let max_headers = active_delegates * 5;
        Self {
            active_delegates,
            pre_vote_threshold: (2 * d).div_ceil(3) as u32,
            pre_commit_threshold: (2 * d).div_ceil(3) as u32,
            processing_threshold: 3 * d - 1,
            max_headers,
            headers: HeaderList::new(max_headers),
            delegate_state: HashMap::new(),
            tallies: VoteTallies::new(max_headers),
            chain_max_height_prevoted: 0,
            finalized_height,
        }
    }

    pub fn active_delegates(&self) -> usize {
        self.active_delegates
    }

    pub fn pre_vote_threshold(&self) -> u32 {
        self.pre_vote_threshold
    }

    pub fn pre_commit_threshold(&self) -> u32 {
        self.pre_commit_threshold
    }

    pub fn processing_threshold(&self) -> u64 {
        self.processing_threshold
    }

    pub fn max_headers(&self) -> usize {
        self.max_headers
    }

    pub fn finalized_height(&self) -> Height {
        self.finalized_height
    }

    pub fn chain_max_height_prevoted(&self) -> Height {
        self.chain_max_height_prevoted
    }

    pub fn headers(&self) -> &HeaderList {
        &self.headers
    }

    pub fn tallies(&self) -> &VoteTallies {
        &self.tallies
    }

    /// Watermarks for a delegate, zeroed when unknown.
    pub fn delegate_state(&self, delegate: &DelegatePublicKey) -> DelegateVoteState {
        self.delegate_state.get(delegate).copied().unwrap_or_default()
    }

    /// Ingest the next block header.
    ///
    /// Step order is observable: schema validation, window consistency
    /// checks, append, pre-commit accounting, pre-vote accounting,
    /// derivation of the prevoted tip and finalized height, tally trim.
    /// Any error aborts before the first mutation.
    pub fn add_block_header(&mut self, header: BlockHeader) -> BftResult<AddHeaderOutcome> {
        Self::validate_header_schema(&header)?;
        self.verify_block_headers(&header)?;

        if !self.headers.append(header.clone()) {
            return Err(BftError::InvalidHeaderSchema {
                height: header.height,
                reason: "height is not contiguous with the header window",
            });
        }

        self.apply_votes(&header);
        let finality_advanced = self.update_prevoted_and_finalized();
        self.tallies.trim();

        Ok(AddHeaderOutcome { finality_advanced })
    }

    /// Drop every header strictly above `height` and rebuild the tallies
    /// from what remains. The persisted finalized floor is kept.
    pub fn remove_block_headers(&mut self, height: Height) -> RemoveHeadersOutcome {
        self.headers.remove_above(height);
        self.recompute();
        RemoveHeadersOutcome {
            needs_refill: self.headers.len() < self.active_delegates * 2,
        }
    }

    /// Zero all vote state (keeping the finalized floor) and replay the
    /// accounting for every header currently in the window, ascending.
    pub fn recompute(&mut self) {
        self.delegate_state.clear();
        self.tallies.clear();
        self.chain_max_height_prevoted = 0;

        let replay: Vec<BlockHeader> = self.headers.iter().cloned().collect();
        for header in &replay {
            self.apply_votes(header);
        }
        self.update_prevoted_and_finalized();
        self.tallies.trim();
    }

    /// Rebuild the window from storage-loaded headers (ascending) and
    /// replay the accounting. Used at startup and after a refill.
    pub fn restore(&mut self, headers: Vec<BlockHeader>) {
        self.headers = HeaderList::new(self.max_headers);
        for header in headers {
            self.headers.append(header);
        }
        self.recompute();
    }

    /// Protocol-compliance check for a freshly proposed block.
    ///
    /// Non-compliant exactly when the block claims a previously-forged
    /// height at or above itself, or when the claim is recent enough to
    /// verify and the stored header at that height belongs to a different
    /// delegate.
    pub fn is_bft_protocol_compliant(&self, block: &BlockHeader) -> bool {
        if block.max_height_previously_forged >= block.height {
            return false;
        }
        let height_diff = block.height - block.max_height_previously_forged;
        if height_diff <= self.processing_threshold + 2 {
            if let Some(prev) = self.headers.get(block.max_height_previously_forged) {
                if prev.delegate_public_key != block.delegate_public_key {
                    return false;
                }
            }
        }
        true
    }

    fn validate_header_schema(header: &BlockHeader) -> BftResult<()> {
        if header.delegate_public_key == [0u8; 32] {
            return Err(BftError::InvalidHeaderSchema {
                height: header.height,
                reason: "delegate public key must be non-zero",
            });
        }
        if header.height == 0 {
            return Err(BftError::InvalidHeaderSchema {
                height: 0,
                reason: "height must be positive",
            });
        }
        if header.max_height_prevoted >= header.height {
            return Err(BftError::InvalidHeaderSchema {
                height: header.height,
                reason: "claimed prevoted tip at or above own height",
            });
        }
        Ok(())
    }

    /// Consistency of the incoming header against the processing window.
    fn verify_block_headers(&self, header: &BlockHeader) -> BftResult<()> {
        if self.headers.len() >= self.processing_threshold as usize
            && header.max_height_prevoted != self.chain_max_height_prevoted
        {
            return Err(BftError::InvalidAttribute {
                claimed: header.max_height_prevoted,
                chain: self.chain_max_height_prevoted,
            });
        }

        let previous = self
            .headers
            .top(self.processing_threshold as usize)
            .filter(|p| p.delegate_public_key == header.delegate_public_key)
            .last();

        let Some(previous) = previous else {
            return Ok(());
        };

        // Order the pair so the checks below read on a single timeline.
        let key = |h: &BlockHeader| {
            (
                h.max_height_previously_forged,
                h.max_height_prevoted,
                h.height,
            )
        };
        let (earlier, later) = if key(previous) <= key(header) {
            (previous, header)
        } else {
            (header, previous)
        };

        if earlier.max_height_prevoted == later.max_height_prevoted
            && earlier.height >= later.height
        {
            tracing::warn!(
                height = header.height,
                "same-delegate double forging rejected"
            );
            return Err(BftError::ForkChoiceViolation {
                height: header.height,
            });
        }
        if earlier.height > later.max_height_previously_forged {
            return Err(BftError::ChainDisjoint {
                earlier_height: earlier.height,
                max_height_previously_forged: later.max_height_previously_forged,
            });
        }
        if earlier.max_height_prevoted > later.max_height_prevoted {
            return Err(BftError::LowerChainBranch {
                earlier: earlier.max_height_prevoted,
                later: later.max_height_prevoted,
            });
        }
        Ok(())
    }

    /// Attribute this header's implied pre-commits and pre-votes.
    ///
    /// Pre-commits are judged against the tally as of call entry; this
    /// header's own pre-votes land afterwards.
    fn apply_votes(&mut self, header: &BlockHeader) {
        if header.max_height_previously_forged >= header.height {
            tracing::warn!(
                height = header.height,
                max_height_previously_forged = header.max_height_previously_forged,
                "delegate is forging on another chain; no votes attributed"
            );
            return;
        }

        let current = self.delegate_state(&header.delegate_public_key);
        let min_valid_commit = self.min_valid_commit_height(header);

        let mut max_pre_commit = current.max_pre_commit_height;
        let commit_from = header
            .delegate_min_height_active
            .max(min_valid_commit)
            .max(current.max_pre_commit_height + 1);
        let commit_till = header.height.saturating_sub(1);
        for height in commit_from..=commit_till {
            if self.tallies.pre_votes_at(height) >= self.pre_vote_threshold {
                self.tallies.add_pre_commit(height);
                max_pre_commit = height;
            }
        }

        let vote_from = header
            .delegate_min_height_active
            .max(header.max_height_previously_forged + 1)
            .max(current.max_pre_vote_height + 1)
            .max(header.height.saturating_sub(self.processing_threshold));
        for height in vote_from..=header.height {
            self.tallies.add_pre_vote(height);
        }

        self.delegate_state.insert(
            header.delegate_public_key,
            DelegateVoteState {
                max_pre_vote_height: header.height,
                max_pre_commit_height: max_pre_commit,
            },
        );
    }

    /// Lowest height this delegate may legitimately pre-commit, found by
    /// walking its previously-forged chain backwards. An unbroken chain of
    /// the delegate's own headers authorises commits over that span.
    fn min_valid_commit_height(&self, header: &BlockHeader) -> Height {
        let window_floor = header.height.saturating_sub(self.processing_threshold);
        let mut needle = header.max_height_previously_forged.max(window_floor);
        let search_till = self.headers.min_height().unwrap_or(0).max(window_floor);
        let mut chained_prev_forged = header.max_height_previously_forged;

        while needle >= search_till {
            if needle == chained_prev_forged {
                let Some(prev) = self.headers.get(needle) else {
                    return 0;
                };
                if prev.delegate_public_key != header.delegate_public_key
                    || prev.max_height_previously_forged >= needle
                {
                    return needle + 1;
                }
                chained_prev_forged = prev.max_height_previously_forged;
                needle = prev.max_height_previously_forged;
            } else {
                if needle == 0 {
                    // search_till is 0 here; the walk bottomed out.
                    return search_till;
                }
                needle -= 1;
            }
        }
        (needle + 1).max(search_till)
    }

    /// Re-derive the prevoted tip and the finalized height from the
    /// tallies. Returns the new finalized height when it advanced.
    fn update_prevoted_and_finalized(&mut self) -> Option<Height> {
        if let Some(height) = self.tallies.highest_prevoted(self.pre_vote_threshold) {
            self.chain_max_height_prevoted = height;
        }
        if let Some(candidate) = self.tallies.highest_precommitted(self.pre_commit_threshold) {
            if candidate > self.finalized_height {
                self.finalized_height = candidate;
                tracing::info!(finalized_height = candidate, "finality advanced");
                return Some(candidate);
            }
        }
        None
    }
}
