//! Pre-vote and pre-commit bookkeeping.

use shared_types::Height;
use std::collections::BTreeMap;

/// Per-delegate vote watermarks, keyed by delegate public key in the
/// manager. Both fields are monotonically non-decreasing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DelegateVoteState {
    /// Highest height this delegate has contributed a pre-vote for.
    pub max_pre_vote_height: Height,
    /// Highest height this delegate has contributed a pre-commit for.
    pub max_pre_commit_height: Height,
}

/// Height-indexed pre-vote and pre-commit counters.
///
/// Both maps are trimmed to their newest `max_entries` keys after every
/// mutation pass, bounding memory to the five-round window.
#[derive(Debug, Clone)]
pub struct VoteTallies {
    pre_votes: BTreeMap<Height, u32>,
    pre_commits: BTreeMap<Height, u32>,
    max_entries: usize,
}

impl VoteTallies {
    pub fn new(max_entries: usize) -> Self {
        Self {
            pre_votes: BTreeMap::new(),
            pre_commits: BTreeMap::new(),
            max_entries,
        }
    }

    pub fn add_pre_vote(&mut self, height: Height) {
        *self.pre_votes.entry(height).or_insert(0) += 1;
    }

    pub fn add_pre_commit(&mut self, height: Height) {
        *self.pre_commits.entry(height).or_insert(0) += 1;
    }

    pub fn pre_votes_at(&self, height: Height) -> u32 {
        self.pre_votes.get(&height).copied().unwrap_or(0)
    }

    pub fn pre_commits_at(&self, height: Height) -> u32 {
        self.pre_commits.get(&height).copied().unwrap_or(0)
    }

    /// Highest height whose pre-vote count reaches `threshold`.
    pub fn highest_prevoted(&self, threshold: u32) -> Option<Height> {
        self.pre_votes
            .iter()
            .rev()
            .find(|(_, &count)| count >= threshold)
            .map(|(&height, _)| height)
    }

    /// Highest height whose pre-commit count reaches `threshold`.
    pub fn highest_precommitted(&self, threshold: u32) -> Option<Height> {
        self.pre_commits
            .iter()
            .rev()
            .find(|(_, &count)| count >= threshold)
            .map(|(&height, _)| height)
    }

    /// Drop the oldest entries beyond the retention bound.
    pub fn trim(&mut self) {
        while self.pre_votes.len() > self.max_entries {
            self.pre_votes.pop_first();
        }
        while self.pre_commits.len() > self.max_entries {
            self.pre_commits.pop_first();
        }
    }

    pub fn clear(&mut self) {
        self.pre_votes.clear();
        self.pre_commits.clear();
    }

    /// Lowest height with any recorded pre-vote, for window assertions.
    pub fn min_pre_vote_height(&self) -> Option<Height> {
        self.pre_votes.keys().next().copied()
    }

    /// Highest height with any recorded entry in either map.
    pub fn max_recorded_height(&self) -> Option<Height> {
        let votes = self.pre_votes.keys().next_back().copied();
        let commits = self.pre_commits.keys().next_back().copied();
        votes.max(commits)
    }
}
