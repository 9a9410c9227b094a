//! Bounded header window.

use shared_types::{BlockHeader, Height};
use std::collections::VecDeque;

/// A bounded, height-contiguous window of block headers.
///
/// Capacity is `active_delegates * 5` (five rounds). Appending beyond
/// capacity evicts the lowest header, so the window always covers the most
/// recent heights. Heights inside the window are contiguous, which keeps
/// [`HeaderList::get`] constant-time index arithmetic.
#[derive(Debug, Clone)]
pub struct HeaderList {
    headers: VecDeque<BlockHeader>,
    max_size: usize,
}

impl HeaderList {
    /// Create an empty window with the given capacity.
    pub fn new(max_size: usize) -> Self {
        Self {
            headers: VecDeque::with_capacity(max_size),
            max_size,
        }
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Lowest height currently in the window.
    pub fn min_height(&self) -> Option<Height> {
        self.headers.front().map(|h| h.height)
    }

    /// Highest height currently in the window.
    pub fn max_height(&self) -> Option<Height> {
        self.headers.back().map(|h| h.height)
    }

    pub fn first(&self) -> Option<&BlockHeader> {
        self.headers.front()
    }

    pub fn last(&self) -> Option<&BlockHeader> {
        self.headers.back()
    }

    /// Random access by height.
    pub fn get(&self, height: Height) -> Option<&BlockHeader> {
        let first = self.min_height()?;
        if height < first {
            return None;
        }
        self.headers.get((height - first) as usize)
    }

    /// Append the next header.
    ///
    /// Accepts any header when empty, otherwise only `last.height + 1`.
    /// Returns false (and leaves the window untouched) for anything else.
    /// Evicts the lowest header when full.
    pub fn append(&mut self, header: BlockHeader) -> bool {
        if let Some(last) = self.max_height() {
            if header.height != last + 1 {
                return false;
            }
        }
        if self.headers.len() == self.max_size {
            self.headers.pop_front();
        }
        self.headers.push_back(header);
        true
    }

    /// Remove every header strictly above `height`. Returns how many were
    /// dropped.
    pub fn remove_above(&mut self, height: Height) -> usize {
        let mut removed = 0;
        while self.max_height().is_some_and(|max| max > height) {
            self.headers.pop_back();
            removed += 1;
        }
        removed
    }

    /// The newest `n` headers, ascending by height.
    pub fn top(&self, n: usize) -> impl Iterator<Item = &BlockHeader> {
        let skip = self.headers.len().saturating_sub(n);
        self.headers.iter().skip(skip)
    }

    /// All headers, ascending by height.
    pub fn iter(&self) -> impl Iterator<Item = &BlockHeader> {
        self.headers.iter()
    }
}
