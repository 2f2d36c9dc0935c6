/// History window module
///
/// Bounded FIFO of the most recent predicted class indices, plus the stable
/// frequency ranking used for windowed voting.

use std::collections::VecDeque;
use tracing::trace;

/// Default window length in frames
pub const DEFAULT_WINDOW_LENGTH: usize = 8;

/// Result of ranking the window by vote count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ranking {
    /// Most frequent index (earliest first appearance wins ties)
    pub top_index: usize,

    /// Votes for `top_index`
    pub top_count: usize,

    /// Votes for the runner-up, or 0 if only one distinct index is present
    pub second_count: usize,

    /// Number of entries in the window when ranked
    pub window_len: usize,
}

impl Ranking {
    /// Share of the window held by the winner
    pub fn stability(&self) -> f32 {
        self.top_count as f32 / self.window_len as f32
    }

    /// Lead of the winner over the runner-up, as a share of the window
    pub fn margin(&self) -> f32 {
        (self.top_count - self.second_count) as f32 / self.window_len as f32
    }
}

/// Rolling window of predicted indices, oldest first
#[derive(Debug, Clone)]
pub struct HistoryWindow {
    entries: VecDeque<usize>,
    capacity: usize,
}

impl HistoryWindow {
    /// Create a window with the default length
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_WINDOW_LENGTH)
    }

    /// Create a window holding at most `capacity` entries (minimum 1)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an index, evicting the oldest entry once full
    pub fn push(&mut self, index: usize) {
        if self.entries.len() == self.capacity {
            if let Some(evicted) = self.entries.pop_front() {
                trace!("Evicted index {} from history window", evicted);
            }
        }
        self.entries.push_back(index);
    }

    /// Rank indices by frequency
    ///
    /// Equal counts are ordered by first appearance in the window, so the
    /// result is deterministic. Returns `None` when the window is empty.
    pub fn rank(&self) -> Option<Ranking> {
        // (index, count) in first-appearance order
        let mut tally: Vec<(usize, usize)> = Vec::new();
        for &index in &self.entries {
            match tally.iter_mut().find(|(i, _)| *i == index) {
                Some((_, count)) => *count += 1,
                None => tally.push((index, 1)),
            }
        }

        let mut top: Option<(usize, usize, usize)> = None; // (position, index, count)
        for (position, &(index, count)) in tally.iter().enumerate() {
            match top {
                Some((_, _, best)) if count <= best => {}
                _ => top = Some((position, index, count)),
            }
        }
        let (top_position, top_index, top_count) = top?;

        let second_count = tally
            .iter()
            .enumerate()
            .filter(|(position, _)| *position != top_position)
            .map(|(_, &(_, count))| count)
            .max()
            .unwrap_or(0);

        Some(Ranking {
            top_index,
            top_count,
            second_count,
            window_len: self.entries.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() == self.capacity
    }

    /// Entries in arrival order
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().copied()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        trace!("Cleared history window");
    }
}

impl Default for HistoryWindow {
    fn default() -> Self {
        Self::new()
    }
}
