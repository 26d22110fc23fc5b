//! Sliding window - a timestamp-ordered buffer bounded in time and length

use std::collections::VecDeque;
use std::time::Duration;

use attune_core::Timestamp;

/// Time-bounded sample buffer
///
/// Entries are kept in timestamp order. Entries older than `span` relative to
/// the newest eviction time are dropped, and the buffer never grows past
/// `max_len` entries.
#[derive(Debug, Clone, PartialEq)]
pub struct SlidingWindow<T> {
    entries: VecDeque<(Timestamp, T)>,
    span: Duration,
    max_len: usize,
}

impl<T> SlidingWindow<T> {
    pub fn new(span: Duration, max_len: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_len.min(256)),
            span,
            max_len: max_len.max(1),
        }
    }

    /// Insert in timestamp order; out-of-order arrivals are placed, not appended
    pub fn push(&mut self, at: Timestamp, value: T) {
        let pos = self
            .entries
            .iter()
            .rposition(|(t, _)| *t <= at)
            .map(|p| p + 1)
            .unwrap_or(0);
        self.entries.insert(pos, (at, value));

        while self.entries.len() > self.max_len {
            self.entries.pop_front();
        }
    }

    /// Drop entries older than `span` before `now`
    pub fn evict(&mut self, now: Timestamp) {
        let cutoff = now.saturating_sub(self.span);
        while let Some((t, _)) = self.entries.front() {
            if *t < cutoff {
                self.entries.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn span(&self) -> Duration {
        self.span
    }

    /// Oldest to newest
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &(Timestamp, T)> + ExactSizeIterator {
        self.entries.iter()
    }

    /// The most recent `n` entries, oldest first
    pub fn latest(&self, n: usize) -> impl Iterator<Item = &(Timestamp, T)> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip)
    }

    /// The earliest `n` entries, oldest first
    pub fn earliest(&self, n: usize) -> impl Iterator<Item = &(Timestamp, T)> {
        self.entries.iter().take(n)
    }

    pub fn newest(&self) -> Option<&(Timestamp, T)> {
        self.entries.back()
    }
}
