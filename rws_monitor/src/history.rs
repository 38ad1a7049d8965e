use std::collections::VecDeque;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Number of samples kept per tracked signal.
pub const DEFAULT_CAPACITY: usize = 40;

/// Bounded newest-first history.
///
/// Pushing onto a full history drops the oldest entry, so the length never
/// exceeds the capacity and index 0 is always the most recent push.
#[derive(Debug, Clone)]
pub struct History<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T> History<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, entry: T) {
        if self.entries.len() == self.capacity {
            self.entries.pop_back();
        }
        self.entries.push_front(entry);
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

    /// Most recent entry.
    pub fn latest(&self) -> Option<&T> {
        self.entries.front()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.entries.get(index)
    }

    /// Newest to oldest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    /// Oldest to newest, the order charts are drawn in.
    pub fn iter_chronological(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().rev()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// One plotted sample of a scalar signal (gripper or TCP speed).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub captured_at: DateTime<Local>,
    pub text: String,
    pub value: f64,
}

impl HistoryEntry {
    pub fn time_label(&self) -> String {
        self.captured_at.format("%H:%M:%S").to_string()
    }
}

/// One plotted XYZ sample.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PositionHistoryEntry {
    pub captured_at: DateTime<Local>,
    pub x_text: String,
    pub y_text: String,
    pub z_text: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl PositionHistoryEntry {
    pub fn time_label(&self) -> String {
        self.captured_at.format("%H:%M:%S").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_first() {
        let mut history = History::new(3);
        history.push(1);
        history.push(2);
        assert_eq!(history.latest(), Some(&2));
        assert_eq!(history.iter().copied().collect::<Vec<_>>(), vec![2, 1]);
        assert_eq!(history.iter_chronological().copied().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_evicts_oldest_past_capacity() {
        let mut history = History::new(DEFAULT_CAPACITY);
        for i in 0..DEFAULT_CAPACITY {
            history.push(i);
        }
        assert_eq!(history.len(), 40);
        assert_eq!(history.get(39), Some(&0));

        history.push(40);
        assert_eq!(history.len(), 40);
        assert_eq!(history.latest(), Some(&40));
        assert_eq!(history.get(39), Some(&1));
        assert!(!history.iter().any(|&v| v == 0));
    }

    #[test]
    fn test_long_run_stays_bounded() {
        let mut history = History::new(5);
        for i in 0..1000 {
            history.push(i);
            assert!(history.len() <= 5);
        }
        assert_eq!(history.iter().copied().collect::<Vec<_>>(), vec![999, 998, 997, 996, 995]);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut history = History::new(0);
        history.push("a");
        history.push("b");
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.latest(), Some(&"b"));
    }
}
