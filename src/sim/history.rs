//! Bounded history of recent entries, oldest evicted first

use std::collections::VecDeque;

/// Strict FIFO with a fixed capacity
#[derive(Debug, Clone)]
pub struct HistoryBuffer<T> {
    capacity: usize,
    entries: VecDeque<T>,
}

impl<T> HistoryBuffer<T> {
    /// Capacity is at least 1
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity.min(1024)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Evicts the oldest entry when full
    pub fn push(&mut self, entry: T) {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn most_recent(&self) -> Option<&T> {
        self.entries.back()
    }

    /// `from_end(0)` is the newest
    pub fn from_end(&self, n: usize) -> Option<&T> {
        let len = self.entries.len();
        if n >= len {
            return None;
        }
        self.entries.get(len - 1 - n)
    }

    /// Oldest to newest
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evicts_oldest_first() {
        let mut buffer = HistoryBuffer::new(3);
        for i in 0..5 {
            buffer.push(i);
        }
        assert_eq!(buffer.len(), 3);
        assert!(buffer.is_full());
        assert_eq!(buffer.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
    }

    #[test]
    fn test_most_recent_and_from_end() {
        let mut buffer = HistoryBuffer::new(100);
        assert!(buffer.most_recent().is_none());
        for i in 0..250 {
            buffer.push(i);
            assert_eq!(buffer.most_recent(), Some(&i));
        }
        assert_eq!(buffer.len(), 100);
        assert_eq!(buffer.from_end(0), Some(&249));
        assert_eq!(buffer.from_end(99), Some(&150));
        assert_eq!(buffer.from_end(100), None);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut buffer = HistoryBuffer::new(0);
        buffer.push('a');
        buffer.push('b');
        assert_eq!(buffer.capacity(), 1);
        assert_eq!(buffer.most_recent(), Some(&'b'));
        buffer.clear();
        assert!(buffer.is_empty());
    }
}
