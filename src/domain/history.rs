//! Bounded stature history
//!
//! Keeps the most recent calibrated stature samples in insertion order and
//! evicts the oldest once capacity is reached.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct StatureHistory {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl StatureHistory {
    /// Capacity is clamped to at least one sample
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { samples: VecDeque::with_capacity(capacity), capacity }
    }

    /// Rebuild from samples ordered oldest to newest, keeping only the newest `capacity`
    pub fn from_recent<I>(capacity: usize, samples: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let mut history = Self::new(capacity);
        for sample in samples {
            history.push(sample);
        }
        history
    }

    /// Append a sample, returning the evicted oldest sample if the buffer was full
    pub fn push(&mut self, meters: f64) -> Option<f64> {
        let evicted = if self.samples.len() == self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(meters);
        evicted
    }

    /// Arithmetic mean of the samples currently held
    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().sum::<f64>() / self.samples.len() as f64)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.samples.iter()
    }

    pub fn latest(&self) -> Option<f64> {
        self.samples.back().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_within_capacity() {
        let mut history = StatureHistory::new(3);
        assert_eq!(history.push(1.70), None);
        assert_eq!(history.push(1.80), None);
        assert_eq!(history.len(), 2);
        assert_eq!(history.latest(), Some(1.80));
    }

    #[test]
    fn test_evicts_oldest_first() {
        let mut history = StatureHistory::new(3);
        history.push(1.1);
        history.push(1.2);
        history.push(1.3);

        let evicted = history.push(1.4);

        assert_eq!(evicted, Some(1.1));
        assert_eq!(history.len(), 3);
        let kept: Vec<f64> = history.iter().copied().collect();
        assert_eq!(kept, vec![1.2, 1.3, 1.4]);
    }

    #[test]
    fn test_mean() {
        let mut history = StatureHistory::new(5);
        assert_eq!(history.mean(), None);
        history.push(1.6);
        history.push(1.8);
        assert!((history.mean().unwrap() - 1.7).abs() < 1e-9);
    }

    #[test]
    fn test_from_recent_keeps_newest() {
        let history = StatureHistory::from_recent(2, vec![1.5, 1.6, 1.7, 1.8]);
        let kept: Vec<f64> = history.iter().copied().collect();
        assert_eq!(kept, vec![1.7, 1.8]);
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let mut history = StatureHistory::new(0);
        assert_eq!(history.capacity(), 1);
        history.push(1.5);
        history.push(1.6);
        assert_eq!(history.len(), 1);
        assert_eq!(history.latest(), Some(1.6));
    }
}
