use std::collections::VecDeque;

/// Fixed-capacity FIFO history. Pushing into a full window evicts the oldest entry.
#[derive(Clone, Debug, PartialEq)]
pub struct RollingWindow<T> {
    capacity: usize,
    items: VecDeque<T>,
}

impl<T> RollingWindow<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { capacity, items: VecDeque::with_capacity(capacity) }
    }

    /// Appends `item`, returning the evicted oldest entry when the window was full.
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() == self.capacity { self.items.pop_front() } else { None };
        self.items.push_back(item);
        evicted
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn last(&self) -> Option<&T> {
        self.items.back()
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator + '_ {
        self.items.iter()
    }

    /// The most recent `count` entries, oldest first.
    pub fn latest(&self, count: usize) -> impl Iterator<Item = &T> + '_ {
        let skip = self.items.len().saturating_sub(count);
        self.items.iter().skip(skip)
    }
}
