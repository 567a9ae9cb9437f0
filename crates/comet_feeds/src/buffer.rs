use std::collections::VecDeque;

use comet_core::NewsItem;

/// Newest-first bounded history of canonical items. Insertion is always at
/// the front; overflow silently drops the oldest entry.
pub struct RollingBuffer {
    items: VecDeque<NewsItem>,
    capacity: usize,
}

impl RollingBuffer {
    pub const DEFAULT_CAPACITY: usize = 200;

    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push_front(&mut self, item: NewsItem) {
        self.items.push_front(item);
        self.items.truncate(self.capacity);
    }

    /// Current contents, newest-first, without mutating the buffer.
    pub fn snapshot(&self) -> Vec<NewsItem> {
        self.items.iter().cloned().collect()
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
}

impl Default for RollingBuffer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
