use std::sync::Mutex;

use comet_core::fanout::{Broadcaster, SubscriberId, Subscription};
use comet_core::NewsItem;

use crate::buffer::RollingBuffer;
use crate::dedup::{DedupIndex, RetentionPolicy};

struct HubState {
    buffer: RollingBuffer,
    dedup: DedupIndex,
}

/// Process-scoped news state: rolling buffer, dedup index and the subscriber
/// registry behind one lock. `commit` broadcasts while holding that lock and
/// `subscribe` registers while holding it, so a new subscriber's init
/// snapshot can neither miss nor duplicate a batch. The lock is never held
/// across an await.
pub struct NewsHub {
    state: Mutex<HubState>,
    fanout: Broadcaster<Vec<NewsItem>>,
}

impl NewsHub {
    pub fn new(capacity: usize, retention: RetentionPolicy) -> Self {
        Self {
            state: Mutex::new(HubState {
                buffer: RollingBuffer::new(capacity),
                dedup: DedupIndex::new(retention),
            }),
            fanout: Broadcaster::new(),
        }
    }

    /// Filter `items` down to the ones never seen before, marking them seen.
    /// Fresh items enter the buffer later, at `commit` time.
    pub fn screen(&self, items: Vec<NewsItem>) -> Vec<NewsItem> {
        let mut state = self.state.lock().expect("news hub poisoned");
        items
            .into_iter()
            .filter(|item| {
                if state.dedup.seen(&item.id) {
                    false
                } else {
                    state.dedup.mark(&item.id);
                    true
                }
            })
            .collect()
    }

    /// Push a cycle's fresh batch into the buffer (in batch order, so later
    /// entries end up closer to the head) and broadcast it as one message.
    /// Returns the number of subscribers reached.
    pub fn commit(&self, batch: Vec<NewsItem>) -> usize {
        if batch.is_empty() {
            return 0;
        }
        let mut state = self.state.lock().expect("news hub poisoned");
        for item in &batch {
            state.buffer.push_front(item.clone());
        }
        self.fanout.broadcast(&batch)
    }

    pub fn snapshot(&self) -> Vec<NewsItem> {
        self.state
            .lock()
            .expect("news hub poisoned")
            .buffer
            .snapshot()
    }

    /// Register a live connection: returns the buffer contents at exactly
    /// registration time together with the delivery channel.
    pub fn subscribe(&self) -> (Vec<NewsItem>, Subscription<Vec<NewsItem>>) {
        let state = self.state.lock().expect("news hub poisoned");
        let snapshot = state.buffer.snapshot();
        let subscription = self.fanout.subscribe();
        (snapshot, subscription)
    }

    pub fn unsubscribe(&self, id: SubscriberId) {
        self.fanout.unsubscribe(id);
    }

    pub fn subscriber_count(&self) -> usize {
        self.fanout.len()
    }

    pub fn len(&self) -> usize {
        self.state.lock().expect("news hub poisoned").buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for NewsHub {
    fn default() -> Self {
        Self::new(RollingBuffer::DEFAULT_CAPACITY, RetentionPolicy::Unbounded)
    }
}
