use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tokio::sync::mpsc;

pub type SubscriberId = u64;

/// One live subscriber: a registry id plus the receiving half of its
/// delivery channel. Dropping the subscription is enough to disconnect;
/// the registry prunes the dead sender on the next broadcast.
pub struct Subscription<T> {
    pub id: SubscriberId,
    pub receiver: mpsc::UnboundedReceiver<T>,
}

/// Registry of live connections for one fan-out channel, generic over the
/// message payload. Broadcast is best-effort: a failed delivery removes that
/// subscriber and never blocks delivery to the rest.
pub struct Broadcaster<T> {
    subscribers: Mutex<HashMap<SubscriberId, mpsc::UnboundedSender<T>>>,
    next_id: AtomicU64,
}

impl<T: Clone> Broadcaster<T> {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn subscribe(&self) -> Subscription<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers
            .lock()
            .expect("subscriber registry poisoned")
            .insert(id, tx);
        Subscription { id, receiver: rx }
    }

    /// Idempotent removal; unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriberId) {
        self.subscribers
            .lock()
            .expect("subscriber registry poisoned")
            .remove(&id);
    }

    /// Deliver `message` to every registered subscriber. Subscribers whose
    /// channel is gone are dropped from the registry as a side effect.
    /// Returns the number of successful deliveries.
    pub fn broadcast(&self, message: &T) -> usize {
        let mut subscribers = self
            .subscribers
            .lock()
            .expect("subscriber registry poisoned");
        let mut dead = Vec::new();
        let mut delivered = 0;
        for (id, tx) in subscribers.iter() {
            if tx.send(message.clone()).is_ok() {
                delivered += 1;
            } else {
                dead.push(*id);
            }
        }
        for id in dead {
            subscribers.remove(&id);
        }
        delivered
    }

    pub fn len(&self) -> usize {
        self.subscribers
            .lock()
            .expect("subscriber registry poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone> Default for Broadcaster<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn broadcast_reaches_all_subscribers() {
        let fanout: Broadcaster<u32> = Broadcaster::new();
        let mut a = fanout.subscribe();
        let mut b = fanout.subscribe();

        assert_eq!(fanout.broadcast(&7), 2);
        assert_eq!(a.receiver.recv().await, Some(7));
        assert_eq!(b.receiver.recv().await, Some(7));
    }

    #[tokio::test]
    async fn broadcast_prunes_broken_connections() {
        let fanout: Broadcaster<u32> = Broadcaster::new();
        let mut a = fanout.subscribe();
        let broken = fanout.subscribe();
        let mut c = fanout.subscribe();
        assert_eq!(fanout.len(), 3);

        // Dropping the receiver simulates a peer whose socket is gone.
        drop(broken.receiver);

        assert_eq!(fanout.broadcast(&1), 2);
        assert_eq!(fanout.len(), 2);
        assert_eq!(a.receiver.recv().await, Some(1));
        assert_eq!(c.receiver.recv().await, Some(1));

        // Registry still accepts new subscribers afterwards.
        let _d = fanout.subscribe();
        assert_eq!(fanout.len(), 3);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let fanout: Broadcaster<u32> = Broadcaster::new();
        let sub = fanout.subscribe();
        fanout.unsubscribe(sub.id);
        fanout.unsubscribe(sub.id);
        assert!(fanout.is_empty());
    }
}
