use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc;

/// Handle returned by [`Emitter::subscribe`], used to unsubscribe
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Receiving side of a subscription
#[derive(Debug)]
pub struct Subscription<E> {
    id: SubscriptionId,
    receiver: mpsc::UnboundedReceiver<E>,
}

impl<E> Subscription<E> {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Wait for the next event; `None` once unsubscribed and drained
    pub async fn recv(&mut self) -> Option<E> {
        self.receiver.recv().await
    }

    /// Next event if one is already queued
    pub fn try_recv(&mut self) -> Option<E> {
        self.receiver.try_recv().ok()
    }

    /// All queued events, oldest first
    pub fn drain(&mut self) -> Vec<E> {
        let mut events = Vec::new();
        while let Some(event) = self.try_recv() {
            events.push(event);
        }
        events
    }
}

/// Typed publish/subscribe list
///
/// `emit` never blocks: every subscriber owns an unbounded queue, and events
/// land in each queue in the order `emit` was called. Subscribers whose
/// receiver was dropped are pruned on the next emit.
pub struct Emitter<E> {
    subscribers: Mutex<Vec<(SubscriptionId, mpsc::UnboundedSender<E>)>>,
    next_id: AtomicU64,
}

impl<E: Clone> Emitter<E> {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> Subscription<E> {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, receiver) = mpsc::unbounded_channel();
        self.subscribers.lock().push((id, tx));
        Subscription { id, receiver }
    }

    /// Stop delivering to `id`. Events already queued stay readable.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.lock();
        let before = subscribers.len();
        subscribers.retain(|(sub_id, _)| *sub_id != id);
        subscribers.len() != before
    }

    pub fn emit(&self, event: E) {
        self.subscribers
            .lock()
            .retain(|(_, tx)| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

impl<E: Clone> Default for Emitter<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_arrive_in_emit_order() {
        let emitter = Emitter::new();
        let mut sub = emitter.subscribe();

        emitter.emit(1);
        emitter.emit(2);
        emitter.emit(3);

        assert_eq!(sub.drain(), vec![1, 2, 3]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let emitter = Emitter::new();
        let mut sub = emitter.subscribe();

        emitter.emit("before");
        assert!(emitter.unsubscribe(sub.id()));
        emitter.emit("after");

        assert_eq!(sub.drain(), vec!["before"]);
        assert!(!emitter.unsubscribe(sub.id()));
    }

    #[test]
    fn test_dropped_subscribers_are_pruned() {
        let emitter = Emitter::new();
        let sub = emitter.subscribe();
        let _kept = emitter.subscribe();
        drop(sub);

        emitter.emit(());
        assert_eq!(emitter.subscriber_count(), 1);
    }
}
