//! Typed change-event channels connecting services to their observers.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Default channel capacity for event streams.
///
/// Set high (128) so bursts of changes reach slow observers without the
/// publisher ever blocking.
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 128;

/// Receiving side of a subscription. Dropping it unsubscribes.
pub type EventRx<E> = mpsc::Receiver<Arc<E>>;

/// Fan-out publisher for one kind of change event.
///
/// Each `subscribe` call gets its own bounded channel; publishing clones an
/// `Arc` of the event to every live subscriber. Sends are best-effort: a
/// subscriber that fell behind misses events instead of blocking the
/// publisher, and closed channels are pruned on the next publish.
pub struct EventHub<E> {
    subscribers: Mutex<Vec<mpsc::Sender<Arc<E>>>>,
}

impl<E> EventHub<E> {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Registers a new observer and returns its receiving end.
    pub fn subscribe(&self) -> EventRx<E> {
        let (tx, rx) = mpsc::channel(DEFAULT_EVENT_CHANNEL_CAPACITY);
        self.subscribers
            .lock()
            .expect("subscriber list lock poisoned")
            .push(tx);
        rx
    }

    /// Publishes an event to every live subscriber.
    pub fn publish(&self, event: E) {
        let event = Arc::new(event);
        self.subscribers
            .lock()
            .expect("subscriber list lock poisoned")
            .retain(|tx| {
                match tx.try_send(Arc::clone(&event)) {
                    Ok(()) | Err(TrySendError::Full(_)) => true, // drop this event, keep channel
                    Err(TrySendError::Closed(_)) => false,       // remove closed channel
                }
            });
    }
}

impl<E> Default for EventHub<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test: every subscriber receives a published event.
    #[tokio::test]
    async fn test_publish_reaches_all_subscribers() {
        let hub = EventHub::new();
        let mut rx1 = hub.subscribe();
        let mut rx2 = hub.subscribe();

        hub.publish(42u32);

        assert_eq!(*rx1.recv().await.unwrap(), 42);
        assert_eq!(*rx2.recv().await.unwrap(), 42);
    }

    /// Test: dropping a receiver unsubscribes it; the rest keep receiving.
    #[tokio::test]
    async fn test_dropped_receiver_is_pruned() {
        let hub = EventHub::new();
        let rx1 = hub.subscribe();
        let mut rx2 = hub.subscribe();

        drop(rx1);
        hub.publish("first");
        hub.publish("second");

        assert_eq!(*rx2.recv().await.unwrap(), "first");
        assert_eq!(*rx2.recv().await.unwrap(), "second");
    }

    /// Test: publishing with no subscribers is a no-op.
    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let hub: EventHub<u32> = EventHub::new();
        hub.publish(1);
    }
}
