//! Subscriber registry for outbound console events.
//!
//! Every WebSocket session registers here and gets its own queue. Delivery
//! is fire-and-forget: a full queue drops the event for that subscriber and
//! a closed one is removed, so the engine is never blocked.

use cuelight_types::ConsoleEvent;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Opaque subscriber handle.
pub type SubscriberId = Uuid;

/// Default per-subscriber queue depth.
pub const DEFAULT_QUEUE_SIZE: usize = 256;

/// Registry of event subscribers keyed by id.
///
/// Sessions unregister explicitly when they end. A receiver dropped without
/// unregistering is removed on the next delivery attempt.
#[derive(Debug, Clone)]
pub struct SubscriberRegistry {
    inner: Arc<RwLock<HashMap<SubscriberId, mpsc::Sender<ConsoleEvent>>>>,
    queue_size: usize,
}

impl SubscriberRegistry {
    /// Create a new empty registry.
    pub fn new(queue_size: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            queue_size,
        }
    }

    /// Register a subscriber and return its id and event queue.
    pub async fn register(&self) -> (SubscriberId, mpsc::Receiver<ConsoleEvent>) {
        let (tx, rx) = mpsc::channel(self.queue_size);
        let id = Uuid::new_v4();
        let mut map = self.inner.write().await;
        map.insert(id, tx);
        info!(subscriber = %id, total = map.len(), "Subscriber registered");
        (id, rx)
    }

    /// Unregister a subscriber. Returns false if it was not registered.
    pub async fn unregister(&self, id: SubscriberId) -> bool {
        let mut map = self.inner.write().await;
        let removed = map.remove(&id).is_some();
        if removed {
            info!(subscriber = %id, total = map.len(), "Subscriber unregistered");
        }
        removed
    }

    /// Queue an event for every subscriber.
    pub async fn broadcast(&self, event: &ConsoleEvent) {
        let closed: Vec<SubscriberId> = {
            let map = self.inner.read().await;
            if map.is_empty() {
                return;
            }
            debug!("Broadcasting {}", event.description());

            map.iter()
                .filter(|(id, tx)| !deliver(**id, tx, event))
                .map(|(id, _)| *id)
                .collect()
        };
        self.remove_closed(&closed).await;
    }

    /// Queue an event for a single subscriber. Returns false if it is not
    /// registered or its queue is closed.
    pub async fn send_to(&self, id: SubscriberId, event: &ConsoleEvent) -> bool {
        let delivered = {
            let map = self.inner.read().await;
            let Some(tx) = map.get(&id) else {
                debug!(subscriber = %id, "No such subscriber for {}", event.description());
                return false;
            };
            deliver(id, tx, event)
        };
        if !delivered {
            self.remove_closed(&[id]).await;
        }
        delivered
    }

    async fn remove_closed(&self, ids: &[SubscriberId]) {
        if ids.is_empty() {
            return;
        }
        let mut map = self.inner.write().await;
        for id in ids {
            if map.remove(id).is_some() {
                info!(subscriber = %id, total = map.len(), "Removed closed subscriber");
            }
        }
    }

    /// Get the number of registered subscribers.
    pub async fn subscriber_count(&self) -> usize {
        self.inner.read().await.len()
    }
}

/// Try to queue `event`. Returns false only when the queue is closed; a
/// full queue drops the event but keeps the subscriber.
fn deliver(id: SubscriberId, tx: &mpsc::Sender<ConsoleEvent>, event: &ConsoleEvent) -> bool {
    match tx.try_send(event.clone()) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            warn!(subscriber = %id, "Subscriber lagging, dropping event");
            true
        }
        Err(TrySendError::Closed(_)) => {
            debug!(subscriber = %id, "Subscriber queue closed");
            false
        }
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cuelight_types::ListsPayload;

    fn event() -> ConsoleEvent {
        ConsoleEvent::GetLists(ListsPayload { lists: vec![] })
    }

    #[tokio::test]
    async fn test_register_and_broadcast() {
        let registry = SubscriberRegistry::default();
        assert_eq!(registry.subscriber_count().await, 0);

        let (_a, mut rx_a) = registry.register().await;
        let (_b, mut rx_b) = registry.register().await;
        assert_eq!(registry.subscriber_count().await, 2);

        registry.broadcast(&event()).await;
        assert_eq!(rx_a.recv().await, Some(event()));
        assert_eq!(rx_b.recv().await, Some(event()));
    }

    #[tokio::test]
    async fn test_unregister() {
        let registry = SubscriberRegistry::default();
        let (id, mut rx) = registry.register().await;

        assert!(registry.unregister(id).await);
        assert!(!registry.unregister(id).await);

        registry.broadcast(&event()).await;
        // Sender dropped on unregister
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking() {
        let registry = SubscriberRegistry::new(1);
        let (_id, mut rx) = registry.register().await;

        registry.broadcast(&event()).await;
        registry.broadcast(&event()).await;

        assert!(rx.recv().await.is_some());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_closed_queue_is_removed_on_broadcast() {
        let registry = SubscriberRegistry::default();
        let (id, rx) = registry.register().await;
        let (_live, mut live_rx) = registry.register().await;
        drop(rx);

        registry.broadcast(&event()).await;
        assert_eq!(registry.subscriber_count().await, 1);
        assert!(!registry.unregister(id).await);
        assert_eq!(live_rx.recv().await, Some(event()));
    }

    #[tokio::test]
    async fn test_send_to_one_subscriber() {
        let registry = SubscriberRegistry::default();
        let (a, mut rx_a) = registry.register().await;
        let (_b, mut rx_b) = registry.register().await;

        assert!(registry.send_to(a, &event()).await);
        assert_eq!(rx_a.recv().await, Some(event()));
        assert!(rx_b.try_recv().is_err());

        drop(rx_a);
        assert!(!registry.send_to(a, &event()).await);
        assert_eq!(registry.subscriber_count().await, 1);
        assert!(!registry.send_to(Uuid::new_v4(), &event()).await);
    }
}
