//! Live-update broadcast hub.
//!
//! Mutation paths call [`BroadcastHub::notify`] after changing visible state;
//! every open subscriber receives a "content changed" marker and is expected
//! to re-fetch current state. Delivery is best-effort by design: a subscriber
//! whose channel is full at notify time is skipped rather than letting it
//! stall the notifier or other subscribers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

/// Per-subscriber channel capacity. Markers carry no payload, so a short
/// buffer is enough; anything the client misses is recovered by re-fetching.
const CHANNEL_CAPACITY: usize = 8;

/// A message delivered to live-update subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMessage {
    /// Initial acknowledgement, sent once on subscribe
    Connected,

    /// Content changed; re-fetch current state
    ContentChanged,
}

impl UpdateMessage {
    /// The literal stream payload
    pub fn payload(&self) -> &'static str {
        match self {
            UpdateMessage::Connected => "connected",
            UpdateMessage::ContentChanged => "update",
        }
    }

    /// The server-sent-events frame for this message: `data: <payload>`
    /// followed by a blank line.
    pub fn sse_frame(&self) -> String {
        format!("data: {}\n\n", self.payload())
    }
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    subscribers: HashMap<u64, mpsc::Sender<UpdateMessage>>,
}

/// Process-wide registry of live-update subscribers.
///
/// Cheap to clone; all clones share one registry.
#[derive(Clone, Default)]
pub struct BroadcastHub {
    registry: Arc<Mutex<Registry>>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber.
    ///
    /// The returned subscription already holds a [`UpdateMessage::Connected`]
    /// acknowledgement so the caller can confirm the stream is live. Dropping
    /// the subscription unregisters it.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

        // Capacity is fresh, so the acknowledgement cannot be dropped.
        let _ = tx.try_send(UpdateMessage::Connected);

        let mut registry = self.registry.lock().expect("hub registry poisoned");
        let id = registry.next_id;
        registry.next_id += 1;
        registry.subscribers.insert(id, tx);
        drop(registry);

        tracing::debug!("Subscriber {} connected", id);

        Subscription {
            id,
            rx,
            hub: self.registry.clone(),
        }
    }

    /// Deliver a "content changed" marker to every subscriber whose channel
    /// has room. Returns how many subscribers accepted the marker.
    pub fn notify(&self) -> usize {
        let registry = self.registry.lock().expect("hub registry poisoned");
        let mut delivered = 0;
        for (id, tx) in registry.subscribers.iter() {
            match tx.try_send(UpdateMessage::ContentChanged) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::debug!("Subscriber {} not ready, skipping", id);
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    // Receiver already gone; Drop of the subscription will
                    // remove the slot.
                }
            }
        }
        delivered
    }

    /// Number of currently registered subscribers
    pub fn subscriber_count(&self) -> usize {
        self.registry
            .lock()
            .expect("hub registry poisoned")
            .subscribers
            .len()
    }
}

/// A live-update subscription owned by one connection.
///
/// Messages are read with [`Subscription::recv`]; the subscriber is removed
/// from the hub when this value is dropped.
pub struct Subscription {
    id: u64,
    rx: mpsc::Receiver<UpdateMessage>,
    hub: Arc<Mutex<Registry>>,
}

impl Subscription {
    /// Wait for the next message. Returns `None` once the subscription has
    /// been closed.
    pub async fn recv(&mut self) -> Option<UpdateMessage> {
        self.rx.recv().await
    }

    /// Non-blocking read, mainly for tests and polling callers
    pub fn try_recv(&mut self) -> Option<UpdateMessage> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Ok(mut registry) = self.hub.lock() {
            registry.subscribers.remove(&self.id);
        }
        tracing::debug!("Subscriber {} disconnected", self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notify_without_subscribers_is_noop() {
        let hub = BroadcastHub::new();
        assert_eq!(hub.notify(), 0);
    }

    #[tokio::test]
    async fn test_subscribe_receives_acknowledgement_first() {
        let hub = BroadcastHub::new();
        let mut sub = hub.subscribe();
        assert_eq!(sub.recv().await, Some(UpdateMessage::Connected));
    }

    #[tokio::test]
    async fn test_each_ready_subscriber_receives_one_marker() {
        let hub = BroadcastHub::new();
        let mut subs: Vec<_> = (0..3).map(|_| hub.subscribe()).collect();

        assert_eq!(hub.notify(), 3);

        for sub in subs.iter_mut() {
            assert_eq!(sub.recv().await, Some(UpdateMessage::Connected));
            assert_eq!(sub.recv().await, Some(UpdateMessage::ContentChanged));
            assert!(sub.try_recv().is_none());
        }
    }

    #[tokio::test]
    async fn test_slow_subscriber_is_skipped_not_blocked() {
        let hub = BroadcastHub::new();
        let mut slow = hub.subscribe();
        let mut ready = hub.subscribe();

        // Fill the slow subscriber's buffer without draining it.
        for _ in 0..CHANNEL_CAPACITY {
            hub.notify();
        }

        // Buffer full: only the drained subscriber can accept more.
        while ready.try_recv().is_some() {}
        assert_eq!(hub.notify(), 1);

        assert_eq!(ready.try_recv(), Some(UpdateMessage::ContentChanged));
        assert_eq!(slow.recv().await, Some(UpdateMessage::Connected));
    }

    #[tokio::test]
    async fn test_drop_unregisters_subscriber() {
        let hub = BroadcastHub::new();
        let sub = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 1);
        drop(sub);
        assert_eq!(hub.subscriber_count(), 0);
        assert_eq!(hub.notify(), 0);
    }

    #[test]
    fn test_sse_frame_format() {
        assert_eq!(UpdateMessage::Connected.sse_frame(), "data: connected\n\n");
        assert_eq!(
            UpdateMessage::ContentChanged.sse_frame(),
            "data: update\n\n"
        );
    }
}
