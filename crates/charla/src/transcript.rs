//! Transcript hub: per-thread append subscriptions.
//!
//! The relay publishes every stored message here; transcript feeds hold a
//! [`TranscriptSubscription`] and receive appends for one thread in
//! insertion order. The handle owns its registry slot: dropping it (socket
//! close, switching threads) detaches the subscriber, so listeners cannot
//! accumulate across re-subscribes.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::warn;

use crate::chat::Message;

/// Size of the per-subscription buffer.
const SUBSCRIPTION_BUFFER_SIZE: usize = 64;

type Subscriber = (u64, mpsc::Sender<Message>);

/// Registry of live transcript subscriptions, keyed by thread.
pub struct TranscriptHub {
    subscribers: DashMap<String, Vec<Subscriber>>,
    next_token: AtomicU64,
}

impl TranscriptHub {
    /// Create a new hub.
    pub fn new() -> Self {
        Self {
            subscribers: DashMap::new(),
            next_token: AtomicU64::new(0),
        }
    }

    /// Attach a subscriber to a thread's append stream.
    pub fn subscribe(self: &Arc<Self>, thread_id: &str) -> TranscriptSubscription {
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER_SIZE);
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);

        self.subscribers
            .entry(thread_id.to_string())
            .or_default()
            .push((token, tx));

        TranscriptSubscription {
            hub: Arc::clone(self),
            thread_id: thread_id.to_string(),
            token,
            rx,
        }
    }

    /// Deliver an appended message to every subscriber of its thread.
    pub async fn publish(&self, message: &Message) {
        let senders: Vec<mpsc::Sender<Message>> = match self.subscribers.get(&message.thread_id) {
            Some(entry) => entry.iter().map(|(_, tx)| tx.clone()).collect(),
            None => return,
        };

        for tx in senders {
            if tx.send(message.clone()).await.is_err() {
                warn!(thread_id = %message.thread_id, "Dropping closed transcript subscriber");
            }
        }

        // Sweep senders whose receivers have gone away.
        if let Some(mut entry) = self.subscribers.get_mut(&message.thread_id) {
            entry.retain(|(_, tx)| !tx.is_closed());
        }
        self.subscribers.retain(|_, subs| !subs.is_empty());
    }

    fn detach(&self, thread_id: &str, token: u64) {
        if let Some(mut entry) = self.subscribers.get_mut(thread_id) {
            entry.retain(|(t, _)| *t != token);
        }
        self.subscribers.retain(|_, subs| !subs.is_empty());
    }

    /// Number of live subscribers for a thread.
    pub fn subscriber_count(&self, thread_id: &str) -> usize {
        self.subscribers
            .get(thread_id)
            .map(|subs| subs.len())
            .unwrap_or(0)
    }
}

impl Default for TranscriptHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Owned handle to one thread's append stream.
pub struct TranscriptSubscription {
    hub: Arc<TranscriptHub>,
    thread_id: String,
    token: u64,
    rx: mpsc::Receiver<Message>,
}

impl TranscriptSubscription {
    /// Thread this subscription is attached to.
    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    /// Receive the next appended message, or `None` once detached.
    pub async fn recv(&mut self) -> Option<Message> {
        self.rx.recv().await
    }
}

impl Drop for TranscriptSubscription {
    fn drop(&mut self) {
        self.hub.detach(&self.thread_id, self.token);
    }
}
