//! Per-key snapshot fan-out
//!
//! Every listener on a key sees the latest full snapshot published for it.
//! Intermediate snapshots may be skipped when a listener falls behind, but
//! the last one is never lost. Dropping a [`Subscription`] unsubscribes it.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::debug;

type Slot<T> = watch::Sender<Option<Arc<T>>>;

pub struct SnapshotHub<T> {
    channels: Arc<Mutex<HashMap<String, Slot<T>>>>,
}

impl<T> Clone for SnapshotHub<T> {
    fn clone(&self) -> Self {
        Self {
            channels: Arc::clone(&self.channels),
        }
    }
}

impl<T> Default for SnapshotHub<T> {
    fn default() -> Self {
        Self {
            channels: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<T> SnapshotHub<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start listening on `key`
    pub fn subscribe(&self, key: &str) -> Subscription<T> {
        let mut channels = self.channels.lock();
        let receiver = match channels.get(key) {
            Some(sender) => sender.subscribe(),
            None => {
                let (sender, receiver) = watch::channel(None);
                channels.insert(key.to_string(), sender);
                receiver
            }
        };

        debug!("New listener on {}", key);
        Subscription {
            key: key.to_string(),
            receiver,
        }
    }

    /// Replace the snapshot for `key`; returns how many listeners will see it
    ///
    /// Keys nobody listens to are dropped rather than kept around.
    pub fn publish(&self, key: &str, snapshot: T) -> usize {
        let mut channels = self.channels.lock();
        let Some(sender) = channels.get(key) else {
            return 0;
        };

        let listeners = sender.receiver_count();
        if listeners == 0 {
            channels.remove(key);
            return 0;
        }

        sender.send_replace(Some(Arc::new(snapshot)));
        listeners
    }

    pub fn listener_count(&self, key: &str) -> usize {
        self.channels
            .lock()
            .get(key)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }
}

/// A live listener on one key
pub struct Subscription<T> {
    key: String,
    receiver: watch::Receiver<Option<Arc<T>>>,
}

impl<T> Subscription<T> {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Wait for the next snapshot; `None` once the hub is gone
    pub async fn next(&mut self) -> Option<Arc<T>> {
        loop {
            self.receiver.changed().await.ok()?;
            if let Some(snapshot) = self.receiver.borrow_and_update().clone() {
                return Some(snapshot);
            }
        }
    }

    /// The most recent snapshot without waiting
    pub fn latest(&self) -> Option<Arc<T>> {
        self.receiver.borrow().clone()
    }
}
