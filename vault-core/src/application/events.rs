//! Key lifecycle event fan-out.
//!
//! Subscribers are values owned by the bus and cleaned up on stream end
//! via drop-guarded deregistration. Publication holds a read lock and
//! offers the event non-blockingly: a monitoring channel must never exert
//! backpressure on the key-lifecycle path.

use crate::domain::{KeyEvent, KeyEventKind, KeyMetadata};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;

/// Delivery channel capacity per subscriber.
const SUBSCRIBER_BUFFER: usize = 32;

struct BusInner {
    subscribers: RwLock<HashMap<u64, mpsc::Sender<KeyEvent>>>,
    next_id: AtomicU64,
}

/// Fan-out of key lifecycle events to concurrent subscribers.
#[derive(Clone)]
pub struct KeyEventBus {
    inner: Arc<BusInner>,
}

/// A live event subscription; dropping it deregisters the subscriber.
pub struct KeyEventSubscription {
    id: u64,
    rx: mpsc::Receiver<KeyEvent>,
    inner: Arc<BusInner>,
}

impl KeyEventBus {
    pub fn new() -> Self {
        Self { inner: Arc::new(BusInner { subscribers: RwLock::new(HashMap::new()), next_id: AtomicU64::new(0) }) }
    }

    /// Publishes a lifecycle event to every subscriber without blocking.
    /// Events dropped for a slow subscriber are not re-delivered.
    pub fn publish(&self, kind: KeyEventKind, metadata: KeyMetadata) {
        let event = KeyEvent { kind, metadata, timestamp: Utc::now() };
        if let Ok(subscribers) = self.inner.subscribers.read() {
            for tx in subscribers.values() {
                let _ = tx.try_send(event.clone());
            }
        }
    }

    pub fn subscribe(&self) -> KeyEventSubscription {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut subscribers) = self.inner.subscribers.write() {
            subscribers.insert(id, tx);
        }
        KeyEventSubscription { id, rx, inner: Arc::clone(&self.inner) }
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.read().map(|subscribers| subscribers.len()).unwrap_or(0)
    }
}

impl Default for KeyEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyEventSubscription {
    /// Receives the next event, or `None` once the channel is closed.
    pub async fn recv(&mut self) -> Option<KeyEvent> {
        self.rx.recv().await
    }
}

impl Drop for KeyEventSubscription {
    fn drop(&mut self) {
        if let Ok(mut subscribers) = self.inner.subscribers.write() {
            subscribers.remove(&self.id);
        }
    }
}
