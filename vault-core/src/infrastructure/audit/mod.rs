//! Asynchronous audit pipeline.
//!
//! Producers submit entries to a bounded queue and never block: a full
//! queue drops the entry with a best-effort warning. A single processor
//! task appends each entry to the retained in-process store, writes one
//! JSON line to the configured sink, then offers the entry to every
//! subscriber non-blockingly. Correctness of the audited operation never
//! depends on audit throughput.

use crate::domain::AuditEntry;
use chrono::{DateTime, Utc};
use log::{error, warn};
use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Delivery channel capacity per subscriber. Slow subscribers lose
/// entries rather than stalling the processor.
const SUBSCRIBER_BUFFER: usize = 64;

struct AuditShared {
    retained: RwLock<Vec<AuditEntry>>,
    subscribers: RwLock<HashMap<String, mpsc::Sender<AuditEntry>>>,
}

/// Async audit logger decoupling the request path from log writes.
pub struct AuditLogger {
    tx: Mutex<Option<mpsc::Sender<AuditEntry>>>,
    shared: Arc<AuditShared>,
    processor: Mutex<Option<JoinHandle<()>>>,
}

/// A live audit subscription. Dropping the handle deregisters it; the
/// cleanup runs on every termination path of the consuming stream.
pub struct AuditSubscription {
    id: String,
    rx: mpsc::Receiver<AuditEntry>,
    shared: Arc<AuditShared>,
}

impl AuditSubscription {
    /// Receives the next entry, or `None` once the channel is closed.
    pub async fn recv(&mut self) -> Option<AuditEntry> {
        self.rx.recv().await
    }
}

impl Drop for AuditSubscription {
    fn drop(&mut self) {
        if let Ok(mut subscribers) = self.shared.subscribers.write() {
            subscribers.remove(&self.id);
        }
    }
}

impl AuditLogger {
    /// Creates a logger with the given queue capacity and optional line
    /// sink, and spawns its processor task on the current runtime.
    pub fn new(buffer: usize, sink: Option<Box<dyn Write + Send>>) -> Self {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let shared = Arc::new(AuditShared { retained: RwLock::new(Vec::new()), subscribers: RwLock::new(HashMap::new()) });
        let processor = tokio::spawn(process_loop(rx, Arc::clone(&shared), sink));
        Self { tx: Mutex::new(Some(tx)), shared, processor: Mutex::new(Some(processor)) }
    }

    /// Submits an entry to the pipeline. Never blocks; a full queue drops
    /// the entry and the caller is not notified.
    pub fn log(&self, operation: &str, key_id: &str, status: &str, peer_address: &str, metadata: BTreeMap<String, String>) {
        let entry = AuditEntry {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            operation: operation.to_string(),
            key_id: key_id.to_string(),
            status: status.to_string(),
            peer_address: peer_address.to_string(),
            metadata,
        };

        let tx = match self.tx.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => None,
        };
        let Some(tx) = tx else {
            warn!("audit logger closed, dropping entry operation={operation}");
            return;
        };

        match tx.try_send(entry) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => warn!("audit log buffer full, dropping entry operation={operation}"),
            Err(TrySendError::Closed(_)) => warn!("audit processor stopped, dropping entry operation={operation}"),
        }
    }

    /// Returns retained entries matching every provided filter, newest
    /// first, truncated to `limit` when `limit > 0`. Empty strings and
    /// `None` bounds mean "no filter on this dimension".
    pub fn query(
        &self,
        key_id: &str,
        operation: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        limit: usize,
    ) -> Vec<AuditEntry> {
        let retained = match self.shared.retained.read() {
            Ok(guard) => guard,
            Err(_) => return Vec::new(),
        };

        let mut results = Vec::new();
        for entry in retained.iter().rev() {
            if !key_id.is_empty() && entry.key_id != key_id {
                continue;
            }
            if !operation.is_empty() && entry.operation != operation {
                continue;
            }
            if start.map_or(false, |bound| entry.timestamp < bound) {
                continue;
            }
            if end.map_or(false, |bound| entry.timestamp > bound) {
                continue;
            }
            results.push(entry.clone());
            if limit > 0 && results.len() >= limit {
                break;
            }
        }
        results
    }

    /// Registers a subscriber with a bounded delivery channel.
    pub fn subscribe(&self) -> AuditSubscription {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        let id = Uuid::new_v4().to_string();
        if let Ok(mut subscribers) = self.shared.subscribers.write() {
            subscribers.insert(id.clone(), tx);
        }
        AuditSubscription { id, rx, shared: Arc::clone(&self.shared) }
    }

    /// Stops accepting entries, drains the queue, and waits for the
    /// processor to finish. After `close` returns, `query` observes every
    /// entry that was successfully enqueued beforehand.
    pub async fn close(&self) {
        if let Ok(mut guard) = self.tx.lock() {
            guard.take();
        }
        let processor = match self.processor.lock() {
            Ok(mut guard) => guard.take(),
            Err(_) => None,
        };
        if let Some(handle) = processor {
            let _ = handle.await;
        }
    }
}

async fn process_loop(mut rx: mpsc::Receiver<AuditEntry>, shared: Arc<AuditShared>, mut sink: Option<Box<dyn Write + Send>>) {
    while let Some(entry) = rx.recv().await {
        if let Ok(mut retained) = shared.retained.write() {
            retained.push(entry.clone());
        }

        if let Some(out) = sink.as_mut() {
            match serde_json::to_string(&entry) {
                Ok(line) => {
                    let _ = writeln!(out, "{line}");
                    let _ = out.flush();
                }
                Err(err) => error!("audit marshal error={err}"),
            }
        }

        if let Ok(subscribers) = shared.subscribers.read() {
            for tx in subscribers.values() {
                // Subscriber too slow: drop, never block the processor.
                let _ = tx.try_send(entry.clone());
            }
        }
    }
}
