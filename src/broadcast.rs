//! # Broadcaster
//! Fan-out of tick snapshots to live streaming subscribers.
//!
//! Every subscriber owns a bounded queue and delivery never waits: a queue
//! that is gone or full at fan-out time gets its subscriber pruned in the
//! same call, so the registry only ever holds channels that accepted the
//! last message. Dropping a `Subscription` unregisters it.

use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use futures::Stream;
use metrics::{counter, gauge};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::model::{NarrativeItem, ScoreSample};

/// One fan-out payload, tagged for the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Scores { scores: Vec<ScoreSample> },
    Narratives { narratives: Vec<NarrativeItem> },
}

#[derive(Debug)]
struct Entry {
    id: u64,
    tx: mpsc::Sender<StreamEvent>,
}

#[derive(Debug)]
pub struct Broadcaster {
    entries: Mutex<Vec<Entry>>,
    queue_cap: usize,
    next_id: AtomicU64,
}

impl Broadcaster {
    pub fn new(queue_cap: usize) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            queue_cap: queue_cap.max(1),
            next_id: AtomicU64::new(0),
        }
    }

    /// Register a new subscriber. The returned handle receives every future
    /// fan-out and unregisters itself on drop.
    pub fn subscribe(self: Arc<Self>) -> Subscription {
        let (tx, rx) = mpsc::channel(self.queue_cap);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        {
            let mut entries = self.entries.lock().expect("broadcaster mutex poisoned");
            entries.push(Entry { id, tx });
            gauge!("stream_subscribers").set(entries.len() as f64);
        }
        Subscription {
            id,
            rx,
            broadcaster: self,
        }
    }

    /// Deliver to every registered subscriber. Subscribers whose channel is
    /// closed or full are removed as part of this same call; no retry.
    pub fn fanout(&self, event: &StreamEvent) {
        let mut entries = self.entries.lock().expect("broadcaster mutex poisoned");
        let before = entries.len();
        entries.retain(|entry| match entry.tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Closed(_)) | Err(TrySendError::Full(_)) => false,
        });
        let pruned = before - entries.len();
        if pruned > 0 {
            counter!("stream_pruned_subscribers_total").increment(pruned as u64);
            tracing::debug!(pruned, "dropped unresponsive subscribers");
        }
        gauge!("stream_subscribers").set(entries.len() as f64);
    }

    pub fn subscriber_count(&self) -> usize {
        self.entries.lock().expect("broadcaster mutex poisoned").len()
    }

    fn unregister(&self, id: u64) {
        let mut entries = self.entries.lock().expect("broadcaster mutex poisoned");
        entries.retain(|e| e.id != id);
        gauge!("stream_subscribers").set(entries.len() as f64);
    }
}

/// Receiving half of one streaming session.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    rx: mpsc::Receiver<StreamEvent>,
    broadcaster: Arc<Broadcaster>,
}

impl Subscription {
    /// Next fan-out event; `None` once this subscriber was pruned.
    pub async fn recv(&mut self) -> Option<StreamEvent> {
        self.rx.recv().await
    }
}

impl Stream for Subscription {
    type Item = StreamEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.broadcaster.unregister(self.id);
    }
}
