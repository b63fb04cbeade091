//! Shared state between the aggregation worker and the HTTP layer.

use std::sync::{Arc, RwLock};
use std::time::Instant;

use crate::broadcast::{Broadcaster, Subscription};
use crate::incident::IncidentLog;
use crate::model::{NarrativeItem, ScoreSample};

/// Everything a read endpoint can serve, produced by exactly one tick.
#[derive(Debug, Clone, Default)]
pub struct Snapshots {
    pub scores: Vec<ScoreSample>,
    pub narratives: Vec<NarrativeItem>,
}

#[derive(Clone)]
pub struct AppState {
    snapshots: Arc<RwLock<Snapshots>>,
    incidents: Arc<IncidentLog>,
    broadcaster: Arc<Broadcaster>,
    started_at: Instant,
}

impl AppState {
    pub fn new(incidents: Arc<IncidentLog>, broadcaster: Arc<Broadcaster>) -> Self {
        Self {
            snapshots: Arc::new(RwLock::new(Snapshots::default())),
            incidents,
            broadcaster,
            started_at: Instant::now(),
        }
    }

    /// Swaps the whole value, so readers never observe a half-written tick.
    pub fn replace_snapshots(&self, next: Snapshots) {
        let mut guard = self.snapshots.write().expect("snapshots rwlock poisoned");
        *guard = next;
    }

    pub fn snapshots(&self) -> Snapshots {
        self.snapshots
            .read()
            .expect("snapshots rwlock poisoned")
            .clone()
    }

    pub fn incidents(&self) -> &IncidentLog {
        &self.incidents
    }

    pub fn broadcaster(&self) -> &Arc<Broadcaster> {
        &self.broadcaster
    }

    pub fn subscribe(&self) -> Subscription {
        self.broadcaster.clone().subscribe()
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
