//! # Incident Log
//! Capped in-memory tail of recent failures plus unconditional durable
//! append. Recording never fails the caller; a log that cannot persist
//! still keeps its in-memory view.

use std::collections::VecDeque;
use std::sync::Mutex;

use metrics::counter;

use crate::model::{now_ts, Incident, IncidentKind};
use crate::store::SqliteStore;

#[derive(Debug)]
pub struct IncidentLog {
    inner: Mutex<VecDeque<Incident>>,
    cap: usize,
    store: SqliteStore,
}

impl IncidentLog {
    pub fn new(store: SqliteStore, cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            inner: Mutex::new(VecDeque::with_capacity(cap.min(1024))),
            cap,
            store,
        }
    }

    /// Append to the tail and the durable log.
    pub fn record(&self, kind: IncidentKind, message: impl Into<String>) {
        let incident = Incident {
            kind,
            message: message.into(),
            timestamp: now_ts(),
        };
        tracing::warn!(kind = kind.as_str(), message = %incident.message, "incident");
        match kind {
            IncidentKind::FetchError => counter!("aggregator_fetch_errors_total").increment(1),
            IncidentKind::LoopError => counter!("aggregator_loop_errors_total").increment(1),
        }

        if let Err(e) = self.store.append_incident(&incident) {
            tracing::warn!("incident not persisted: {e:#}");
        }

        let mut tail = self.inner.lock().expect("incident log mutex poisoned");
        if tail.len() == self.cap {
            tail.pop_front();
        }
        tail.push_back(incident);
    }

    /// The retained tail, oldest first.
    pub fn snapshot(&self) -> Vec<Incident> {
        let tail = self.inner.lock().expect("incident log mutex poisoned");
        tail.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("incident log mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn tail_is_capped_but_every_record_persists() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("pulse.db");
        let store = SqliteStore::open(&db_path).unwrap();
        let log = IncidentLog::new(store, 3);

        for i in 0..5 {
            log.record(IncidentKind::FetchError, format!("boom {i}"));
        }

        let tail = log.snapshot();
        assert_eq!(tail.len(), 3);
        assert_eq!(tail[0].message, "boom 2");
        assert_eq!(tail[2].message, "boom 4");

        let conn = rusqlite::Connection::open(&db_path).unwrap();
        let persisted: i64 = conn
            .query_row("SELECT COUNT(*) FROM incidents", [], |row| row.get(0))
            .unwrap();
        assert_eq!(persisted, 5);
    }

    #[test]
    fn recording_survives_a_broken_store() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("pulse.db");
        let store = SqliteStore::open(&db_path).unwrap();
        let log = IncidentLog::new(store, 10);

        // Break the database file out from under the log
        std::fs::remove_file(&db_path).unwrap();
        std::fs::create_dir(&db_path).unwrap();

        log.record(IncidentKind::LoopError, "tick exploded");
        assert_eq!(log.snapshot().len(), 1);
        assert_eq!(log.snapshot()[0].kind, IncidentKind::LoopError);
    }
}
