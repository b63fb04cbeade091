//! # Persistence Store
//! Append-only SQLite log of score samples, narrative items, and incidents.
//!
//! The store keeps no open connection; each call opens one, does its work
//! and closes it, so the worker task and the incident log can share a single
//! cloned handle without any connection locking.

use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

use crate::model::{Incident, NarrativeItem, ScoreSample};

#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    /// Open the database, creating the parent directory and schema when
    /// missing. Safe to call on an already initialized file.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let path = db_path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("creating database directory {}", parent.display())
                })?;
            }
        }

        let store = Self { path };
        let conn = store.connect()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS scores (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                feed_name TEXT NOT NULL,
                score REAL NOT NULL,
                velocity REAL NOT NULL,
                trust REAL NOT NULL,
                timestamp INTEGER NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS narratives (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                source TEXT NOT NULL,
                timestamp INTEGER NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS incidents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                kind TEXT NOT NULL,
                message TEXT NOT NULL,
                timestamp INTEGER NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_scores_feed_ts ON scores(feed_name, timestamp DESC)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_narratives_ts ON narratives(timestamp DESC)",
            [],
        )?;
        Ok(store)
    }

    fn connect(&self) -> Result<Connection> {
        Connection::open(&self.path)
            .with_context(|| format!("opening sqlite db {}", self.path.display()))
    }

    /// Persist one tick's rows as a single transaction.
    pub fn append_tick(&self, scores: &[ScoreSample], narratives: &[NarrativeItem]) -> Result<()> {
        if scores.is_empty() && narratives.is_empty() {
            return Ok(());
        }
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        for s in scores {
            tx.execute(
                "INSERT INTO scores (feed_name, score, velocity, trust, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![s.feed_name, s.score, s.velocity, s.trust, s.timestamp],
            )?;
        }
        for n in narratives {
            tx.execute(
                "INSERT INTO narratives (title, source, timestamp) VALUES (?1, ?2, ?3)",
                params![n.title, n.source, n.timestamp],
            )?;
        }
        tx.commit().context("committing tick batch")?;
        Ok(())
    }

    /// Persist one incident row. The durable history is uncapped.
    pub fn append_incident(&self, incident: &Incident) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO incidents (kind, message, timestamp) VALUES (?1, ?2, ?3)",
            params![incident.kind.as_str(), incident.message, incident.timestamp],
        )?;
        Ok(())
    }
}
