//! # Aggregation Worker
//! Owns every piece of tick-to-tick state (sample windows, dedup sets, the
//! rolling narrative pool) and drives the fetch -> score -> persist ->
//! publish pipeline on a fixed schedule. Nothing else mutates that state.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use anyhow::{Context as _, Result};
use futures::future::join_all;
use metrics::{counter, gauge};
use tokio::task::JoinHandle;

use crate::broadcast::StreamEvent;
use crate::config::Limits;
use crate::dedup::DedupSet;
use crate::model::{now_ts, IncidentKind, NarrativeItem, ScoreSample};
use crate::sources::{FeedPayload, FeedSource, FeedUpdate, Fetcher};
use crate::state::{AppState, Snapshots};
use crate::stats;
use crate::store::SqliteStore;
use crate::window::SampleWindow;

pub struct Worker {
    sources: Vec<Box<dyn FeedSource>>,
    fetcher: Fetcher,
    store: SqliteStore,
    state: AppState,
    limits: Limits,
    interval: Duration,
    windows: HashMap<String, SampleWindow>,
    dedup: HashMap<String, DedupSet>,
    narratives: VecDeque<NarrativeItem>,
}

impl Worker {
    pub fn new(
        sources: Vec<Box<dyn FeedSource>>,
        fetcher: Fetcher,
        store: SqliteStore,
        state: AppState,
        limits: Limits,
        interval: Duration,
    ) -> Self {
        Self {
            sources,
            fetcher,
            store,
            state,
            limits,
            interval,
            windows: HashMap::new(),
            dedup: HashMap::new(),
            narratives: VecDeque::new(),
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Tick forever. A failed tick becomes a `loop_error` incident and the
    /// schedule continues; windows and dedup state survive the failure.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.interval);
        // A slow tick delays the next one instead of bursting to catch up.
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = self.run_tick().await {
                self.state
                    .incidents()
                    .record(IncidentKind::LoopError, format!("{e:#}"));
            }
        }
    }

    /// One full aggregation pass. All sources are polled concurrently; a
    /// source that failed contributes nothing this tick.
    pub async fn run_tick(&mut self) -> Result<()> {
        let now = now_ts();

        let polls = self.sources.iter().map(|s| s.poll(&self.fetcher, now));
        let updates: Vec<FeedUpdate> = join_all(polls).await.into_iter().flatten().collect();

        let mut rows: Vec<ScoreSample> = Vec::new();
        let mut fresh: Vec<NarrativeItem> = Vec::new();
        let mut deduped: u64 = 0;

        for update in updates {
            match update.payload {
                FeedPayload::Sample(value) => {
                    let window = self
                        .windows
                        .entry(update.feed_name.clone())
                        .or_insert_with(|| SampleWindow::with_capacity(self.limits.price_window));
                    window.push(value);
                    rows.push(sample_row(update.feed_name, &window.series(), now));
                }
                FeedPayload::Series(series) => {
                    if series.is_empty() {
                        continue;
                    }
                    rows.push(sample_row(update.feed_name, &series, now));
                }
                FeedPayload::Items(items) => {
                    let seen = self
                        .dedup
                        .entry(update.feed_name.clone())
                        .or_insert_with(|| DedupSet::with_retention(self.limits.dedup_retention));
                    for item in items {
                        if seen.insert(&item.dedup_key) {
                            fresh.push(item);
                        } else {
                            deduped += 1;
                        }
                    }
                }
            }
        }

        // Durable rows land in arrival order; ranking is presentation only.
        self.store
            .append_tick(&rows, &fresh)
            .context("persisting tick batch")?;

        // Highest score first; stable, so ties keep source order.
        rows.sort_by(|a, b| b.score.total_cmp(&a.score));

        for item in &fresh {
            if self.narratives.len() == self.limits.narrative_snapshot {
                self.narratives.pop_front();
            }
            self.narratives.push_back(item.clone());
        }
        let narratives_view: Vec<NarrativeItem> = self.narratives.iter().cloned().collect();

        self.state.replace_snapshots(Snapshots {
            scores: rows.clone(),
            narratives: narratives_view.clone(),
        });

        let broadcaster = self.state.broadcaster();
        broadcaster.fanout(&StreamEvent::Scores {
            scores: rows.clone(),
        });
        if !fresh.is_empty() {
            broadcaster.fanout(&StreamEvent::Narratives {
                narratives: narratives_view,
            });
        }

        counter!("aggregator_ticks_total").increment(1);
        counter!("narratives_kept_total").increment(fresh.len() as u64);
        counter!("narratives_deduped_total").increment(deduped);
        gauge!("aggregator_last_tick_ts").set(now as f64);

        tracing::info!(
            target: "worker",
            rows = rows.len(),
            kept = fresh.len(),
            deduped,
            "aggregation tick"
        );

        Ok(())
    }
}

fn sample_row(feed_name: String, series: &[f64], now: u64) -> ScoreSample {
    let stats = stats::calc(series);
    ScoreSample {
        feed_name,
        score: stats.score,
        velocity: stats.velocity,
        trust: stats.trust,
        timestamp: now,
    }
}
