//! Public Feed Aggregator, Binary Entrypoint
//! Boots the tick worker and the Axum HTTP server, wiring routes, shared
//! state, and middleware.
//!
//! See `README.md` for quickstart.

use std::sync::Arc;

use anyhow::Context as _;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pulse_aggregator::api;
use pulse_aggregator::broadcast::Broadcaster;
use pulse_aggregator::config::{self, AppConfig};
use pulse_aggregator::incident::IncidentLog;
use pulse_aggregator::metrics::Metrics;
use pulse_aggregator::sources::{build_sources, Fetcher};
use pulse_aggregator::state::AppState;
use pulse_aggregator::store::SqliteStore;
use pulse_aggregator::worker::Worker;

fn init_tracing() {
    // RUST_LOG wins; the fallback keeps our own crate and the worker target
    // at info and everything else at warn.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("pulse_aggregator=info,worker=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::from_env();
    let limits = config::load_limits_default().context("loading limits config")?;

    let store = SqliteStore::open(&cfg.db_path)?;
    let incidents = Arc::new(IncidentLog::new(store.clone(), limits.incident_tail));
    let broadcaster = Arc::new(Broadcaster::new(limits.subscriber_queue));
    let state = AppState::new(incidents.clone(), broadcaster);

    let metrics = Metrics::init(cfg.interval.as_secs());

    let fetcher = Fetcher::new(&cfg, incidents)?;
    let sources = build_sources(&cfg);
    Worker::new(sources, fetcher, store, state.clone(), limits, cfg.interval).spawn();

    let router = api::create_router(state).merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr)
        .await
        .with_context(|| format!("binding {}", cfg.bind_addr))?;
    tracing::info!(
        addr = %cfg.bind_addr,
        interval_secs = cfg.interval.as_secs(),
        "pulse-aggregator listening"
    );
    axum::serve(listener, router).await.context("server exited")?;
    Ok(())
}
