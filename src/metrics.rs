use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("aggregator_ticks_total", "Completed aggregation ticks.");
        describe_counter!(
            "aggregator_fetch_errors_total",
            "Source fetch/parse failures recorded as incidents."
        );
        describe_counter!(
            "aggregator_loop_errors_total",
            "Whole-tick failures recorded as incidents."
        );
        describe_counter!(
            "narratives_kept_total",
            "Narrative items accepted after deduplication."
        );
        describe_counter!(
            "narratives_deduped_total",
            "Narrative items dropped as already seen."
        );
        describe_counter!(
            "stream_pruned_subscribers_total",
            "Stream subscribers removed for a closed or full queue."
        );
        describe_gauge!(
            "aggregator_last_tick_ts",
            "Unix ts of the last completed tick."
        );
        describe_gauge!("stream_subscribers", "Currently connected stream subscribers.");
        describe_gauge!(
            "aggregator_tick_interval_secs",
            "Configured seconds between ticks."
        );
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Initialize the Prometheus recorder and expose a static gauge for the
    /// configured tick interval.
    pub fn init(interval_secs: u64) -> Self {
        // Use default buckets to avoid API differences across crate versions.
        let builder = PrometheusBuilder::new();

        let handle = builder
            .install_recorder()
            .expect("prometheus: install recorder");

        ensure_metrics_described();
        gauge!("aggregator_tick_interval_secs").set(interval_secs as f64);

        Self { handle }
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
