// tests/metrics.rs
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use pulse_aggregator::metrics::Metrics;

// One test only: the Prometheus recorder installs once per process.
#[tokio::test]
async fn metrics_endpoint_exposes_the_aggregator_series() {
    let m = Metrics::init(20);

    // Touch the tick series so the exposition carries them.
    metrics::counter!("aggregator_ticks_total").increment(1);
    metrics::gauge!("stream_subscribers").set(0.0);

    let resp = m
        .router()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap(); // 1 MiB
    let text = String::from_utf8(bytes.to_vec()).unwrap();

    for needle in [
        "aggregator_ticks_total",
        "aggregator_tick_interval_secs",
        "stream_subscribers",
    ] {
        assert!(
            text.contains(needle),
            "metrics exposition missing '{needle}'\n{text}"
        );
    }
}
