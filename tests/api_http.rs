// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - GET /api/scores
// - GET /api/narratives
// - GET /api/incidents (view cap)
// - GET /stream (SSE handshake + first frame)

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{self, Body},
    Router,
};
use futures::StreamExt as _;
use http::{Request, StatusCode};
use serde_json::Value as Json;
use tower::ServiceExt as _; // for `oneshot`

use pulse_aggregator::api;
use pulse_aggregator::broadcast::{Broadcaster, StreamEvent};
use pulse_aggregator::incident::IncidentLog;
use pulse_aggregator::model::{now_ts, IncidentKind, NarrativeItem, ScoreSample};
use pulse_aggregator::state::{AppState, Snapshots};
use pulse_aggregator::store::SqliteStore;

const BODY_LIMIT: usize = 1 * 1024 * 1024; // 1MB, safe for tests

fn test_state(dir: &tempfile::TempDir) -> AppState {
    let store = SqliteStore::open(dir.path().join("api.db")).expect("open store");
    AppState::new(
        Arc::new(IncidentLog::new(store, 100)),
        Arc::new(Broadcaster::new(8)),
    )
}

/// Build the same Router the binary uses (metrics route excluded).
fn test_router(state: AppState) -> Router {
    api::create_router(state)
}

async fn get_json(app: Router, uri: &str) -> Json {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build request");

    let resp = app.oneshot(req).await.expect("oneshot");
    assert_eq!(resp.status(), StatusCode::OK, "GET {uri} should be 200");

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    serde_json::from_slice(&bytes).expect("parse json")
}

#[tokio::test]
async fn api_health_reports_status_version_uptime() {
    let dir = tempfile::tempdir().expect("tempdir");
    let v = get_json(test_router(test_state(&dir)), "/health").await;

    assert_eq!(v.get("status").and_then(Json::as_str), Some("ok"));
    assert_eq!(
        v.get("version").and_then(Json::as_str),
        Some(env!("CARGO_PKG_VERSION"))
    );
    assert!(v.get("uptime_sec").is_some_and(Json::is_u64));
}

#[tokio::test]
async fn api_scores_and_narratives_serve_the_latest_snapshot() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = test_state(&dir);

    let ts = now_ts();
    state.replace_snapshots(Snapshots {
        scores: vec![
            ScoreSample {
                feed_name: "bitcoin".to_string(),
                score: 64000.5,
                velocity: 12.25,
                trust: 0.9,
                timestamp: ts,
            },
            ScoreSample {
                feed_name: "ethereum".to_string(),
                score: 3100.0,
                velocity: -4.0,
                trust: 0.8,
                timestamp: ts,
            },
        ],
        narratives: vec![NarrativeItem {
            title: "first headline".to_string(),
            source: "HackerNews".to_string(),
            timestamp: ts,
            dedup_key: "k1".to_string(),
        }],
    });

    let v = get_json(test_router(state.clone()), "/api/scores").await;
    let rows = v["data"].as_array().expect("data array");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["feed_name"], "bitcoin");
    assert_eq!(rows[0]["score"], 64000.5);

    let v = get_json(test_router(state), "/api/narratives").await;
    let items = v["data"].as_array().expect("data array");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "first headline");
    assert_eq!(items[0]["source"], "HackerNews");
    // The dedup key is internal and stays off the wire.
    assert!(items[0].get("dedup_key").is_none());
}

#[tokio::test]
async fn api_incidents_serves_at_most_fifty_newest() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = test_state(&dir);
    for i in 0..60 {
        state
            .incidents()
            .record(IncidentKind::FetchError, format!("boom {i}"));
    }

    let v = get_json(test_router(state), "/api/incidents").await;
    let rows = v["data"].as_array().expect("data array");
    assert_eq!(rows.len(), 50);
    assert_eq!(rows[0]["message"], "boom 10");
    assert_eq!(rows[49]["message"], "boom 59");
    assert_eq!(rows[0]["kind"], "fetch_error");
}

#[tokio::test]
async fn stream_handshakes_and_delivers_the_first_update() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = test_state(&dir);
    let app = test_router(state.clone());

    let req = Request::builder()
        .method("GET")
        .uri("/stream")
        .body(Body::empty())
        .expect("build GET /stream");

    let resp = app.oneshot(req).await.expect("oneshot /stream");
    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp
        .headers()
        .get("content-type")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");
    assert!(
        content_type.starts_with("text/event-stream"),
        "unexpected content-type '{content_type}'"
    );

    // The handler has subscribed by now; a fan-out must reach this response.
    state
        .broadcaster()
        .fanout(&StreamEvent::Scores { scores: Vec::new() });

    let mut frames = resp.into_body().into_data_stream();
    let first = tokio::time::timeout(Duration::from_secs(2), frames.next())
        .await
        .expect("frame within timeout")
        .expect("stream still open")
        .expect("frame bytes");
    let text = String::from_utf8(first.to_vec()).expect("utf8 frame");
    assert!(text.contains("event: update"), "frame was: {text}");
    assert!(text.contains(r#""type":"scores""#), "frame was: {text}");
}
