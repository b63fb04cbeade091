use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Json, Router,
};
use futures::{Stream, StreamExt};
use tower_http::cors::CorsLayer;

use crate::model::{Incident, NarrativeItem, ScoreSample};
use crate::state::AppState;

/// `/api/incidents` serves at most this many of the newest retained rows.
const INCIDENT_VIEW: usize = 50;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/scores", get(scores))
        .route("/api/narratives", get(narratives))
        .route("/api/incidents", get(incidents))
        .route("/stream", get(stream))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Serialize)]
struct Data<T> {
    data: T,
}

#[derive(serde::Serialize)]
struct HealthResp {
    status: &'static str,
    version: &'static str,
    uptime_sec: u64,
}

async fn health(State(state): State<AppState>) -> Json<HealthResp> {
    Json(HealthResp {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_sec: state.uptime_secs(),
    })
}

async fn scores(State(state): State<AppState>) -> Json<Data<Vec<ScoreSample>>> {
    Json(Data {
        data: state.snapshots().scores,
    })
}

async fn narratives(State(state): State<AppState>) -> Json<Data<Vec<NarrativeItem>>> {
    Json(Data {
        data: state.snapshots().narratives,
    })
}

async fn incidents(State(state): State<AppState>) -> Json<Data<Vec<Incident>>> {
    let tail = state.incidents().snapshot();
    let start = tail.len().saturating_sub(INCIDENT_VIEW);
    Json(Data {
        data: tail[start..].to_vec(),
    })
}

/// Server-sent events: one `update` event per broadcast. The subscription
/// unregisters itself when the client goes away and the response drops.
async fn stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let events = state
        .subscribe()
        .map(|event| Event::default().event("update").json_data(&event));
    Sse::new(events).keep_alive(KeepAlive::default())
}
