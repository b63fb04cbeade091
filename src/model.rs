use serde::{Deserialize, Serialize};

/// Statistics row produced once per feed per tick. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSample {
    pub feed_name: String,
    pub score: f64,
    pub velocity: f64,
    pub trust: f64,
    pub timestamp: u64,
}

/// One accepted narrative item. `dedup_key` identifies the item within its
/// source and stays off the wire and out of the durable log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeItem {
    pub title: String,
    pub source: String,
    pub timestamp: u64,
    #[serde(skip)]
    pub dedup_key: String,
}

/// The two operational failure classes; neither is ever fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentKind {
    FetchError,
    LoopError,
}

impl IncidentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            IncidentKind::FetchError => "fetch_error",
            IncidentKind::LoopError => "loop_error",
        }
    }
}

/// A recorded failure, kept in the in-memory tail and the durable log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub kind: IncidentKind,
    pub message: String,
    pub timestamp: u64,
}

/// Current UNIX time in seconds.
pub fn now_ts() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}
