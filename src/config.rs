//! Runtime configuration: environment knobs plus TOML-tunable limits.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_LIMITS_PATH: &str = "LIMITS_CONFIG_PATH";
const DEFAULT_LIMITS_PATH: &str = "config/limits.toml";

/// Environment-driven service settings.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub interval: Duration,
    pub bind_addr: String,
    pub db_path: PathBuf,
    pub newsapi_key: Option<String>,
    pub fetch_timeout: Duration,
    pub user_agent: String,
}

impl AppConfig {
    /// Read settings from the environment, falling back to service defaults.
    pub fn from_env() -> Self {
        let interval_secs: u64 = std::env::var("WORKER_INTERVAL")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(20);
        let interval_secs = interval_secs.max(1); // a zero period would panic the timer

        let timeout_secs: u64 = std::env::var("FETCH_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);

        let bind_addr =
            std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());

        let db_path = std::env::var("DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data/pulse.db"));

        // An empty key means "not configured", same as an absent one.
        let newsapi_key = std::env::var("NEWSAPI_KEY")
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        let user_agent = std::env::var("HTTP_USER_AGENT")
            .unwrap_or_else(|_| "pulse-aggregator/1.0".to_string());

        Self {
            interval: Duration::from_secs(interval_secs),
            bind_addr,
            db_path,
            newsapi_key,
            fetch_timeout: Duration::from_secs(timeout_secs),
            user_agent,
        }
    }
}

/// Capacity limits; every field falls back to its built-in default when the
/// TOML file omits it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Most recent numeric samples kept per windowed feed.
    pub price_window: usize,
    /// Narrative items kept in the rolling snapshot.
    pub narrative_snapshot: usize,
    /// Incidents kept in the in-memory tail.
    pub incident_tail: usize,
    /// Item identifiers remembered per source before the oldest is forgotten.
    pub dedup_retention: usize,
    /// Queued events per streaming subscriber before it is disconnected.
    pub subscriber_queue: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            price_window: 120,
            narrative_snapshot: 50,
            incident_tail: 100,
            dedup_retention: 4096,
            subscriber_queue: 32,
        }
    }
}

/// Load limits from an explicit TOML path.
pub fn load_limits_from(path: &Path) -> Result<Limits> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading limits from {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parsing limits from {}", path.display()))
}

/// Load limits using env var + fallbacks:
/// 1) $LIMITS_CONFIG_PATH
/// 2) config/limits.toml
/// 3) built-in defaults
pub fn load_limits_default() -> Result<Limits> {
    if let Ok(p) = std::env::var(ENV_LIMITS_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_limits_from(&pb);
        }
        return Err(anyhow!("LIMITS_CONFIG_PATH points to non-existent path"));
    }
    let default_p = PathBuf::from(DEFAULT_LIMITS_PATH);
    if default_p.exists() {
        return load_limits_from(&default_p);
    }
    Ok(Limits::default())
}
