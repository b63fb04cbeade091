// src/sources/mod.rs
pub mod coingecko;
pub mod hackernews;
pub mod newsapi;
pub mod reddit;
pub mod wikimedia;

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::incident::IncidentLog;
use crate::model::{IncidentKind, NarrativeItem};

pub use coingecko::CoinGecko;
pub use hackernews::HackerNews;
pub use newsapi::NewsApi;
pub use reddit::Reddit;
pub use wikimedia::WikimediaEdits;

/// What one feed produced for one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedPayload {
    /// One fresh sample for a windowed numeric feed.
    Sample(f64),
    /// A self-contained series scored as fetched, no window.
    Series(Vec<f64>),
    /// Narrative items still subject to dedup.
    Items(Vec<NarrativeItem>),
}

/// A named payload; one source may yield several (e.g. one per coin).
#[derive(Debug, Clone, PartialEq)]
pub struct FeedUpdate {
    pub feed_name: String,
    pub payload: FeedPayload,
}

/// One external data source polled every tick.
#[async_trait]
pub trait FeedSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fetch and parse one tick's data. Failures never surface here; the
    /// fetcher converts them into incidents and the poll yields nothing.
    async fn poll(&self, fetcher: &Fetcher, now: u64) -> Vec<FeedUpdate>;
}

/// Time-bounded HTTP GET plus typed JSON parse. Any failure (network,
/// status, body shape) becomes `None` and one `fetch_error` incident
/// naming the URL and cause; nothing propagates to the tick.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    incidents: Arc<IncidentLog>,
}

impl Fetcher {
    pub fn new(cfg: &AppConfig, incidents: Arc<IncidentLog>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(cfg.fetch_timeout)
            .user_agent(cfg.user_agent.clone())
            .build()
            .context("building http client")?;
        Ok(Self { client, incidents })
    }

    /// GET `url` and deserialize the body into `T`.
    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Option<T> {
        self.fetch_json_with(url, &[]).await
    }

    /// Variant with extra request headers, for keyed feeds whose credential
    /// travels in a header and therefore never shows up in incident messages.
    pub async fn fetch_json_with<T: DeserializeOwned>(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Option<T> {
        match self.try_fetch(url, headers).await {
            Ok(v) => Some(v),
            Err(e) => {
                self.incidents
                    .record(IncidentKind::FetchError, format!("{url} -> {e:#}"));
                None
            }
        }
    }

    async fn try_fetch<T: DeserializeOwned>(&self, url: &str, headers: &[(&str, &str)]) -> Result<T> {
        let mut req = self.client.get(url);
        for (name, value) in headers {
            req = req.header(*name, *value);
        }
        let resp = req.send().await.context("request failed")?;
        let resp = resp.error_for_status().context("non-success status")?;
        resp.json::<T>().await.context("decoding json body")
    }

    /// For per-item shape problems inside an otherwise valid payload.
    pub fn incidents(&self) -> &IncidentLog {
        &self.incidents
    }
}

/// Normalize a narrative title: decode HTML entities, strip tags, collapse
/// whitespace, cap length.
pub fn normalize_title(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out = out.trim().to_string();

    // Length cap: 300 chars, plenty for headlines
    if out.chars().count() > 300 {
        out = out.chars().take(300).collect();
    }

    out
}

/// Assemble the configured feed set. The keyed feed joins only when its
/// credential is present; its absence silently disables it.
pub fn build_sources(cfg: &AppConfig) -> Vec<Box<dyn FeedSource>> {
    let mut sources: Vec<Box<dyn FeedSource>> = vec![
        Box::new(CoinGecko),
        Box::new(WikimediaEdits),
        Box::new(HackerNews),
        Box::new(Reddit),
    ];
    match &cfg.newsapi_key {
        Some(key) => sources.push(Box::new(NewsApi::new(key.clone()))),
        None => tracing::info!("NEWSAPI_KEY not set; NewsAPI feed disabled"),
    }
    sources
}
