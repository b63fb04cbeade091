use async_trait::async_trait;
use serde::Deserialize;

use crate::sources::{FeedPayload, FeedSource, FeedUpdate, Fetcher};

const URL: &str = "https://wikimedia.org/api/rest_v1/metrics/edit/aggregate/all-projects/all-editor-types/all-page-types/daily/20240101/20240131";
const SERIES_TAIL: usize = 10;

pub const FEED_NAME: &str = "wikipedia_edits";

#[derive(Debug, Deserialize)]
struct EditAggregate {
    #[serde(default)]
    items: Vec<EditItem>,
}

#[derive(Debug, Deserialize)]
struct EditItem {
    #[serde(default)]
    results: EditCounts,
}

#[derive(Debug, Default, Deserialize)]
struct EditCounts {
    #[serde(default)]
    edits: f64,
}

/// Daily edit-count aggregate. Unlike prices this is already a series, so
/// the tail is scored as fetched instead of feeding a window.
pub struct WikimediaEdits;

#[async_trait]
impl FeedSource for WikimediaEdits {
    fn name(&self) -> &'static str {
        FEED_NAME
    }

    async fn poll(&self, fetcher: &Fetcher, _now: u64) -> Vec<FeedUpdate> {
        let agg = match fetcher.fetch_json::<EditAggregate>(URL).await {
            Some(a) => a,
            None => return Vec::new(),
        };
        let series = tail_series(&agg);
        if series.is_empty() {
            return Vec::new();
        }
        vec![FeedUpdate {
            feed_name: FEED_NAME.to_string(),
            payload: FeedPayload::Series(series),
        }]
    }
}

fn tail_series(agg: &EditAggregate) -> Vec<f64> {
    let skip = agg.items.len().saturating_sub(SERIES_TAIL);
    agg.items.iter().skip(skip).map(|it| it.results.edits).collect()
}
