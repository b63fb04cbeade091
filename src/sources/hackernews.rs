use async_trait::async_trait;
use serde::Deserialize;

use crate::model::NarrativeItem;
use crate::sources::{normalize_title, FeedPayload, FeedSource, FeedUpdate, Fetcher};

const URL: &str = "https://hn.algolia.com/api/v1/search?tags=front_page";
const FRONT_PAGE_TAKE: usize = 15;

pub const SOURCE: &str = "HackerNews";

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "objectID")]
    object_id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    story_title: Option<String>,
}

impl Hit {
    /// Comment hits carry the story title in a separate field.
    fn display_title(&self) -> Option<&str> {
        pick_title(self.title.as_deref(), self.story_title.as_deref())
    }
}

fn pick_title<'a>(title: Option<&'a str>, story_title: Option<&'a str>) -> Option<&'a str> {
    title
        .filter(|t| !t.is_empty())
        .or_else(|| story_title.filter(|t| !t.is_empty()))
}

/// Front-page stories, deduplicated by Algolia object id.
pub struct HackerNews;

#[async_trait]
impl FeedSource for HackerNews {
    fn name(&self) -> &'static str {
        SOURCE
    }

    async fn poll(&self, fetcher: &Fetcher, now: u64) -> Vec<FeedUpdate> {
        let page = match fetcher.fetch_json::<SearchPage>(URL).await {
            Some(p) => p,
            None => return Vec::new(),
        };

        let mut items = Vec::new();
        for hit in page.hits.iter().take(FRONT_PAGE_TAKE) {
            if hit.object_id.is_empty() {
                continue;
            }
            let title = match hit.display_title() {
                Some(t) => normalize_title(t),
                None => continue,
            };
            if title.is_empty() {
                continue;
            }
            items.push(NarrativeItem {
                title,
                source: SOURCE.to_string(),
                timestamp: now,
                dedup_key: hit.object_id.clone(),
            });
        }

        vec![FeedUpdate {
            feed_name: SOURCE.to_string(),
            payload: FeedPayload::Items(items),
        }]
    }
}
