use async_trait::async_trait;
use serde::Deserialize;

use crate::model::NarrativeItem;
use crate::sources::{normalize_title, FeedPayload, FeedSource, FeedUpdate, Fetcher};

const URL: &str = "https://www.reddit.com/r/technology/top.json?t=day&limit=10";

pub const SOURCE: &str = "Reddit/technology";

#[derive(Debug, Deserialize)]
struct Listing {
    #[serde(default)]
    data: ListingData,
}

#[derive(Debug, Default, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    #[serde(default)]
    data: PostData,
}

#[derive(Debug, Default, Deserialize)]
struct PostData {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
}

/// Daily top posts from r/technology, deduplicated by post id.
pub struct Reddit;

#[async_trait]
impl FeedSource for Reddit {
    fn name(&self) -> &'static str {
        SOURCE
    }

    async fn poll(&self, fetcher: &Fetcher, now: u64) -> Vec<FeedUpdate> {
        let listing = match fetcher.fetch_json::<Listing>(URL).await {
            Some(l) => l,
            None => return Vec::new(),
        };

        let mut items = Vec::new();
        for child in &listing.data.children {
            let post = &child.data;
            if post.id.is_empty() {
                continue;
            }
            let title = normalize_title(&post.title);
            if title.is_empty() {
                continue;
            }
            items.push(NarrativeItem {
                title,
                source: SOURCE.to_string(),
                timestamp: now,
                dedup_key: post.id.clone(),
            });
        }

        vec![FeedUpdate {
            feed_name: SOURCE.to_string(),
            payload: FeedPayload::Items(items),
        }]
    }
}
