use async_trait::async_trait;
use serde::Deserialize;

use crate::model::NarrativeItem;
use crate::sources::{normalize_title, FeedPayload, FeedSource, FeedUpdate, Fetcher};

// The credential travels in the X-Api-Key header, never in the URL.
const URL: &str = "https://newsapi.org/v2/top-headlines?language=en&pageSize=10";

pub const SOURCE: &str = "NewsAPI";

#[derive(Debug, Deserialize)]
struct Headlines {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Default, Deserialize)]
struct Article {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: Option<String>,
}

fn dedup_key(url: Option<&str>, title: &str) -> String {
    match url.filter(|u| !u.is_empty()) {
        Some(u) => u.to_string(),
        None => hash_key(title),
    }
}

fn hash_key(title: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(7 + digest.len() * 2);
    out.push_str("sha256:");
    for b in digest.iter() {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// English top headlines, keyed by article URL (title hash when absent).
pub struct NewsApi {
    key: String,
}

impl NewsApi {
    pub fn new(key: String) -> Self {
        Self { key }
    }
}

#[async_trait]
impl FeedSource for NewsApi {
    fn name(&self) -> &'static str {
        SOURCE
    }

    async fn poll(&self, fetcher: &Fetcher, now: u64) -> Vec<FeedUpdate> {
        let headers = [("X-Api-Key", self.key.as_str())];
        let page = match fetcher.fetch_json_with::<Headlines>(URL, &headers).await {
            Some(p) => p,
            None => return Vec::new(),
        };

        let mut items = Vec::new();
        for article in &page.articles {
            let title = normalize_title(&article.title);
            if title.is_empty() {
                continue;
            }
            let key = dedup_key(article.url.as_deref(), &title);
            items.push(NarrativeItem {
                title,
                source: SOURCE.to_string(),
                timestamp: now,
                dedup_key: key,
            });
        }

        vec![FeedUpdate {
            feed_name: SOURCE.to_string(),
            payload: FeedPayload::Items(items),
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "status": "ok",
        "articles": [
            {"title": "Markets rally on rate pause", "url": "https://example.com/a"},
            {"title": "Untraceable wire story", "url": null},
            {"title": "", "url": "https://example.com/empty"}
        ]
    }"#;

    #[test]
    fn articles_decode_with_missing_urls() {
        let page: Headlines = serde_json::from_str(FIXTURE).unwrap();
        assert_eq!(page.articles.len(), 3);
        assert_eq!(page.articles[0].url.as_deref(), Some("https://example.com/a"));
        assert_eq!(page.articles[1].url, None);
    }

    #[test]
    fn dedup_key_prefers_the_article_url() {
        assert_eq!(dedup_key(Some("https://example.com/a"), "t"), "https://example.com/a");
        assert!(dedup_key(Some(""), "t").starts_with("sha256:"));
        assert!(dedup_key(None, "t").starts_with("sha256:"));
    }

    #[test]
    fn title_hash_is_stable_hex() {
        assert_eq!(
            hash_key("abc"),
            "sha256:ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
