use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

use crate::model::IncidentKind;
use crate::sources::{FeedPayload, FeedSource, FeedUpdate, Fetcher};

const URL: &str =
    "https://api.coingecko.com/api/v3/simple/price?ids=bitcoin,ethereum&vs_currencies=usd";
const COINS: [&str; 2] = ["bitcoin", "ethereum"];

#[derive(Debug, Deserialize)]
struct Quote {
    usd: f64,
}

/// Spot prices for a fixed basket of coins; each coin is its own windowed
/// feed. A coin missing from the response is a shape problem and is
/// reported, not defaulted to zero.
pub struct CoinGecko;

#[async_trait]
impl FeedSource for CoinGecko {
    fn name(&self) -> &'static str {
        "coingecko"
    }

    async fn poll(&self, fetcher: &Fetcher, _now: u64) -> Vec<FeedUpdate> {
        let quotes = match fetcher.fetch_json::<HashMap<String, Quote>>(URL).await {
            Some(q) => q,
            None => return Vec::new(),
        };

        let mut out = Vec::with_capacity(COINS.len());
        for coin in COINS {
            match quotes.get(coin) {
                Some(quote) => out.push(FeedUpdate {
                    feed_name: coin.to_string(),
                    payload: FeedPayload::Sample(quote.usd),
                }),
                None => fetcher.incidents().record(
                    IncidentKind::FetchError,
                    format!("{URL} -> missing quote for {coin}"),
                ),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{"bitcoin":{"usd":55123.4},"ethereum":{"usd":2901.22}}"#;

    #[test]
    fn quotes_decode_from_the_simple_price_shape() {
        let quotes: HashMap<String, Quote> = serde_json::from_str(FIXTURE).unwrap();
        assert_eq!(quotes["bitcoin"].usd, 55123.4);
        assert_eq!(quotes["ethereum"].usd, 2901.22);
    }

    #[test]
    fn non_numeric_price_is_a_parse_error() {
        let bad = r#"{"bitcoin":{"usd":"fifty"}}"#;
        assert!(serde_json::from_str::<HashMap<String, Quote>>(bad).is_err());
    }
}
