use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lexically derived tone of a news item, serialized lowercase on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

/// Canonical normalized news record. `id` is a content hash over URL +
/// headline and never changes once assigned; everything downstream
/// (deduplication, broadcast) keys on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    pub id: String,
    pub headline: String,
    pub source: String,
    pub ts: DateTime<Utc>,
    pub summary: Option<String>,
    pub sentiment: Sentiment,
    pub tickers: Vec<String>,
    pub tags: Vec<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceTick {
    pub symbol: String,
    pub price: f64,
    pub ts: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OhlcPoint {
    pub t: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OhlcSeries {
    pub symbol: String,
    pub interval: String,
    pub series: Vec<OhlcPoint>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentiment_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Sentiment::Positive).unwrap(),
            "\"positive\""
        );
        assert_eq!(
            serde_json::to_string(&Sentiment::Neutral).unwrap(),
            "\"neutral\""
        );
        assert_eq!(
            serde_json::to_string(&Sentiment::Negative).unwrap(),
            "\"negative\""
        );
    }

    #[test]
    fn news_item_wire_fields() {
        let item = NewsItem {
            id: "abc".to_string(),
            headline: "Gold rises".to_string(),
            source: "test".to_string(),
            ts: Utc::now(),
            summary: None,
            sentiment: Sentiment::Neutral,
            tickers: vec!["Gold".to_string()],
            tags: vec![],
            url: Some("http://example.com".to_string()),
        };
        let value = serde_json::to_value(&item).unwrap();
        for field in ["id", "headline", "source", "ts", "summary", "sentiment", "tickers", "tags", "url"] {
            assert!(value.get(field).is_some(), "missing field {}", field);
        }
    }
}
