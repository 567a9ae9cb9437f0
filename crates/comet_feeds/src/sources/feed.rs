use async_trait::async_trait;
use chrono::{DateTime, Utc};

use comet_core::{Error, NewsItem, Result};

use crate::normalize::{
    classify_sentiment, compute_identity, extract_summary, extract_tickers, SUMMARY_MAX_CHARS,
};
use crate::sources::{fetch_text, NewsSource, FEED_TIMEOUT, MAX_ENTRIES_PER_SOURCE, SCRAPE_TIMEOUT};

/// A syndication feed (RSS/Atom) polled over HTTP.
pub struct FeedSource {
    url: String,
}

impl FeedSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Raw entry lifted out of a parsed feed document before normalization.
pub struct FeedEntry {
    pub title: String,
    pub link: Option<String>,
    pub published: Option<DateTime<Utc>>,
    pub summary_html: String,
    pub tags: Vec<String>,
}

/// Parse a feed document into its provenance label and raw entries, capped
/// at the per-source maximum. A document feed-rs cannot make sense of is a
/// source-level failure.
pub fn parse_feed(raw: &str, fallback_label: &str) -> Result<(String, Vec<FeedEntry>)> {
    let feed = feed_rs::parser::parse(raw.as_bytes())
        .map_err(|e| Error::Feed(format!("{}: {}", fallback_label, e)))?;

    let label = feed
        .title
        .map(|t| t.content)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| fallback_label.to_string());

    let entries = feed
        .entries
        .into_iter()
        .take(MAX_ENTRIES_PER_SOURCE)
        .map(|entry| FeedEntry {
            title: entry.title.map(|t| t.content).unwrap_or_default(),
            link: entry.links.first().map(|l| l.href.clone()),
            published: entry.published.or(entry.updated),
            summary_html: entry
                .summary
                .map(|s| s.content)
                .or_else(|| entry.content.and_then(|c| c.body))
                .unwrap_or_default(),
            tags: entry.categories.into_iter().map(|c| c.term).collect(),
        })
        .collect();

    Ok((label, entries))
}

/// Turn one raw entry into a canonical item. Entries without a headline are
/// dropped; nothing else about an entry can fail the record.
pub fn normalize_entry(entry: FeedEntry, source: &str) -> Option<NewsItem> {
    let headline = entry.title.trim().to_string();
    if headline.is_empty() {
        return None;
    }
    let summary = extract_summary(&entry.summary_html, SUMMARY_MAX_CHARS);
    let sentiment = classify_sentiment(&format!("{} {}", headline, summary));
    Some(NewsItem {
        id: compute_identity(entry.link.as_deref(), &headline),
        tickers: extract_tickers(&headline),
        sentiment,
        headline,
        source: source.to_string(),
        ts: entry.published.unwrap_or_else(Utc::now),
        summary: if summary.is_empty() { None } else { Some(summary) },
        tags: entry.tags,
        url: entry.link,
    })
}

#[async_trait]
impl NewsSource for FeedSource {
    fn name(&self) -> &str {
        &self.url
    }

    async fn fetch_items(&self, client: &reqwest::Client) -> Result<Vec<NewsItem>> {
        let raw = fetch_text(client, &self.url, FEED_TIMEOUT).await?;
        let (label, entries) = parse_feed(&raw, &self.url)?;

        let mut items = Vec::new();
        for entry in entries {
            let Some(mut item) = normalize_entry(entry, &label) else {
                continue;
            };
            // Best-effort enrichment: one fetch of the article itself when
            // the feed carried no usable summary. Its failure keeps the item.
            if item.summary.is_none() {
                if let Some(link) = item.url.clone() {
                    if let Ok(html) = fetch_text(client, &link, SCRAPE_TIMEOUT).await {
                        let enriched = extract_summary(&html, SUMMARY_MAX_CHARS);
                        if !enriched.is_empty() {
                            item.sentiment = classify_sentiment(&format!(
                                "{} {}",
                                item.headline, enriched
                            ));
                            item.summary = Some(enriched);
                        }
                    }
                }
            }
            items.push(item);
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use comet_core::Sentiment;

    const FEED_DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Commodity Wire</title>
    <link>http://wire.example.com</link>
    <item>
      <title>Natural gas prices surge on tight storage</title>
      <link>http://wire.example.com/gas-surge</link>
      <pubDate>Fri, 01 Mar 2024 12:00:00 GMT</pubDate>
      <description><![CDATA[<p>A cold snap pushed withdrawals above forecasts.</p>]]></description>
      <category>energy</category>
      <category>storage</category>
    </item>
    <item>
      <title>Copper output declines in Chile</title>
      <link>http://wire.example.com/copper</link>
    </item>
    <item>
      <title></title>
      <link>http://wire.example.com/untitled</link>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn parses_label_and_entries() {
        let (label, entries) = parse_feed(FEED_DOC, "http://wire.example.com/rss").unwrap();
        assert_eq!(label, "Commodity Wire");
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].tags, vec!["energy", "storage"]);
        assert!(entries[0].published.is_some());
        assert!(entries[1].published.is_none());
    }

    #[test]
    fn rejects_non_feed_documents() {
        assert!(parse_feed("<html><body>nope</body></html>", "x").is_err());
    }

    #[test]
    fn normalizes_full_entry() {
        let (label, mut entries) = parse_feed(FEED_DOC, "fallback").unwrap();
        let item = normalize_entry(entries.remove(0), &label).unwrap();
        assert_eq!(item.headline, "Natural gas prices surge on tight storage");
        assert_eq!(item.source, "Commodity Wire");
        assert_eq!(
            item.summary.as_deref(),
            Some("A cold snap pushed withdrawals above forecasts.")
        );
        assert_eq!(item.sentiment, Sentiment::Positive);
        assert_eq!(item.tickers, vec!["NG"]);
        assert_eq!(item.url.as_deref(), Some("http://wire.example.com/gas-surge"));
        assert_eq!(item.ts.to_rfc3339(), "2024-03-01T12:00:00+00:00");
    }

    #[test]
    fn untitled_entries_are_dropped() {
        let (label, entries) = parse_feed(FEED_DOC, "fallback").unwrap();
        let items: Vec<_> = entries
            .into_iter()
            .filter_map(|e| normalize_entry(e, &label))
            .collect();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn missing_timestamp_falls_back_to_fetch_time() {
        let before = Utc::now();
        let (label, entries) = parse_feed(FEED_DOC, "fallback").unwrap();
        let copper = entries
            .into_iter()
            .nth(1)
            .and_then(|e| normalize_entry(e, &label))
            .unwrap();
        assert!(copper.ts >= before);
        assert!(copper.summary.is_none());
    }

    #[test]
    fn identity_is_stable_across_parses() {
        let (label, entries) = parse_feed(FEED_DOC, "fallback").unwrap();
        let first: Vec<_> = entries
            .into_iter()
            .filter_map(|e| normalize_entry(e, &label))
            .collect();
        let (label, entries) = parse_feed(FEED_DOC, "fallback").unwrap();
        let second: Vec<_> = entries
            .into_iter()
            .filter_map(|e| normalize_entry(e, &label))
            .collect();
        assert_eq!(first[0].id, second[0].id);
        assert_ne!(first[0].id, first[1].id);
    }
}
