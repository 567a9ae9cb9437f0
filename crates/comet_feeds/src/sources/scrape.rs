use async_trait::async_trait;
use lazy_static::lazy_static;
use scraper::{Html, Selector};
use url::Url;

use comet_core::{Error, NewsItem, Result};

use crate::normalize::{
    classify_sentiment, collapse_whitespace, compute_identity, extract_tickers,
    normalize_timestamp,
};
use crate::sources::{fetch_text, NewsSource, MAX_ENTRIES_PER_SOURCE, SCRAPE_TIMEOUT};

lazy_static! {
    static ref HEADLINE_LINKS: Selector = Selector::parse("h2 a, h3 a").unwrap();
    static ref PAGE_TIME: Selector = Selector::parse("time[datetime]").unwrap();
}

/// A site without a feed, polled directly and mined for headline-like
/// elements. Produces one item per mined article, exactly like the feed path.
pub struct ScrapeSource {
    url: String,
    label: String,
}

impl ScrapeSource {
    pub fn new(url: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            label: label.into(),
        }
    }
}

/// Mine a listing page for headline anchors. Relative hrefs are resolved
/// against the page URL; anchors without text are skipped. The page's first
/// `<time datetime>` (when present) stands in for per-article publication
/// times, otherwise fetch time is used.
pub fn items_from_markup(html: &str, base_url: &str, label: &str) -> Result<Vec<NewsItem>> {
    let base =
        Url::parse(base_url).map_err(|e| Error::InvalidUrl(format!("{}: {}", base_url, e)))?;
    let document = Html::parse_document(html);

    let page_time = document
        .select(&PAGE_TIME)
        .next()
        .and_then(|el| el.value().attr("datetime"))
        .map(|raw| raw.to_string());
    let ts = normalize_timestamp(page_time.as_deref());

    let mut items = Vec::new();
    for anchor in document.select(&HEADLINE_LINKS).take(MAX_ENTRIES_PER_SOURCE) {
        let headline = collapse_whitespace(&anchor.text().collect::<String>());
        if headline.is_empty() {
            continue;
        }
        let link = anchor
            .value()
            .attr("href")
            .and_then(|href| base.join(href).ok())
            .map(|u| u.to_string());
        items.push(NewsItem {
            id: compute_identity(link.as_deref(), &headline),
            sentiment: classify_sentiment(&headline),
            tickers: extract_tickers(&headline),
            headline,
            source: label.to_string(),
            ts,
            summary: None,
            tags: vec![],
            url: link,
        });
    }
    Ok(items)
}

#[async_trait]
impl NewsSource for ScrapeSource {
    fn name(&self) -> &str {
        &self.url
    }

    async fn fetch_items(&self, client: &reqwest::Client) -> Result<Vec<NewsItem>> {
        let html = fetch_text(client, &self.url, SCRAPE_TIMEOUT).await?;
        items_from_markup(&html, &self.url, &self.label)
    }
}
