use std::time::Duration;

use async_trait::async_trait;

use comet_core::{Error, NewsItem, Result};

pub mod feed;
pub mod scrape;

pub use feed::FeedSource;
pub use scrape::ScrapeSource;

/// Identifier sent with every outbound fetch.
pub const USER_AGENT: &str = "comet-newsbot/1.0";

/// Per-cycle cap on entries taken from a single source.
pub const MAX_ENTRIES_PER_SOURCE: usize = 40;

pub const FEED_TIMEOUT: Duration = Duration::from_secs(15);
pub const SCRAPE_TIMEOUT: Duration = Duration::from_secs(12);

/// One polled source of raw news. The fetch loop is written once against
/// this interface; feed-syndication and direct-scrape sources differ only in
/// how they turn remote content into normalized items, one per article.
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Label used in logs and as the provenance fallback.
    fn name(&self) -> &str;

    /// Fetch the remote content and extract normalized items. Transport
    /// failures and non-success statuses surface as errors; the caller skips
    /// the source for the cycle.
    async fn fetch_items(&self, client: &reqwest::Client) -> Result<Vec<NewsItem>>;
}

pub(crate) async fn fetch_text(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<String> {
    let response = client.get(url).timeout(timeout).send().await?;
    if !response.status().is_success() {
        return Err(Error::Feed(format!(
            "{} returned status {}",
            url,
            response.status()
        )));
    }
    Ok(response.text().await?)
}
