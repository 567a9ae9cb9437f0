use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use comet_core::{NewsItem, Result, TaskHandle};

use crate::hub::NewsHub;
use crate::sources::{FeedSource, NewsSource, ScrapeSource, USER_AGENT};

pub const DEFAULT_FETCH_INTERVAL: Duration = Duration::from_secs(25);

/// Commodity/energy feeds polled by default, plus direct sites without one.
pub fn default_sources() -> Vec<Box<dyn NewsSource>> {
    vec![
        Box::new(FeedSource::new(
            "https://feeds.reuters.com/reuters/commoditiesNews",
        )),
        Box::new(FeedSource::new(
            "https://www.reutersagency.com/feed/?best-topics=commodities&post_type=best",
        )),
        Box::new(FeedSource::new("https://www.eia.gov/rss/pressreleases.xml")),
        Box::new(ScrapeSource::new(
            "https://www.livemint.com/market/commodities",
            "mint",
        )),
    ]
}

/// Periodic poller over all configured sources. Each cycle screens freshly
/// normalized items through the hub's dedup index and commits the cycle's
/// batch as a single broadcast. A failing source is skipped for the cycle
/// and naturally retried on the next one.
pub struct FetchLoop {
    hub: Arc<NewsHub>,
    sources: Vec<Box<dyn NewsSource>>,
    client: reqwest::Client,
    interval: Duration,
}

impl FetchLoop {
    pub fn new(
        hub: Arc<NewsHub>,
        sources: Vec<Box<dyn NewsSource>>,
        interval: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            hub,
            sources,
            client,
            interval,
        })
    }

    /// One full pass over every source. Returns the batch of items that were
    /// new this cycle (already committed and broadcast when non-empty).
    pub async fn run_cycle(&self) -> Vec<NewsItem> {
        let mut batch = Vec::new();
        for source in &self.sources {
            match source.fetch_items(&self.client).await {
                Ok(items) => {
                    let fresh = self.hub.screen(items);
                    if !fresh.is_empty() {
                        debug!(source = source.name(), fresh = fresh.len(), "new items");
                    }
                    batch.extend(fresh);
                }
                Err(e) => {
                    warn!(source = source.name(), error = %e, "source skipped this cycle");
                }
            }
        }
        if !batch.is_empty() {
            let delivered = self.hub.commit(batch.clone());
            info!(
                items = batch.len(),
                subscribers = delivered,
                "broadcast news batch"
            );
        }
        batch
    }

    /// Run until stopped, starting with an immediate cycle. The shutdown
    /// signal is observed at the sleep boundary; an in-flight fetch is
    /// allowed to complete first.
    pub fn spawn(self) -> TaskHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            loop {
                self.run_cycle().await;
                tokio::select! {
                    _ = tokio::time::sleep(self.interval) => {}
                    _ = shutdown_rx.changed() => {
                        debug!("fetch loop stopping");
                        break;
                    }
                }
            }
        });
        TaskHandle::new(shutdown_tx, task)
    }
}
