use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::info;

use comet_core::{Result, TaskHandle, TickStorage};
use comet_feeds::pipeline::DEFAULT_FETCH_INTERVAL;
use comet_feeds::sources::NewsSource;
use comet_feeds::{FetchLoop, NewsHub};
use comet_market::generator::DEFAULT_TICK_INTERVAL;
use comet_market::{MarketHub, TickGenerator};

/// Process-scoped context: the shared hubs plus the lifecycle of the two
/// background loops. Constructed once at startup; the loops are started
/// explicitly and joined at shutdown.
pub struct AppState {
    pub news: Arc<NewsHub>,
    pub market: Arc<MarketHub>,
    pub tick_storage: Arc<dyn TickStorage>,
    fetch_interval: Duration,
    tick_interval: Duration,
    news_loop: Mutex<Option<TaskHandle>>,
    tick_loop: Mutex<Option<TaskHandle>>,
}

impl AppState {
    pub fn new(tick_storage: Arc<dyn TickStorage>) -> Self {
        Self::with_intervals(tick_storage, DEFAULT_FETCH_INTERVAL, DEFAULT_TICK_INTERVAL)
    }

    pub fn with_intervals(
        tick_storage: Arc<dyn TickStorage>,
        fetch_interval: Duration,
        tick_interval: Duration,
    ) -> Self {
        Self {
            news: Arc::new(NewsHub::default()),
            market: Arc::new(MarketHub::new()),
            tick_storage,
            fetch_interval,
            tick_interval,
            news_loop: Mutex::new(None),
            tick_loop: Mutex::new(None),
        }
    }

    /// Start the fetch loop over `sources`. A second start while one is
    /// already running is a no-op; returns whether a loop was started.
    pub async fn start_news_loop(&self, sources: Vec<Box<dyn NewsSource>>) -> Result<bool> {
        let mut guard = self.news_loop.lock().await;
        if guard.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return Ok(false);
        }
        let fetch_loop = FetchLoop::new(self.news.clone(), sources, self.fetch_interval)?;
        *guard = Some(fetch_loop.spawn());
        info!(interval = ?self.fetch_interval, "news fetch loop started");
        Ok(true)
    }

    pub async fn stop_news_loop(&self) {
        if let Some(handle) = self.news_loop.lock().await.take() {
            handle.stop().await;
            info!("news fetch loop stopped");
        }
    }

    pub async fn start_tick_loop(&self) -> bool {
        let mut guard = self.tick_loop.lock().await;
        if guard.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return false;
        }
        let generator = TickGenerator::new(
            self.market.clone(),
            self.tick_storage.clone(),
            self.tick_interval,
        );
        *guard = Some(generator.spawn());
        info!(interval = ?self.tick_interval, "tick generator started");
        true
    }

    pub async fn stop_tick_loop(&self) {
        if let Some(handle) = self.tick_loop.lock().await.take() {
            handle.stop().await;
            info!("tick generator stopped");
        }
    }

    /// Stop both loops; called once at process shutdown.
    pub async fn shutdown(&self) {
        self.stop_news_loop().await;
        self.stop_tick_loop().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use comet_core::PriceTick;

    struct NullStore;

    #[async_trait]
    impl TickStorage for NullStore {
        async fn record_tick(&self, _tick: &PriceTick) -> Result<()> {
            Ok(())
        }

        async fn recent_ticks(&self, _symbol: &str, _limit: usize) -> Result<Vec<PriceTick>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn second_news_loop_start_is_a_no_op() {
        let state = AppState::new(Arc::new(NullStore));
        assert!(state.start_news_loop(Vec::new()).await.unwrap());
        assert!(!state.start_news_loop(Vec::new()).await.unwrap());
        state.stop_news_loop().await;
        // After a stop the loop may be started again.
        assert!(state.start_news_loop(Vec::new()).await.unwrap());
        state.shutdown().await;
    }

    #[tokio::test]
    async fn tick_loop_start_stop_cycle() {
        let state = AppState::new(Arc::new(NullStore));
        assert!(state.start_tick_loop().await);
        assert!(!state.start_tick_loop().await);
        state.shutdown().await;
    }
}
