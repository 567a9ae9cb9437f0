use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;

use comet_core::{PriceTick, TaskHandle, TickStorage};

use crate::hub::MarketHub;

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Periodic synthesizer of price movements. Each pass advances every seeded
/// symbol one tick, fans the tick out to that symbol's subscribers and
/// archives it through the storage collaborator best-effort.
pub struct TickGenerator {
    hub: Arc<MarketHub>,
    storage: Arc<dyn TickStorage>,
    interval: Duration,
}

impl TickGenerator {
    pub fn new(hub: Arc<MarketHub>, storage: Arc<dyn TickStorage>, interval: Duration) -> Self {
        Self {
            hub,
            storage,
            interval,
        }
    }

    /// One generation pass. Archive failures never stop the generator.
    pub async fn run_once(&self) -> Vec<PriceTick> {
        let ticks = self.hub.step();
        for tick in &ticks {
            if let Err(e) = self.storage.record_tick(tick).await {
                debug!(symbol = %tick.symbol, error = %e, "tick archive write failed");
            }
        }
        ticks
    }

    /// Run until stopped, one pass per interval.
    pub fn spawn(self) -> TaskHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(self.interval) => {}
                    _ = shutdown_rx.changed() => {
                        debug!("tick generator stopping");
                        break;
                    }
                }
                self.run_once().await;
            }
        });
        TaskHandle::new(shutdown_tx, task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use comet_core::{Error, Result};

    #[derive(Default)]
    struct RecordingStore {
        ticks: Mutex<Vec<PriceTick>>,
    }

    struct FailingStore;

    #[async_trait]
    impl TickStorage for RecordingStore {
        async fn record_tick(&self, tick: &PriceTick) -> Result<()> {
            self.ticks.lock().unwrap().push(tick.clone());
            Ok(())
        }

        async fn recent_ticks(&self, _symbol: &str, _limit: usize) -> Result<Vec<PriceTick>> {
            Ok(self.ticks.lock().unwrap().clone())
        }
    }

    #[async_trait]
    impl TickStorage for FailingStore {
        async fn record_tick(&self, _tick: &PriceTick) -> Result<()> {
            Err(Error::Storage("disk full".to_string()))
        }

        async fn recent_ticks(&self, _symbol: &str, _limit: usize) -> Result<Vec<PriceTick>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn run_once_archives_generated_ticks() {
        let hub = Arc::new(MarketHub::new());
        hub.seed_symbol("NG", 3.5);
        hub.seed_symbol("WTI", 80.0);
        let store = Arc::new(RecordingStore::default());

        let generator = TickGenerator::new(hub, store.clone(), DEFAULT_TICK_INTERVAL);
        let ticks = generator.run_once().await;
        assert_eq!(ticks.len(), 2);
        assert_eq!(store.ticks.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn archive_failure_does_not_stop_generation() {
        let hub = Arc::new(MarketHub::new());
        hub.seed_symbol("NG", 3.5);

        let generator = TickGenerator::new(hub.clone(), Arc::new(FailingStore), DEFAULT_TICK_INTERVAL);
        let ticks = generator.run_once().await;
        assert_eq!(ticks.len(), 1);
        // The in-memory series still advanced.
        assert_eq!(hub.recent_ticks("NG", 100).len(), 61);
    }

    #[tokio::test]
    async fn spawned_generator_stops() {
        let hub = Arc::new(MarketHub::new());
        let generator = TickGenerator::new(hub, Arc::new(RecordingStore::default()), Duration::from_secs(3600));
        let handle = generator.spawn();
        tokio::time::timeout(Duration::from_secs(5), handle.stop())
            .await
            .expect("generator did not observe shutdown");
    }
}
