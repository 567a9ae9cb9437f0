use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use comet_core::{PriceTick, Result, TickStorage};

struct MemoryStore {
    ticks: HashMap<String, Vec<PriceTick>>,
}

impl MemoryStore {
    fn new() -> Self {
        Self {
            ticks: HashMap::new(),
        }
    }

    fn record_tick(&mut self, tick: &PriceTick) {
        self.ticks
            .entry(tick.symbol.clone())
            .or_default()
            .push(tick.clone());
    }

    fn recent_ticks(&self, symbol: &str, limit: usize) -> Vec<PriceTick> {
        self.ticks
            .get(symbol)
            .map(|series| series.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default()
    }
}

/// In-memory tick archive. Stands in for a durable store in tests and
/// single-process deployments; the interface is the only contract.
pub struct MemoryTickStore {
    store: Arc<RwLock<MemoryStore>>,
}

impl MemoryTickStore {
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(MemoryStore::new())),
        }
    }
}

impl Default for MemoryTickStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TickStorage for MemoryTickStore {
    async fn record_tick(&self, tick: &PriceTick) -> Result<()> {
        let mut store = self.store.write().await;
        store.record_tick(tick);
        Ok(())
    }

    async fn recent_ticks(&self, symbol: &str, limit: usize) -> Result<Vec<PriceTick>> {
        let store = self.store.read().await;
        Ok(store.recent_ticks(symbol, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn tick(symbol: &str, price: f64, age_secs: i64) -> PriceTick {
        PriceTick {
            symbol: symbol.to_string(),
            price,
            ts: Utc::now() - Duration::seconds(age_secs),
        }
    }

    #[tokio::test]
    async fn round_trips_ticks_newest_first() {
        let store = MemoryTickStore::new();
        store.record_tick(&tick("NG", 3.50, 3)).await.unwrap();
        store.record_tick(&tick("NG", 3.51, 2)).await.unwrap();
        store.record_tick(&tick("NG", 3.52, 1)).await.unwrap();
        store.record_tick(&tick("WTI", 80.0, 1)).await.unwrap();

        let recent = store.recent_ticks("NG", 2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].price, 3.52);
        assert_eq!(recent[1].price, 3.51);
    }

    #[tokio::test]
    async fn unknown_symbol_is_empty() {
        let store = MemoryTickStore::new();
        assert!(store.recent_ticks("NG", 10).await.unwrap().is_empty());
    }
}
