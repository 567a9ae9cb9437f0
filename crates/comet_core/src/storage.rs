use async_trait::async_trait;

use crate::types::PriceTick;
use crate::Result;

/// Durable tick storage collaborator, keyed by symbol. The in-memory market
/// state is authoritative for the live read path; this store is an archival
/// sink and is written best-effort.
#[async_trait]
pub trait TickStorage: Send + Sync {
    /// Append one tick to the symbol's history.
    async fn record_tick(&self, tick: &PriceTick) -> Result<()>;

    /// Most recent ticks for a symbol, newest-first, at most `limit`.
    async fn recent_ticks(&self, symbol: &str, limit: usize) -> Result<Vec<PriceTick>>;
}
