use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use chrono::{Duration as ChronoDuration, Utc};
use rand::Rng;

use comet_core::fanout::{Broadcaster, SubscriberId, Subscription};
use comet_core::{OhlcPoint, OhlcSeries, PriceTick};

/// Per-symbol tick history bound.
pub const TICK_HISTORY_LIMIT: usize = 1000;
/// Ticks sent in a live-subscription snapshot.
pub const SNAPSHOT_TICKS: usize = 50;
/// Multiplicative bound on one synthetic move.
pub const TICK_JITTER: f64 = 0.0015;

const SEED_TICKS: usize = 60;
const SEED_CANDLES: usize = 24;
const DEFAULT_SEED_PRICE: f64 = 50.0;

struct MarketState {
    ticks: HashMap<String, VecDeque<PriceTick>>,
    ohlc: HashMap<String, OhlcSeries>,
    channels: HashMap<String, Broadcaster<PriceTick>>,
}

/// Process-scoped market state: bounded per-symbol tick series, seeded OHLC
/// series and one fan-out channel per symbol. Only the tick generator
/// mutates the series; everything else reads snapshots. Broadcast happens
/// under the state lock so a live subscriber's snapshot and subsequent ticks
/// never tear.
pub struct MarketHub {
    state: Mutex<MarketState>,
}

impl MarketHub {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MarketState {
                ticks: HashMap::new(),
                ohlc: HashMap::new(),
                channels: HashMap::new(),
            }),
        }
    }

    /// Seed a symbol with synthetic history: one tick per second going back,
    /// plus hourly OHLC candles. Overwrites any existing series.
    pub fn seed_symbol(&self, symbol: &str, base_price: f64) {
        let symbol = symbol.to_uppercase();
        let now = Utc::now();
        let mut rng = rand::thread_rng();

        let mut ticks = VecDeque::with_capacity(SEED_TICKS);
        let mut price = base_price;
        for i in 0..SEED_TICKS {
            price *= 1.0 + rng.gen_range(-0.002..0.002);
            ticks.push_back(PriceTick {
                symbol: symbol.clone(),
                price: round_to(price, 4),
                ts: now - ChronoDuration::seconds((SEED_TICKS - i) as i64),
            });
        }

        let mut series = Vec::with_capacity(SEED_CANDLES);
        for h in 0..SEED_CANDLES {
            let open = base_price * (1.0 + rng.gen_range(-0.02..0.02));
            let close = open * (1.0 + rng.gen_range(-0.01..0.01));
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            series.push(OhlcPoint {
                t: now - ChronoDuration::hours((SEED_CANDLES - 1 - h) as i64),
                open: round_to(open, 4),
                high: round_to(high, 4),
                low: round_to(low, 4),
                close: round_to(close, 4),
            });
        }

        let mut state = self.state.lock().expect("market hub poisoned");
        state.ticks.insert(symbol.clone(), ticks);
        state.ohlc.insert(
            symbol.clone(),
            OhlcSeries {
                symbol,
                interval: "1h".to_string(),
                series,
            },
        );
    }

    /// Uppercase the symbol, seeding it at the default base price when it
    /// has no history yet. Used by the REST read path.
    pub fn ensure_symbol(&self, symbol: &str) -> String {
        let symbol = symbol.to_uppercase();
        let known = self
            .state
            .lock()
            .expect("market hub poisoned")
            .ticks
            .contains_key(&symbol);
        if !known {
            self.seed_symbol(&symbol, DEFAULT_SEED_PRICE);
        }
        symbol
    }

    pub fn symbols(&self) -> Vec<String> {
        self.state
            .lock()
            .expect("market hub poisoned")
            .ticks
            .keys()
            .cloned()
            .collect()
    }

    /// Latest ticks, newest-first, at most `limit`.
    pub fn recent_ticks(&self, symbol: &str, limit: usize) -> Vec<PriceTick> {
        let symbol = symbol.to_uppercase();
        let state = self.state.lock().expect("market hub poisoned");
        state
            .ticks
            .get(&symbol)
            .map(|series| series.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    pub fn ohlc(&self, symbol: &str) -> Option<OhlcSeries> {
        let symbol = symbol.to_uppercase();
        self.state
            .lock()
            .expect("market hub poisoned")
            .ohlc
            .get(&symbol)
            .cloned()
    }

    /// Register a live connection for one symbol: the last ticks in
    /// chronological order plus the delivery channel, atomically with
    /// respect to `step`.
    pub fn subscribe(&self, symbol: &str) -> (Vec<PriceTick>, Subscription<PriceTick>) {
        let symbol = symbol.to_uppercase();
        let mut state = self.state.lock().expect("market hub poisoned");
        let snapshot = state
            .ticks
            .get(&symbol)
            .map(|series| {
                let skip = series.len().saturating_sub(SNAPSHOT_TICKS);
                series.iter().skip(skip).cloned().collect()
            })
            .unwrap_or_default();
        let subscription = state.channels.entry(symbol).or_default().subscribe();
        (snapshot, subscription)
    }

    pub fn unsubscribe(&self, symbol: &str, id: SubscriberId) {
        let symbol = symbol.to_uppercase();
        let state = self.state.lock().expect("market hub poisoned");
        if let Some(channel) = state.channels.get(&symbol) {
            channel.unsubscribe(id);
        }
    }

    /// One generator pass: for every symbol with history, perturb the last
    /// price by a small bounded random factor, append the tick (evicting
    /// from the head past the bound) and broadcast it on the symbol's
    /// channel. Returns the fresh ticks.
    pub fn step(&self) -> Vec<PriceTick> {
        let mut rng = rand::thread_rng();
        let mut state = self.state.lock().expect("market hub poisoned");
        let mut fresh = Vec::new();

        let symbols: Vec<String> = state.ticks.keys().cloned().collect();
        for symbol in symbols {
            let Some(series) = state.ticks.get_mut(&symbol) else {
                continue;
            };
            let Some(last) = series.back() else {
                continue;
            };
            let tick = PriceTick {
                symbol: symbol.clone(),
                price: round_to(last.price * (1.0 + rng.gen_range(-TICK_JITTER..TICK_JITTER)), 6),
                ts: Utc::now(),
            };
            series.push_back(tick.clone());
            while series.len() > TICK_HISTORY_LIMIT {
                series.pop_front();
            }
            if let Some(channel) = state.channels.get(&symbol) {
                channel.broadcast(&tick);
            }
            fresh.push(tick);
        }
        fresh
    }
}

impl Default for MarketHub {
    fn default() -> Self {
        Self::new()
    }
}

fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}
