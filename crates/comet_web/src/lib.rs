use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;

pub mod handlers;
pub mod state;
pub mod ws;

pub use state::AppState;

pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/news", get(handlers::get_news))
        .route("/ws/news", get(ws::ws_news))
        .route("/api/market/:symbol/tick", get(handlers::get_ticks))
        .route("/api/market/:symbol/ohlc", get(handlers::get_ohlc))
        .route("/ws/market/:symbol", get(ws::ws_market))
        .layer(cors)
        .with_state(state)
}

pub mod prelude {
    pub use crate::AppState;
    pub use comet_core::{Error, NewsItem, PriceTick, Result};
}
