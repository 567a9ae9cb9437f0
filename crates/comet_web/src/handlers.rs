use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::AppState;

pub async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

/// Full rolling buffer, newest-first. Internal fetch problems never surface
/// here; a quiet source simply contributes nothing.
pub async fn get_news(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.news.snapshot())
}

#[derive(Deserialize)]
pub struct TickQuery {
    #[serde(default = "default_tick_limit")]
    pub limit: usize,
}

fn default_tick_limit() -> usize {
    100
}

pub async fn get_ticks(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(query): Query<TickQuery>,
) -> impl IntoResponse {
    let symbol = state.market.ensure_symbol(&symbol);
    let limit = query.limit.clamp(1, 1000);
    Json(state.market.recent_ticks(&symbol, limit))
}

pub async fn get_ohlc(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> impl IntoResponse {
    let symbol = state.market.ensure_symbol(&symbol);
    Json(state.market.ohlc(&symbol))
}
