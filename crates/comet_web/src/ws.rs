use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use comet_core::NewsItem;

use crate::AppState;

/// Server frames on the news channel. The keepalive reply is JSON here but a
/// bare text frame on the market channel; the asymmetry is part of the wire
/// contract.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NewsFrame {
    Init { items: Vec<NewsItem> },
    Batch { items: Vec<NewsItem> },
    Pong,
}

fn is_keepalive(text: &str) -> bool {
    let text = text.trim().to_lowercase();
    text == "ping" || text == "keepalive"
}

pub async fn ws_news(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_news_socket(socket, state))
}

async fn handle_news_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let (snapshot, mut subscription) = state.news.subscribe();
    let subscriber = subscription.id;

    let init = NewsFrame::Init { items: snapshot };
    let sent = match serde_json::to_string(&init) {
        Ok(payload) => sender.send(Message::Text(payload)).await.is_ok(),
        Err(_) => false,
    };
    if !sent {
        state.news.unsubscribe(subscriber);
        return;
    }

    loop {
        tokio::select! {
            batch = subscription.receiver.recv() => {
                let Some(items) = batch else { break };
                let frame = NewsFrame::Batch { items };
                let Ok(payload) = serde_json::to_string(&frame) else { continue };
                if sender.send(Message::Text(payload)).await.is_err() {
                    break;
                }
            }
            inbound = receiver.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        if is_keepalive(&text) {
                            let Ok(payload) = serde_json::to_string(&NewsFrame::Pong) else { continue };
                            if sender.send(Message::Text(payload)).await.is_err() {
                                break;
                            }
                        }
                        // Anything else is ignored, not fatal.
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(error = %e, "news socket read failed");
                        break;
                    }
                }
            }
        }
    }
    state.news.unsubscribe(subscriber);
}

pub async fn ws_market(
    ws: WebSocketUpgrade,
    Path(symbol): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_market_socket(socket, state, symbol))
}

async fn handle_market_socket(socket: WebSocket, state: Arc<AppState>, symbol: String) {
    let symbol = symbol.to_uppercase();
    let (mut sender, mut receiver) = socket.split();
    let (ticks, mut subscription) = state.market.subscribe(&symbol);
    let subscriber = subscription.id;

    let snapshot = json!({"type": "snapshot", "symbol": symbol, "ticks": ticks});
    if sender
        .send(Message::Text(snapshot.to_string()))
        .await
        .is_err()
    {
        state.market.unsubscribe(&symbol, subscriber);
        return;
    }

    loop {
        tokio::select! {
            tick = subscription.receiver.recv() => {
                let Some(tick) = tick else { break };
                let Ok(payload) = serde_json::to_string(&tick) else { continue };
                if sender.send(Message::Text(payload)).await.is_err() {
                    break;
                }
            }
            inbound = receiver.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        if is_keepalive(&text)
                            && sender.send(Message::Text("pong".to_string())).await.is_err()
                        {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(error = %e, "market socket read failed");
                        break;
                    }
                }
            }
        }
    }
    state.market.unsubscribe(&symbol, subscriber);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use comet_core::{PriceTick, Sentiment};

    #[test]
    fn news_frames_carry_wire_tags() {
        let init = NewsFrame::Init { items: vec![] };
        assert_eq!(
            serde_json::to_string(&init).unwrap(),
            r#"{"type":"init","items":[]}"#
        );

        let item = NewsItem {
            id: "x".to_string(),
            headline: "h".to_string(),
            source: "s".to_string(),
            ts: Utc::now(),
            summary: None,
            sentiment: Sentiment::Neutral,
            tickers: vec![],
            tags: vec![],
            url: None,
        };
        let batch = NewsFrame::Batch { items: vec![item] };
        let value: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&batch).unwrap()).unwrap();
        assert_eq!(value["type"], "batch");
        assert_eq!(value["items"].as_array().unwrap().len(), 1);

        assert_eq!(
            serde_json::to_string(&NewsFrame::Pong).unwrap(),
            r#"{"type":"pong"}"#
        );
    }

    #[test]
    fn market_snapshot_shape() {
        let ticks = vec![PriceTick {
            symbol: "NG".to_string(),
            price: 3.5,
            ts: Utc::now(),
        }];
        let snapshot = json!({"type": "snapshot", "symbol": "NG", "ticks": ticks});
        assert_eq!(snapshot["type"], "snapshot");
        assert_eq!(snapshot["symbol"], "NG");
        assert_eq!(snapshot["ticks"][0]["price"], 3.5);
    }

    #[test]
    fn keepalive_tokens() {
        assert!(is_keepalive("ping"));
        assert!(is_keepalive("PING"));
        assert!(is_keepalive(" Keepalive "));
        assert!(!is_keepalive("subscribe"));
        assert!(!is_keepalive(""));
    }
}
