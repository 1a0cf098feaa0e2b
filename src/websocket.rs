//! WebSocket handlers for real-time updates
//!
//! Streams every notification emitted by any invocation to connected
//! clients. Supports ping/pong for connection keepalive.

use crate::notify::Notification;
use crate::state::SharedState;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{error, info, warn};

/// Control messages exchanged with the client
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type")]
pub enum WebSocketMessage {
    /// Sent once after connecting
    #[serde(rename = "connected")]
    Connected {
        /// Number of callable operations
        tools: usize,
    },
    /// The client fell behind and missed notifications
    #[serde(rename = "lagged")]
    Lagged {
        /// How many were skipped
        skipped: u64,
    },
    /// Ping message for connection keepalive
    #[serde(rename = "ping")]
    Ping,
    /// Pong message responding to ping
    #[serde(rename = "pong")]
    Pong,
}

/// WebSocket upgrade handler
///
/// # Arguments
/// * `ws` - WebSocket upgrade request
/// * `state` - Application state holding the notification feed
///
/// # Returns
/// * `Response` - HTTP response initiating WebSocket connection
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> Response {
    let feed = state.notifications.subscribe();
    ws.on_upgrade(|socket| handle_socket(socket, feed))
}

async fn handle_socket(socket: WebSocket, mut feed: broadcast::Receiver<Notification>) {
    let (mut sender, mut receiver) = socket.split();

    info!("WebSocket client connected");

    let hello = WebSocketMessage::Connected {
        tools: crate::tools::ToolName::all().len(),
    };
    if let Ok(text) = serde_json::to_string(&hello) {
        if let Err(e) = sender.send(Message::Text(text)).await {
            error!("Failed to send greeting: {}", e);
            return;
        }
    }

    // Use a channel so several producers can share the sender
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Message>();

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Err(e) = sender.send(msg).await {
                error!("Failed to send message: {}", e);
                break;
            }
        }
    });

    // Forward notifications
    let feed_tx = tx.clone();
    let mut feed_task = tokio::spawn(async move {
        loop {
            let text = match feed.recv().await {
                Ok(notification) => serde_json::to_string(&notification),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "WebSocket client lagging behind notifications");
                    serde_json::to_string(&WebSocketMessage::Lagged { skipped })
                }
                Err(RecvError::Closed) => break,
            };
            match text {
                Ok(text) => {
                    if feed_tx.send(Message::Text(text)).is_err() {
                        break;
                    }
                }
                Err(e) => error!("Failed to serialize notification: {}", e),
            }
        }
    });

    // Task to send periodic pings
    let ping_tx = tx.clone();
    let mut ping_task = tokio::spawn(async move {
        loop {
            tokio::time::sleep(tokio::time::Duration::from_secs(30)).await;
            if ping_tx.send(Message::Ping(vec![])).is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    match serde_json::from_str::<WebSocketMessage>(&text) {
                        Ok(WebSocketMessage::Ping) => {
                            if let Ok(pong) = serde_json::to_string(&WebSocketMessage::Pong) {
                                if tx.send(Message::Text(pong)).is_err() {
                                    break;
                                }
                            }
                        }
                        Ok(other) => warn!("Received unhandled WebSocket message: {:?}", other),
                        Err(_) => warn!("Ignoring malformed WebSocket message"),
                    }
                }
                Ok(Message::Close(_)) => {
                    info!("WebSocket client disconnected");
                    break;
                }
                Ok(Message::Pong(_)) => {}
                Err(e) => {
                    error!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {}
        _ = &mut feed_task => {}
        _ = &mut ping_task => {}
        _ = &mut recv_task => {}
    }
    send_task.abort();
    feed_task.abort();
    ping_task.abort();
    recv_task.abort();

    info!("WebSocket connection closed");
}
