use axum::{
    extract::{ws::{Message, WebSocket, WebSocketUpgrade}, State},
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{interval, timeout, Duration};

use crate::{
    api::AppState,
    constants::{WS_CLIENT_TIMEOUT_SECS, WS_HEARTBEAT_INTERVAL_SECS},
    models::TransactionRecord,
    wallet::WalletSnapshot,
};

#[derive(Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
enum StreamMessage<'a> {
    Transaction(&'a TransactionRecord),
    Wallet(&'a WalletSnapshot),
}

fn connected_payload() -> String {
    serde_json::json!({
        "type": "connected",
        "message": "Connected to transaction stream"
    })
    .to_string()
}

fn encode(message: StreamMessage<'_>) -> String {
    serde_json::to_string(&message).unwrap_or_default()
}

/// WebSocket handler streaming score transaction and wallet state changes
pub async fn handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    let mut transitions = state.submission.transitions();
    let mut wallet_rx = state.wallet.watch();

    if sender
        .send(Message::Text(connected_payload().into()))
        .await
        .is_err()
    {
        return;
    }

    // Current state first so late joiners render immediately
    let initial_wallet = state.wallet.snapshot();
    let initial_record = state.submission.record();
    let _ = sender
        .send(Message::Text(encode(StreamMessage::Wallet(&initial_wallet)).into()))
        .await;
    let _ = sender
        .send(Message::Text(encode(StreamMessage::Transaction(&initial_record)).into()))
        .await;

    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = interval(Duration::from_secs(WS_HEARTBEAT_INTERVAL_SECS));

        loop {
            let payload = tokio::select! {
                _ = heartbeat.tick() => {
                    if sender.send(Message::Ping(Vec::new().into())).await.is_err() {
                        break;
                    }
                    continue;
                }
                result = transitions.recv() => match result {
                    Ok(record) => encode(StreamMessage::Transaction(&record)),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Transaction stream lagged, {} updates skipped", skipped);
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                },
                changed = wallet_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snapshot = wallet_rx.borrow_and_update().clone();
                    encode(StreamMessage::Wallet(&snapshot))
                }
            };

            if sender.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        loop {
            let next_msg =
                timeout(Duration::from_secs(WS_CLIENT_TIMEOUT_SECS), receiver.next()).await;
            let msg = match next_msg {
                Ok(Some(Ok(msg))) => msg,
                Ok(Some(Err(_))) | Ok(None) => break,
                Err(_) => {
                    tracing::info!("WebSocket client timeout");
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    tracing::debug!("Received: {}", text);
                }
                Message::Close(_) => {
                    tracing::info!("Client disconnected");
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    tracing::info!("Transaction stream connection closed");
}
