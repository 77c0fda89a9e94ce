//! Server-streaming and bidirectional endpoints over WebSocket.
//!
//! Each stream holds a bounded subscription whose drop guard deregisters
//! it, so the subscriber set shrinks on every termination path: client
//! close, transport error, or server shutdown.

use crate::api::handlers::types::{decode_bytes, encode_bytes};
use crate::api::middleware::auth::authorize;
use crate::api::state::ApiState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use log::debug;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use vault_core::foundation::KeyId;

/// WatchKeyEvents: streams key lifecycle events until the caller leaves.
pub async fn ws_key_events(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    if let Err(err) = authorize(&headers, &state.auth_token) {
        return (StatusCode::UNAUTHORIZED, err).into_response();
    }
    ws.on_upgrade(move |socket| key_event_stream(state, socket))
}

async fn key_event_stream(state: Arc<ApiState>, mut socket: WebSocket) {
    let mut subscription = state.vault.events().subscribe();
    loop {
        tokio::select! {
            event = subscription.recv() => {
                let Some(event) = event else { break };
                let Ok(text) = serde_json::to_string(&event) else { continue };
                if socket.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                if !still_open(incoming) {
                    break;
                }
            }
        }
    }
    debug!("key event stream closed");
}

/// StreamAudit: streams audit entries as the processor emits them.
pub async fn ws_audit(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    if let Err(err) = authorize(&headers, &state.auth_token) {
        return (StatusCode::UNAUTHORIZED, err).into_response();
    }
    ws.on_upgrade(move |socket| audit_stream(state, socket))
}

async fn audit_stream(state: Arc<ApiState>, mut socket: WebSocket) {
    let mut subscription = state.vault.audit().subscribe();
    loop {
        tokio::select! {
            entry = subscription.recv() => {
                let Some(entry) = entry else { break };
                let Ok(text) = serde_json::to_string(&entry) else { continue };
                if socket.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                if !still_open(incoming) {
                    break;
                }
            }
        }
    }
    debug!("audit stream closed");
}

#[derive(Debug, Deserialize)]
struct StreamSignRequest {
    key_id: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct StreamSignResponse {
    #[serde(skip_serializing_if = "String::is_empty")]
    signature: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    error: String,
}

/// StreamSign: one response frame per request frame, in arrival order.
/// Per-request failures surface in the response frame; the stream only
/// ends on caller EOF or a transport error.
pub async fn ws_sign(
    State(state): State<Arc<ApiState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    if let Err(err) = authorize(&headers, &state.auth_token) {
        return (StatusCode::UNAUTHORIZED, err).into_response();
    }
    ws.on_upgrade(move |socket| sign_stream(state, socket, addr))
}

async fn sign_stream(state: Arc<ApiState>, mut socket: WebSocket, addr: SocketAddr) {
    let peer = addr.to_string();
    while let Some(incoming) = socket.recv().await {
        let message = match incoming {
            Ok(message) => message,
            Err(_) => break,
        };
        match message {
            Message::Text(text) => {
                let response = match serde_json::from_str::<StreamSignRequest>(&text) {
                    Ok(request) => process_sign_request(&state, request, &peer),
                    Err(err) => StreamSignResponse { signature: String::new(), error: err.to_string() },
                };
                let Ok(reply) = serde_json::to_string(&response) else { continue };
                if socket.send(Message::Text(reply.into())).await.is_err() {
                    break;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }
    debug!("sign stream closed");
}

fn process_sign_request(state: &ApiState, request: StreamSignRequest, peer: &str) -> StreamSignResponse {
    let data = match decode_bytes("data", &request.data) {
        Ok(data) => data,
        Err(err) => return StreamSignResponse { signature: String::new(), error: err },
    };
    match state.vault.sign(&KeyId::from(request.key_id), &data, peer) {
        Ok(signature) => StreamSignResponse { signature: encode_bytes(&signature), error: String::new() },
        Err(err) => StreamSignResponse { signature: String::new(), error: err.to_string() },
    }
}

/// True while the client side has neither closed nor failed.
fn still_open(incoming: Option<Result<Message, axum::Error>>) -> bool {
    match incoming {
        None | Some(Err(_)) | Some(Ok(Message::Close(_))) => false,
        Some(Ok(_)) => true,
    }
}
