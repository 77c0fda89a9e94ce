use super::types::{json_err, JsonRpcRequest, RpcErrorCode};
use super::{audit, encryption, keys, signing};
use crate::api::middleware::auth::authorize;
use crate::api::state::ApiState;
use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use log::debug;
use std::net::SocketAddr;
use std::sync::Arc;

pub async fn handle_rpc(
    State(state): State<Arc<ApiState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let peer = addr.to_string();

    let Ok(value) = serde_json::from_str::<serde_json::Value>(&body) else {
        debug!("rpc parse error body_len={}", body.len());
        return axum::Json(json_err(serde_json::Value::Null, RpcErrorCode::ParseError, "parse error")).into_response();
    };

    match value {
        serde_json::Value::Array(batch) => {
            if batch.is_empty() {
                return axum::Json(json_err(serde_json::Value::Null, RpcErrorCode::InvalidRequest, "empty batch")).into_response();
            }
            debug!("rpc batch request batch_size={}", batch.len());
            let mut out = Vec::with_capacity(batch.len());
            for item in batch {
                match serde_json::from_value::<JsonRpcRequest>(item) {
                    Ok(req) => out.push(handle_single(&state, &headers, req, &peer).await),
                    Err(err) => out.push(json_err(serde_json::Value::Null, RpcErrorCode::InvalidRequest, err.to_string())),
                }
            }
            axum::Json(serde_json::Value::Array(out)).into_response()
        }
        other => match serde_json::from_value::<JsonRpcRequest>(other) {
            Ok(req) => axum::Json(handle_single(&state, &headers, req, &peer).await).into_response(),
            Err(err) => axum::Json(json_err(serde_json::Value::Null, RpcErrorCode::InvalidRequest, err.to_string())).into_response(),
        },
    }
}

async fn handle_single(state: &ApiState, headers: &HeaderMap, req: JsonRpcRequest, peer: &str) -> serde_json::Value {
    let id = req.id.clone();

    if let Some(version) = req.jsonrpc.as_deref() {
        if version != "2.0" {
            debug!("rpc invalid jsonrpc version method={}", req.method);
            return json_err(id, RpcErrorCode::InvalidRequest, "jsonrpc must be '2.0'");
        }
    }

    if let Err(err) = authorize(headers, &state.auth_token) {
        return json_err(id, RpcErrorCode::Unauthorized, err);
    }

    debug!("rpc request method={} peer={}", req.method, peer);
    match req.method.as_str() {
        "key.generate" => keys::handle_generate(state, id, req.params, peer).await,
        "key.get_public_key" => keys::handle_get_public_key(state, id, req.params).await,
        "key.list" => keys::handle_list(state, id, req.params).await,
        "key.rotate" => keys::handle_rotate(state, id, req.params, peer).await,
        "key.deactivate" => keys::handle_deactivate(state, id, req.params, peer).await,
        "signing.sign" => signing::handle_sign(state, id, req.params, peer).await,
        "signing.verify" => signing::handle_verify(state, id, req.params, peer).await,
        "signing.batch_sign" => signing::handle_batch_sign(state, id, req.params, peer).await,
        "encryption.encrypt" => encryption::handle_encrypt(state, id, req.params, peer).await,
        "encryption.decrypt" => encryption::handle_decrypt(state, id, req.params, peer).await,
        "encryption.derive_key" => encryption::handle_derive_key(state, id, req.params, peer).await,
        "audit.query" => audit::handle_query(state, id, req.params).await,
        _ => {
            debug!("rpc method not found method={}", req.method);
            json_err(id, RpcErrorCode::MethodNotFound, "method not found")
        }
    }
}
