use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use vault_core::foundation::{ErrorCode, VaultError};

#[repr(i64)]
#[derive(Clone, Copy, Debug)]
pub enum RpcErrorCode {
    ParseError = -32700,
    InvalidRequest = -32600,
    MethodNotFound = -32601,
    InvalidParams = -32602,
    InternalError = -32603,
    NotFound = -32000,
    FailedPrecondition = -32001,
    AlreadyExists = -32002,
    Unauthorized = -32010,
    RateLimited = -32011,
}

#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: Option<String>,
    pub id: serde_json::Value,
    pub method: String,
    pub params: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcResponse<T> {
    pub jsonrpc: &'static str,
    pub id: serde_json::Value,
    pub result: T,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub jsonrpc: &'static str,
    pub id: serde_json::Value,
    pub error: JsonRpcErrorBody,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcErrorBody {
    pub code: i64,
    pub message: String,
}

pub fn json_ok<T: Serialize>(id: serde_json::Value, result: T) -> serde_json::Value {
    serde_json::to_value(JsonRpcResponse { jsonrpc: "2.0", id, result }).unwrap_or(serde_json::Value::Null)
}

pub fn json_err(id: serde_json::Value, code: RpcErrorCode, message: impl Into<String>) -> serde_json::Value {
    serde_json::to_value(JsonRpcError { jsonrpc: "2.0", id, error: JsonRpcErrorBody { code: code as i64, message: message.into() } })
        .unwrap_or(serde_json::Value::Null)
}

/// Maps a core error onto the wire code space.
pub fn vault_err(id: serde_json::Value, err: VaultError) -> serde_json::Value {
    let code = match err.code() {
        ErrorCode::KeyNotFound => RpcErrorCode::NotFound,
        ErrorCode::KeyAlreadyExists => RpcErrorCode::AlreadyExists,
        ErrorCode::KeyNotActive => RpcErrorCode::FailedPrecondition,
        ErrorCode::InvalidAlgorithm | ErrorCode::InvalidDerivedLength | ErrorCode::InvalidCiphertext => RpcErrorCode::InvalidParams,
        _ => RpcErrorCode::InternalError,
    };
    json_err(id, code, err.to_string())
}

/// Parses the params object for methods whose fields are all required.
pub fn required_params<T: DeserializeOwned>(params: Option<serde_json::Value>) -> Result<T, String> {
    match params {
        None => Err("missing params".to_string()),
        Some(value) => serde_json::from_value(value).map_err(|err| err.to_string()),
    }
}

/// Parses the params object for methods where every field has a default.
pub fn optional_params<T: DeserializeOwned + Default>(params: Option<serde_json::Value>) -> Result<T, String> {
    match params {
        None => Ok(T::default()),
        Some(value) => serde_json::from_value(value).map_err(|err| err.to_string()),
    }
}

/// Binary request fields travel as standard base64 strings.
pub fn decode_bytes(field: &str, value: &str) -> Result<Vec<u8>, String> {
    BASE64.decode(value).map_err(|err| format!("invalid base64 in {field}: {err}"))
}

pub fn encode_bytes(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}
