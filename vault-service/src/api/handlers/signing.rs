use super::types::{decode_bytes, encode_bytes, json_err, json_ok, required_params, vault_err, RpcErrorCode};
use crate::api::state::ApiState;
use serde::{Deserialize, Serialize};
use vault_core::foundation::KeyId;

#[derive(Debug, Deserialize)]
pub struct SignParams {
    pub key_id: String,
    pub data: String,
}

#[derive(Debug, Serialize)]
struct SignResult {
    key_id: String,
    signature: String,
}

pub async fn handle_sign(state: &ApiState, id: serde_json::Value, params: Option<serde_json::Value>, peer: &str) -> serde_json::Value {
    let params: SignParams = match required_params(params) {
        Ok(parsed) => parsed,
        Err(err) => return json_err(id, RpcErrorCode::InvalidParams, err),
    };
    let data = match decode_bytes("data", &params.data) {
        Ok(data) => data,
        Err(err) => return json_err(id, RpcErrorCode::InvalidParams, err),
    };

    match state.vault.sign(&KeyId::from(params.key_id.clone()), &data, peer) {
        Ok(signature) => json_ok(id, SignResult { key_id: params.key_id, signature: encode_bytes(&signature) }),
        Err(err) => vault_err(id, err),
    }
}

#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    pub key_id: String,
    pub data: String,
    pub signature: String,
}

#[derive(Debug, Serialize)]
struct VerifyResult {
    valid: bool,
}

pub async fn handle_verify(state: &ApiState, id: serde_json::Value, params: Option<serde_json::Value>, peer: &str) -> serde_json::Value {
    let params: VerifyParams = match required_params(params) {
        Ok(parsed) => parsed,
        Err(err) => return json_err(id, RpcErrorCode::InvalidParams, err),
    };
    let data = match decode_bytes("data", &params.data) {
        Ok(data) => data,
        Err(err) => return json_err(id, RpcErrorCode::InvalidParams, err),
    };
    let signature = match decode_bytes("signature", &params.signature) {
        Ok(signature) => signature,
        Err(err) => return json_err(id, RpcErrorCode::InvalidParams, err),
    };

    match state.vault.verify(&KeyId::from(params.key_id), &data, &signature, peer) {
        Ok(valid) => json_ok(id, VerifyResult { valid }),
        Err(err) => vault_err(id, err),
    }
}

#[derive(Debug, Deserialize)]
pub struct BatchSignParams {
    pub key_id: String,
    pub data: Vec<String>,
}

#[derive(Debug, Serialize)]
struct BatchSignItem {
    #[serde(skip_serializing_if = "String::is_empty")]
    signature: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    error: String,
}

#[derive(Debug, Serialize)]
struct BatchSignResult {
    results: Vec<BatchSignItem>,
}

pub async fn handle_batch_sign(state: &ApiState, id: serde_json::Value, params: Option<serde_json::Value>, peer: &str) -> serde_json::Value {
    let params: BatchSignParams = match required_params(params) {
        Ok(parsed) => parsed,
        Err(err) => return json_err(id, RpcErrorCode::InvalidParams, err),
    };

    let mut items = Vec::with_capacity(params.data.len());
    for (index, value) in params.data.iter().enumerate() {
        match decode_bytes(&format!("data[{index}]"), value) {
            Ok(item) => items.push(item),
            Err(err) => return json_err(id, RpcErrorCode::InvalidParams, err),
        }
    }

    match state.vault.batch_sign(&KeyId::from(params.key_id), items, peer).await {
        Ok(outcomes) => json_ok(
            id,
            BatchSignResult {
                results: outcomes
                    .into_iter()
                    .map(|outcome| BatchSignItem {
                        signature: if outcome.signature.is_empty() { String::new() } else { encode_bytes(&outcome.signature) },
                        error: outcome.error,
                    })
                    .collect(),
            },
        ),
        Err(err) => vault_err(id, err),
    }
}
