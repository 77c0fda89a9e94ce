use super::types::{encode_bytes, json_err, json_ok, optional_params, required_params, vault_err, RpcErrorCode};
use crate::api::state::ApiState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use vault_core::domain::{KeyAlgorithm, KeyMetadata, KeyStatus};
use vault_core::foundation::KeyId;

#[derive(Debug, Default, Deserialize)]
pub struct GenerateKeyParams {
    /// Algorithm tag; 0 or absent means the default (P-256).
    #[serde(default)]
    pub algorithm: u8,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
struct GenerateKeyResult {
    metadata: KeyMetadata,
}

pub async fn handle_generate(state: &ApiState, id: serde_json::Value, params: Option<serde_json::Value>, peer: &str) -> serde_json::Value {
    let params: GenerateKeyParams = match optional_params(params) {
        Ok(parsed) => parsed,
        Err(err) => return json_err(id, RpcErrorCode::InvalidParams, err),
    };

    let algorithm = if params.algorithm == 0 {
        None
    } else {
        match KeyAlgorithm::try_from(params.algorithm) {
            Ok(algorithm) => Some(algorithm),
            Err(err) => return json_err(id, RpcErrorCode::InvalidParams, err.to_string()),
        }
    };

    match state.vault.generate_key(algorithm, params.labels, peer) {
        Ok(metadata) => json_ok(id, GenerateKeyResult { metadata }),
        Err(err) => vault_err(id, err),
    }
}

#[derive(Debug, Deserialize)]
pub struct GetPublicKeyParams {
    pub key_id: String,
}

#[derive(Debug, Serialize)]
struct GetPublicKeyResult {
    key_id: KeyId,
    public_key_der: String,
    algorithm: KeyAlgorithm,
}

pub async fn handle_get_public_key(state: &ApiState, id: serde_json::Value, params: Option<serde_json::Value>) -> serde_json::Value {
    let params: GetPublicKeyParams = match required_params(params) {
        Ok(parsed) => parsed,
        Err(err) => return json_err(id, RpcErrorCode::InvalidParams, err),
    };

    match state.vault.get_public_key(&KeyId::from(params.key_id)) {
        Ok(info) => json_ok(
            id,
            GetPublicKeyResult {
                key_id: info.key_id,
                public_key_der: encode_bytes(&info.public_key_der),
                algorithm: info.algorithm,
            },
        ),
        Err(err) => vault_err(id, err),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListKeysParams {
    /// Status tag; 0 or absent means every status.
    #[serde(default)]
    pub status_filter: u8,
}

#[derive(Debug, Serialize)]
struct ListKeysResult {
    keys: Vec<KeyMetadata>,
}

pub async fn handle_list(state: &ApiState, id: serde_json::Value, params: Option<serde_json::Value>) -> serde_json::Value {
    let params: ListKeysParams = match optional_params(params) {
        Ok(parsed) => parsed,
        Err(err) => return json_err(id, RpcErrorCode::InvalidParams, err),
    };

    let filter = if params.status_filter == 0 {
        None
    } else {
        match KeyStatus::try_from(params.status_filter) {
            Ok(status) => Some(status),
            Err(err) => return json_err(id, RpcErrorCode::InvalidParams, err.to_string()),
        }
    };

    match state.vault.list_keys(filter) {
        Ok(keys) => json_ok(id, ListKeysResult { keys }),
        Err(err) => vault_err(id, err),
    }
}

#[derive(Debug, Deserialize)]
pub struct RotateKeyParams {
    pub key_id: String,
}

#[derive(Debug, Serialize)]
struct RotateKeyResult {
    old_key: KeyMetadata,
    new_key: KeyMetadata,
}

pub async fn handle_rotate(state: &ApiState, id: serde_json::Value, params: Option<serde_json::Value>, peer: &str) -> serde_json::Value {
    let params: RotateKeyParams = match required_params(params) {
        Ok(parsed) => parsed,
        Err(err) => return json_err(id, RpcErrorCode::InvalidParams, err),
    };

    match state.vault.rotate_key(&KeyId::from(params.key_id), peer) {
        Ok(outcome) => json_ok(id, RotateKeyResult { old_key: outcome.old_key, new_key: outcome.new_key }),
        Err(err) => vault_err(id, err),
    }
}

#[derive(Debug, Deserialize)]
pub struct DeactivateKeyParams {
    pub key_id: String,
}

#[derive(Debug, Serialize)]
struct DeactivateKeyResult {
    metadata: KeyMetadata,
}

pub async fn handle_deactivate(state: &ApiState, id: serde_json::Value, params: Option<serde_json::Value>, peer: &str) -> serde_json::Value {
    let params: DeactivateKeyParams = match required_params(params) {
        Ok(parsed) => parsed,
        Err(err) => return json_err(id, RpcErrorCode::InvalidParams, err),
    };

    match state.vault.deactivate_key(&KeyId::from(params.key_id), peer) {
        Ok(metadata) => json_ok(id, DeactivateKeyResult { metadata }),
        Err(err) => vault_err(id, err),
    }
}
