use super::types::{decode_bytes, encode_bytes, json_err, json_ok, required_params, vault_err, RpcErrorCode};
use crate::api::state::ApiState;
use serde::{Deserialize, Serialize};
use vault_core::foundation::KeyId;

#[derive(Debug, Deserialize)]
pub struct EncryptParams {
    pub key_id: String,
    pub plaintext: String,
    #[serde(default)]
    pub aad: String,
}

#[derive(Debug, Serialize)]
struct EncryptResult {
    key_id: String,
    ciphertext: String,
}

pub async fn handle_encrypt(state: &ApiState, id: serde_json::Value, params: Option<serde_json::Value>, peer: &str) -> serde_json::Value {
    let params: EncryptParams = match required_params(params) {
        Ok(parsed) => parsed,
        Err(err) => return json_err(id, RpcErrorCode::InvalidParams, err),
    };
    let plaintext = match decode_bytes("plaintext", &params.plaintext) {
        Ok(plaintext) => plaintext,
        Err(err) => return json_err(id, RpcErrorCode::InvalidParams, err),
    };
    let aad = match decode_bytes("aad", &params.aad) {
        Ok(aad) => aad,
        Err(err) => return json_err(id, RpcErrorCode::InvalidParams, err),
    };

    match state.vault.encrypt(&KeyId::from(params.key_id.clone()), &plaintext, &aad, peer) {
        Ok(ciphertext) => json_ok(id, EncryptResult { key_id: params.key_id, ciphertext: encode_bytes(&ciphertext) }),
        Err(err) => vault_err(id, err),
    }
}

#[derive(Debug, Deserialize)]
pub struct DecryptParams {
    pub key_id: String,
    pub ciphertext: String,
    #[serde(default)]
    pub aad: String,
}

#[derive(Debug, Serialize)]
struct DecryptResult {
    plaintext: String,
}

pub async fn handle_decrypt(state: &ApiState, id: serde_json::Value, params: Option<serde_json::Value>, peer: &str) -> serde_json::Value {
    let params: DecryptParams = match required_params(params) {
        Ok(parsed) => parsed,
        Err(err) => return json_err(id, RpcErrorCode::InvalidParams, err),
    };
    let ciphertext = match decode_bytes("ciphertext", &params.ciphertext) {
        Ok(ciphertext) => ciphertext,
        Err(err) => return json_err(id, RpcErrorCode::InvalidParams, err),
    };
    let aad = match decode_bytes("aad", &params.aad) {
        Ok(aad) => aad,
        Err(err) => return json_err(id, RpcErrorCode::InvalidParams, err),
    };

    match state.vault.decrypt(&KeyId::from(params.key_id), &ciphertext, &aad, peer) {
        Ok(plaintext) => json_ok(id, DecryptResult { plaintext: encode_bytes(&plaintext) }),
        Err(err) => vault_err(id, err),
    }
}

#[derive(Debug, Deserialize)]
pub struct DeriveKeyParams {
    pub root_key_id: String,
    #[serde(default)]
    pub context: String,
    pub length: usize,
}

#[derive(Debug, Serialize)]
struct DeriveKeyResult {
    derived_key: String,
}

pub async fn handle_derive_key(state: &ApiState, id: serde_json::Value, params: Option<serde_json::Value>, peer: &str) -> serde_json::Value {
    let params: DeriveKeyParams = match required_params(params) {
        Ok(parsed) => parsed,
        Err(err) => return json_err(id, RpcErrorCode::InvalidParams, err),
    };
    let context = match decode_bytes("context", &params.context) {
        Ok(context) => context,
        Err(err) => return json_err(id, RpcErrorCode::InvalidParams, err),
    };

    match state.vault.derive_key(&KeyId::from(params.root_key_id), &context, params.length, peer) {
        Ok(derived) => json_ok(id, DeriveKeyResult { derived_key: encode_bytes(&derived) }),
        Err(err) => vault_err(id, err),
    }
}
