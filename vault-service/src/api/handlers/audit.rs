use super::types::{json_err, json_ok, optional_params, RpcErrorCode};
use crate::api::state::ApiState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vault_core::domain::AuditEntry;

#[derive(Debug, Default, Deserialize)]
pub struct QueryAuditParams {
    #[serde(default)]
    pub key_id: String,
    #[serde(default)]
    pub operation: String,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub limit: usize,
}

#[derive(Debug, Serialize)]
struct QueryAuditResult {
    entries: Vec<AuditEntry>,
}

pub async fn handle_query(state: &ApiState, id: serde_json::Value, params: Option<serde_json::Value>) -> serde_json::Value {
    let params: QueryAuditParams = match optional_params(params) {
        Ok(parsed) => parsed,
        Err(err) => return json_err(id, RpcErrorCode::InvalidParams, err),
    };

    let entries = state.vault.audit().query(&params.key_id, &params.operation, params.start_time, params.end_time, params.limit);
    json_ok(id, QueryAuditResult { entries })
}
