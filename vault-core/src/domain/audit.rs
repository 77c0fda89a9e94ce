use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const AUDIT_STATUS_OK: &str = "OK";
pub const AUDIT_STATUS_ERROR: &str = "ERROR";

/// One audited operation. Retained in-process and emitted as a JSON line.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AuditEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub operation: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub key_id: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub peer_address: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}
