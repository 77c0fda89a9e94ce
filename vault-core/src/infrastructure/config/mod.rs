//! Environment-driven configuration.

use std::path::PathBuf;

pub const LISTEN_ADDR_ENV: &str = "VAULT_LISTEN_ADDR";
pub const AUTH_TOKEN_ENV: &str = "VAULT_AUTH_TOKEN";
pub const DATA_DIR_ENV: &str = "VAULT_DATA_DIR";
pub const RATE_LIMIT_RPS_ENV: &str = "VAULT_RATE_LIMIT_RPS";
pub const AUDIT_BUFFER_ENV: &str = "VAULT_AUDIT_BUFFER";
pub const TLS_CERT_ENV: &str = "VAULT_TLS_CERT";
pub const TLS_KEY_ENV: &str = "VAULT_TLS_KEY";

/// Name of the store file inside the data directory.
pub const STORE_FILE_NAME: &str = "keys.json";

#[derive(Clone, Debug)]
pub struct VaultConfig {
    pub listen_addr: String,
    pub auth_token: String,
    /// Empty means memory-only; otherwise the persistent store lives at
    /// `<data_dir>/keys.json`.
    pub data_dir: String,
    pub rate_limit_rps: u32,
    pub audit_buffer: usize,
    pub tls_cert: Option<PathBuf>,
    pub tls_key: Option<PathBuf>,
}

impl VaultConfig {
    pub fn from_env() -> Self {
        Self {
            listen_addr: env_or(LISTEN_ADDR_ENV, "0.0.0.0:50051"),
            auth_token: env_or(AUTH_TOKEN_ENV, "dev-token"),
            data_dir: env_or(DATA_DIR_ENV, ""),
            rate_limit_rps: env_parsed(RATE_LIMIT_RPS_ENV, 100),
            audit_buffer: env_parsed(AUDIT_BUFFER_ENV, 1024),
            tls_cert: env_path(TLS_CERT_ENV),
            tls_key: env_path(TLS_KEY_ENV),
        }
    }

    /// Path of the persistent store file, or `None` for memory-only mode.
    pub fn store_path(&self) -> Option<PathBuf> {
        if self.data_dir.is_empty() {
            None
        } else {
            Some(PathBuf::from(&self.data_dir).join(STORE_FILE_NAME))
        }
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:50051".to_string(),
            auth_token: "dev-token".to_string(),
            data_dir: String::new(),
            rate_limit_rps: 100,
            audit_buffer: 1024,
            tls_cert: None,
            tls_key: None,
        }
    }
}

fn env_or(key: &str, fallback: &str) -> String {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => value.trim().to_string(),
        _ => fallback.to_string(),
    }
}

fn env_parsed<T: std::str::FromStr + Copy>(key: &str, fallback: T) -> T {
    match std::env::var(key) {
        Ok(value) => value.trim().parse().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(PathBuf::from(trimmed))
        }
    })
}
