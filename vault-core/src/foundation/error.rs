use std::io;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    KeyNotFound,
    KeyAlreadyExists,
    KeyNotActive,
    InvalidAlgorithm,
    InvalidDerivedLength,
    InvalidCiphertext,
    CryptoError,
    StorageError,
    SerializationError,
    ConfigError,
    Message,
}

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("key already exists: {0}")]
    KeyAlreadyExists(String),

    #[error("key {key_id} is not active: status={status}")]
    KeyNotActive { key_id: String, status: String },

    #[error("unsupported algorithm: {0}")]
    InvalidAlgorithm(String),

    #[error("invalid derived key length: {length} (must be 1-64)")]
    InvalidDerivedLength { length: usize },

    #[error("ciphertext rejected: {0}")]
    InvalidCiphertext(String),

    #[error("crypto error during {operation}: {details}")]
    CryptoError { operation: String, details: String },

    #[error("storage error during {operation}: {details}")]
    StorageError { operation: String, details: String },

    #[error("{format} serialization error: {details}")]
    SerializationError { format: String, details: String },

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("{0}")]
    Message(String),
}

pub type Result<T> = std::result::Result<T, VaultError>;

impl VaultError {
    pub fn code(&self) -> ErrorCode {
        match self {
            VaultError::KeyNotFound(_) => ErrorCode::KeyNotFound,
            VaultError::KeyAlreadyExists(_) => ErrorCode::KeyAlreadyExists,
            VaultError::KeyNotActive { .. } => ErrorCode::KeyNotActive,
            VaultError::InvalidAlgorithm(_) => ErrorCode::InvalidAlgorithm,
            VaultError::InvalidDerivedLength { .. } => ErrorCode::InvalidDerivedLength,
            VaultError::InvalidCiphertext(_) => ErrorCode::InvalidCiphertext,
            VaultError::CryptoError { .. } => ErrorCode::CryptoError,
            VaultError::StorageError { .. } => ErrorCode::StorageError,
            VaultError::SerializationError { .. } => ErrorCode::SerializationError,
            VaultError::ConfigError(_) => ErrorCode::ConfigError,
            VaultError::Message(_) => ErrorCode::Message,
        }
    }

    pub fn key_not_found(key_id: impl Into<String>) -> Self {
        VaultError::KeyNotFound(key_id.into())
    }

    pub fn key_not_active(key_id: impl Into<String>, status: impl Into<String>) -> Self {
        VaultError::KeyNotActive { key_id: key_id.into(), status: status.into() }
    }

    pub fn crypto(operation: impl Into<String>, details: impl ToString) -> Self {
        VaultError::CryptoError { operation: operation.into(), details: details.to_string() }
    }

    pub fn storage(operation: impl Into<String>, details: impl ToString) -> Self {
        VaultError::StorageError { operation: operation.into(), details: details.to_string() }
    }
}

impl From<io::Error> for VaultError {
    fn from(err: io::Error) -> Self {
        VaultError::StorageError { operation: "io".to_string(), details: err.to_string() }
    }
}

impl From<serde_json::Error> for VaultError {
    fn from(err: serde_json::Error) -> Self {
        VaultError::SerializationError { format: "json".to_string(), details: err.to_string() }
    }
}

// NOTE: Avoid adding generic "stringly" error conversions here.
// Use structured `VaultError` variants at the call site to preserve context.
