use crate::api::middleware::rate_limit::TokenBucket;
use std::sync::Arc;
use vault_core::application::Vault;

/// Shared state behind every handler: the facade plus the shell's own
/// enforcement machinery. Unary and streaming calls draw from separate
/// token buckets.
pub struct ApiState {
    pub vault: Arc<Vault>,
    pub auth_token: String,
    pub unary_limiter: TokenBucket,
    pub stream_limiter: TokenBucket,
}

impl ApiState {
    pub fn new(vault: Arc<Vault>, auth_token: String, rate_limit_rps: u32) -> Self {
        Self {
            vault,
            auth_token,
            unary_limiter: TokenBucket::new(rate_limit_rps),
            stream_limiter: TokenBucket::new(rate_limit_rps),
        }
    }
}
