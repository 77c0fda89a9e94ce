use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use log::warn;
use subtle::ConstantTimeEq;

/// Validates the bearer credential against the configured token.
/// Comparison is constant-time; absence and mismatch are both rejections.
pub fn authorize(headers: &HeaderMap, expected: &str) -> Result<(), String> {
    let Some(value) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) else {
        warn!("auth failed: missing authorization header");
        return Err("missing authorization header".to_string());
    };

    let token = value.strip_prefix("Bearer ").unwrap_or(value);
    if constant_time_eq(token, expected) {
        Ok(())
    } else {
        warn!("auth failed: invalid token");
        Err("invalid token".to_string())
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
