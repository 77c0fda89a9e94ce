use crate::api::state::ApiState;
use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use log::{debug, error};
use std::sync::{Arc, Mutex};
use std::time::Instant;

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Per-process token bucket: starts full at the configured rate, refills
/// at rate/s, caps at the rate.
#[derive(Debug)]
pub struct TokenBucket {
    state: Mutex<BucketState>,
    rate: f64,
    max: f64,
}

impl TokenBucket {
    pub fn new(rps: u32) -> Self {
        let max = f64::from(rps.max(1));
        Self { state: Mutex::new(BucketState { tokens: max, last_refill: Instant::now() }), rate: max, max }
    }

    pub fn allow(&self) -> bool {
        match self.state.lock() {
            Ok(mut state) => {
                let now = Instant::now();
                let elapsed = now.duration_since(state.last_refill).as_secs_f64();
                state.last_refill = now;

                state.tokens = (state.tokens + elapsed * self.rate).min(self.max);
                if state.tokens < 1.0 {
                    return false;
                }
                state.tokens -= 1.0;
                true
            }
            Err(_) => {
                error!("rate limiter lock poisoned, denying request");
                false
            }
        }
    }
}

pub async fn unary_rate_limit(State(state): State<Arc<ApiState>>, req: Request<Body>, next: Next) -> Response {
    if !state.unary_limiter.allow() {
        debug!("rate limit exceeded scope=unary");
        return (StatusCode::TOO_MANY_REQUESTS, "rate limit exceeded").into_response();
    }
    next.run(req).await
}

pub async fn stream_rate_limit(State(state): State<Arc<ApiState>>, req: Request<Body>, next: Next) -> Response {
    if !state.stream_limiter.allow() {
        debug!("rate limit exceeded scope=stream");
        return (StatusCode::TOO_MANY_REQUESTS, "rate limit exceeded").into_response();
    }
    next.run(req).await
}
