mod handlers;
mod middleware;
mod router;
mod state;
mod streams;

pub use middleware::rate_limit::TokenBucket;
pub use router::build_router;
pub use state::ApiState;
