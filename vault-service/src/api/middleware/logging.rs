use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use log::{debug, error, warn};
use std::net::SocketAddr;
use std::time::Instant;

/// Logs every call with method, path, status and duration. Server errors
/// and client rejections get their own levels so they stand out.
pub async fn logging_middleware(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let client_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_default();
    let start = Instant::now();

    let response = next.run(req).await;

    let status = response.status();
    let duration_ms = start.elapsed().as_millis();

    if status.is_server_error() {
        error!("request failed method={method} path={path} status={} duration_ms={duration_ms} client_ip={client_ip}", status.as_u16());
    } else if status.is_client_error() {
        warn!("request rejected method={method} path={path} status={} duration_ms={duration_ms} client_ip={client_ip}", status.as_u16());
    } else {
        debug!("request method={method} path={path} status={} duration_ms={duration_ms} client_ip={client_ip}", status.as_u16());
    }

    response
}
