//! Optional TLS termination for the listener.
//!
//! PEM certificate chain and private key are loaded once at startup;
//! each accepted connection is handshaken and served over hyper http1
//! with upgrade support so the WebSocket streams keep working.

use axum::extract::ConnectInfo;
use axum::Router;
use hyper::body::Incoming;
use hyper::Request;
use hyper_util::rt::TokioIo;
use log::{debug, info};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::TlsAcceptor;
use tower::ServiceExt;
use vault_core::foundation::{Result, VaultError};

pub fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<Arc<ServerConfig>> {
    let cert_file =
        File::open(cert_path).map_err(|err| VaultError::ConfigError(format!("open tls certificate {}: {err}", cert_path.display())))?;
    let certs = rustls_pemfile::certs(&mut BufReader::new(cert_file))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|err| VaultError::ConfigError(format!("parse tls certificate: {err}")))?;
    if certs.is_empty() {
        return Err(VaultError::ConfigError(format!("no certificates in {}", cert_path.display())));
    }

    let key_file = File::open(key_path).map_err(|err| VaultError::ConfigError(format!("open tls key {}: {err}", key_path.display())))?;
    let key = rustls_pemfile::private_key(&mut BufReader::new(key_file))
        .map_err(|err| VaultError::ConfigError(format!("parse tls key: {err}")))?
        .ok_or_else(|| VaultError::ConfigError(format!("no private key in {}", key_path.display())))?;

    let config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|err| VaultError::ConfigError(format!("tls config: {err}")))?;
    Ok(Arc::new(config))
}

/// Accept loop serving TLS connections until `shutdown` fires. In-flight
/// connections run in their own tasks and are bounded by the caller's
/// shutdown timeout.
pub async fn serve_tls(
    listener: TcpListener,
    config: Arc<ServerConfig>,
    app: Router,
    mut shutdown: oneshot::Receiver<()>,
) -> Result<()> {
    let acceptor = TlsAcceptor::from(config);
    info!("tls listener ready");

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = accepted?;
                let acceptor = acceptor.clone();
                let app = app.clone();
                tokio::spawn(async move {
                    let tls_stream = match acceptor.accept(stream).await {
                        Ok(tls_stream) => tls_stream,
                        Err(err) => {
                            debug!("tls handshake failed peer={peer} error={err}");
                            return;
                        }
                    };

                    let service = hyper::service::service_fn(move |mut req: Request<Incoming>| {
                        req.extensions_mut().insert(ConnectInfo(peer));
                        app.clone().oneshot(req)
                    });

                    if let Err(err) = hyper::server::conn::http1::Builder::new()
                        .serve_connection(TokioIo::new(tls_stream), service)
                        .with_upgrades()
                        .await
                    {
                        debug!("tls connection ended peer={peer} error={err}");
                    }
                });
            }
            _ = &mut shutdown => {
                info!("tls listener stopping");
                return Ok(());
            }
        }
    }
}
