use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use vault_core::application::Vault;
use vault_core::infrastructure::audit::AuditLogger;
use vault_core::infrastructure::config::VaultConfig;
use vault_core::infrastructure::hsm::SoftwareHsm;
use vault_core::infrastructure::keystore::{KeyStore, MemoryStore, PersistentStore};
use vault_service::api::{build_router, ApiState};
use vault_service::tls;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = VaultConfig::from_env();
    init_logging();
    info!("vault-server starting listen_addr={}", cfg.listen_addr);

    let audit = Arc::new(AuditLogger::new(cfg.audit_buffer, Some(Box::new(std::io::stdout()))));

    let store: Arc<dyn KeyStore> = match cfg.store_path() {
        Some(path) => {
            info!("using persistent store path={}", path.display());
            Arc::new(PersistentStore::open(path)?)
        }
        None => {
            info!("using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let vault = Arc::new(Vault::new(store, Arc::new(SoftwareHsm::new()), Arc::clone(&audit)));
    let state = Arc::new(ApiState::new(vault, cfg.auth_token.clone(), cfg.rate_limit_rps));
    let app = build_router(state);

    let addr: SocketAddr = cfg.listen_addr.parse().map_err(|err| format!("invalid listen address: {err}"))?;
    let listener = TcpListener::bind(addr).await?;
    info!("server listening addr={addr}");

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let mut server = match (cfg.tls_cert.as_deref(), cfg.tls_key.as_deref()) {
        (Some(cert), Some(key)) => {
            let tls_config = tls::load_tls_config(cert, key)?;
            info!("tls enabled cert={}", cert.display());
            tokio::spawn(async move {
                if let Err(err) = tls::serve_tls(listener, tls_config, app, shutdown_rx).await {
                    error!("tls server error={err}");
                }
            })
        }
        _ => tokio::spawn(async move {
            let serve = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                });
            if let Err(err) = serve.await {
                error!("server error={err}");
            }
        }),
    };

    shutdown_signal().await;
    info!("shutting down");
    let _ = shutdown_tx.send(());

    // Bounded drain: in-flight requests get ten seconds, then we stop hard.
    match tokio::time::timeout(Duration::from_secs(10), &mut server).await {
        Ok(_) => info!("shutdown complete"),
        Err(_) => {
            warn!("graceful shutdown timed out, forcing stop");
            server.abort();
        }
    }

    // Drains the audit queue and flushes pending writes before exit.
    audit.close().await;
    Ok(())
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(true).try_init();
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(terminate) => terminate,
        Err(_) => {
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = terminate.recv() => {}
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
