mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use aronx_api::AppStateInner;
use aronx_db::Database;
use aronx_panel::HttpPanel;
use aronx_provision::Provisioner;

use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aronx=debug,tower_http=debug".into()),
        )
        .init();

    let config = ServerConfig::from_env()?;
    if config.admin_token.is_none() {
        warn!("ADMIN_TOKEN is empty, admin routes are disabled");
    }

    let db = Arc::new(Database::open(&config.db_path)?);
    let panel = HttpPanel::new(config.panel.clone());
    let provisioner = Provisioner::new(db, panel, config.link.clone())?;

    let state = Arc::new(AppStateInner {
        provisioner,
        admin_token: config.admin_token.clone(),
    });

    let app = aronx_api::router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("AronxVPN backend listening on {}", addr);
    info!(
        "Panel {} inbound {} (timeout {}s)",
        config.panel.origin(),
        config.panel.inbound_id,
        config.panel.timeout_secs
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("SIGTERM handler unavailable: {}", e);
                ctrl_c.await.ok();
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
