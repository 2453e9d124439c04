mod config;
mod db;
mod errors;
mod notify;
mod pages;
mod records;
mod resumes;
mod routes;
mod state;
mod storage;

#[cfg(test)]
mod testing;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::notify::SmtpNotifier;
use crate::records::PgRecordStore;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::{S3ObjectStore, StorageGateway};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume gate v{}", env!("CARGO_PKG_VERSION"));

    // Object storage
    let s3 = S3ObjectStore::from_config(&config).await;
    let storage = StorageGateway::new(Arc::new(s3), config.max_upload_bytes());
    info!("S3 client initialized (bucket: {})", config.s3_bucket);

    // Record store
    let pool = create_pool(&config.database_url, config.request_timeout()).await?;
    let records = PgRecordStore::new(pool, &config.record_table)?;
    records.ensure_schema().await?;

    // Email relay
    let notifier = SmtpNotifier::from_config(&config)?;
    info!(
        "SMTP notifier initialized ({}:{})",
        config.smtp_host, config.smtp_port
    );

    if config.admin_token.is_none() {
        warn!("ADMIN_TOKEN is not set; /files and /viewers will refuse every request");
    }

    let state = AppState {
        storage,
        records: Arc::new(records),
        notifier: Arc::new(notifier),
        config: config.clone(),
    };

    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(config.request_timeout())),
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
