//! # Tally POS Server
//!
//! ## Startup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. tracing (RUST_LOG, default info,tally=debug,sqlx=warn)             │
//! │  2. ServerConfig::load  (defaults → tally.toml → TALLY_* env)          │
//! │  3. Database::new       (pool, migrations, column backfill)            │
//! │  4. optional sample catalog                                            │
//! │  5. axum::serve until Ctrl+C / SIGTERM, then close the pool            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tally_db::{Database, DbConfig};
use tally_server::{build_router, cors_layer, AppState, ServerConfig};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tally=debug,sqlx=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!("Starting Tally POS server...");

    let config = ServerConfig::load(None)?;
    let addr = config.socket_addr()?;
    info!(
        %addr,
        database = %config.database_path.display(),
        cors_origin = %config.cors_origin,
        "Configuration loaded"
    );

    let db = Database::new(DbConfig::new(config.database_path.clone())).await?;
    info!("Database ready");

    if config.seed_sample_catalog {
        let inserted = db.products().seed_samples().await?;
        info!(inserted, "Sample catalog seeded");
    }

    let app = build_router(AppState::new(db.clone())).layer(cors_layer(&config.cors_origin)?);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
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
                error!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received, starting graceful shutdown...");
}
