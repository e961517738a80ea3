//! # Toko POS Server
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          toko-server                                    │
//! │                                                                         │
//! │  Storefront / Counter ──► HTTP (8080) ──► routes ──► toko-db ──► SQLite │
//! │                                                          ▲              │
//! │                         auto-cancel scheduler (60 s) ────┘              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```bash
//! toko-server
//! toko-server --config /etc/toko/toko.toml
//! RUST_LOG=debug TOKO_PORT=9000 toko-server
//! ```

use std::env;
use std::path::PathBuf;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use toko_db::Database;
use toko_server::{router, AppState, Scheduler, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,toko=debug,sqlx=warn")),
        )
        .with_target(true)
        .init();

    info!("Starting Toko POS server...");

    let config = ServerConfig::load(config_path_arg())?;
    info!(
        bind = %config.server.bind_address(),
        db = %config.database.path.display(),
        scheduler = config.scheduler.enabled,
        "Configuration loaded"
    );

    let db = Database::new(config.db_config()).await?;

    let scheduler = if config.scheduler.enabled {
        Some(Scheduler::new(db.clone(), config.scheduler.interval()).start())
    } else {
        info!("Auto-cancel scheduler disabled");
        None
    };

    let app = router(AppState::new(db.clone()));
    let listener = tokio::net::TcpListener::bind(config.server.bind_address()).await?;
    info!(addr = %listener.local_addr()?, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = scheduler {
        handle.shutdown().await;
    }
    db.close().await;

    info!("Server shutdown complete");
    Ok(())
}

/// `--config <PATH>` / `-c <PATH>`, if given.
fn config_path_arg() -> Option<PathBuf> {
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" || arg == "-c" {
            return args.next().map(PathBuf::from);
        }
    }
    None
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
