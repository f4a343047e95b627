//! lingo-server: HTTP service for the Lingo language-learning platform
//!
//! Configuration priority: CLI args (and their `LINGO_*` env fallbacks) >
//! environment > TOML config file > compiled defaults.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use lingo_common::config::{load_toml_config, CliOverrides, Settings, TomlConfig};
use lingo_common::db::init::init_database;
use lingo_server::db::sessions;
use lingo_server::{build_router, AppState};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "lingo_server=info,tower_http=info";

/// Command-line arguments for lingo-server
#[derive(Parser, Debug)]
#[command(name = "lingo-server")]
#[command(about = "Language-learning course and progress service")]
#[command(version)]
struct Args {
    /// Optional TOML config file
    #[arg(short, long, env = "LINGO_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "LINGO_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "LINGO_PORT")]
    port: Option<u16>,

    /// SQLite database file (created if missing)
    #[arg(short, long, env = "LINGO_DATABASE")]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Read the config file before tracing so its log level can apply;
    // the failure itself is reported once logging is up
    let (toml_config, config_error) = match args.config.as_deref() {
        Some(path) => match load_toml_config(path) {
            Ok(config) => (config, None),
            Err(e) => (TomlConfig::default(), Some((path.to_path_buf(), e))),
        },
        None => (TomlConfig::default(), None),
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        toml_config
            .logging
            .level
            .clone()
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
            .into()
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Build identification first, before any database work
    info!(
        "Starting Lingo server (lingo-server) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    if let Some((path, e)) = config_error {
        warn!("Config file {} not loaded ({}); using defaults", path.display(), e);
    }

    let settings = Settings::resolve(
        CliOverrides {
            host: args.host,
            port: args.port,
            database_path: args.database,
        },
        toml_config,
    )
    .context("Invalid configuration")?;

    info!("Database path: {}", settings.database_path.display());
    let pool = match init_database(&settings.database_path).await {
        Ok(pool) => {
            info!("✓ Database ready");
            pool
        }
        Err(e) => {
            error!("Failed to open database: {}", e);
            return Err(e.into());
        }
    };

    let purged = sessions::purge_expired(&pool)
        .await
        .context("Failed to purge expired sessions")?;
    if purged > 0 {
        info!("Removed {} expired sessions", purged);
    }

    info!(
        "Change feed: poll every {} ms, keep-alive every {} ms",
        settings.poll_interval_ms, settings.keepalive_interval_ms
    );

    let state = AppState::from_settings(pool, &settings);
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", settings.host, settings.port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("lingo-server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
