//! Stockroom API Server
//!
//! REST API server for Stockroom: account signup and signin, device-bound
//! refresh sessions, and role-gated inventory management.
//!
//! # Usage
//!
//! ```bash
//! # Start with config/default.toml and config/local.toml
//! stockroom-server
//!
//! # Start with an extra config file
//! stockroom-server --config /path/to/config.toml
//!
//! # Start with environment overrides
//! STOCKROOM__SERVER__PORT=8080 stockroom-server
//! ```

mod config;

use std::future::IntoFuture;
use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tokio::sync::Notify;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use stockroom_api::{create_router, AppState};
use stockroom_auth::AuthService;
use stockroom_db::{Database, Stores};

use crate::config::ServerConfig;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Stockroom API Server
#[derive(Parser, Debug)]
#[command(name = "stockroom-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to an extra configuration file (TOML, JSON, or YAML)
    #[arg(short, long, env = "STOCKROOM_CONFIG")]
    config: Option<String>,

    /// Host to bind to
    #[arg(long, env = "STOCKROOM_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "STOCKROOM_PORT")]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "STOCKROOM_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format (json, pretty)
    #[arg(long, env = "STOCKROOM_LOG_FORMAT")]
    log_format: Option<String>,

    /// PostgreSQL connection URL
    #[arg(long)]
    database_url: Option<String>,

    /// Redis connection URL
    #[arg(long)]
    redis_url: Option<String>,
}

impl Args {
    /// Apply command line overrides on top of the loaded configuration
    fn apply(self, config: &mut ServerConfig) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
        if let Some(url) = self.database_url {
            config.database.postgres_url = url;
        }
        if let Some(url) = self.redis_url {
            config.database.redis_url = url;
        }
    }
}

// =============================================================================
// Main Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut server_config = ServerConfig::load(args.config.as_deref())?;
    args.apply(&mut server_config);

    init_logging(&server_config.logging);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting Stockroom API Server"
    );

    if let Err(errors) = server_config.validate() {
        for error in &errors {
            tracing::error!(error = %error, "Invalid configuration");
        }
        anyhow::bail!("configuration has {} problem(s)", errors.len());
    }

    let stores = init_stores(&server_config).await?;

    tracing::info!("Initializing authentication service...");
    let auth = Arc::new(AuthService::new(&stores, server_config.auth.clone())?);

    let state = Arc::new(AppState::new(stores, auth));
    let app = create_router(state, server_config.api.clone());

    let addr = server_config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        host = %server_config.server.host,
        port = server_config.server.port,
        "Server listening"
    );

    let stopping = Arc::new(Notify::new());
    let notify = stopping.clone();
    let serve = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            notify.notify_one();
        })
        .into_future();
    tokio::pin!(serve);

    tokio::select! {
        result = &mut serve => result?,
        _ = stopping.notified() => {
            let timeout = server_config.server.shutdown_timeout();
            tracing::info!(timeout_secs = timeout.as_secs(), "Draining in-flight requests");
            match tokio::time::timeout(timeout, &mut serve).await {
                Ok(result) => result?,
                Err(_) => tracing::warn!("Shutdown timeout elapsed, dropping open connections"),
            }
        }
    }

    tracing::info!("Server shutdown complete");

    Ok(())
}

// =============================================================================
// Initialization Functions
// =============================================================================

/// Initialize tracing/logging
fn init_logging(config: &config::LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => {
            subscriber
                .with(fmt::layer().json().with_target(true))
                .init();
        }
        _ => {
            subscriber
                .with(fmt::layer().pretty().with_target(true))
                .init();
        }
    }
}

/// Connect both stores, migrate, and confirm they answer
async fn init_stores(config: &ServerConfig) -> anyhow::Result<Stores> {
    tracing::info!("Connecting to database...");

    let db = Database::connect(&config.database).await?;

    if config.database.run_migrations {
        db.migrate().await?;
    }

    let stores = db.stores();
    let health = stores.health_check().await;
    if !health.healthy {
        anyhow::bail!(
            "store health check failed (postgres: {}, redis: {})",
            health.postgres,
            health.redis
        );
    }

    tracing::info!(
        postgres = health.postgres,
        redis = health.redis,
        "Database health check passed"
    );

    Ok(stores)
}

// =============================================================================
// Graceful Shutdown
// =============================================================================

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
