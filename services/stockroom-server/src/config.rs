//! Server Configuration
//!
//! Layered configuration for the Stockroom server: `config/default`,
//! `config/local`, an optional explicit file, `STOCKROOM__*` environment
//! variables, then the conventional `DATABASE_URL`/`JWT_*` variables.
//! CLI arguments are applied on top in `main`.

use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

use stockroom_api::ApiConfig;
use stockroom_auth::AuthConfig;
use stockroom_db::DatabaseConfig;

/// Server configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server binding configuration
    pub server: ServerSettings,

    /// PostgreSQL and Redis connections
    pub database: DatabaseConfig,

    /// Tokens, password hashing and rate limiting
    pub auth: AuthConfig,

    /// HTTP surface configuration
    pub api: ApiConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server binding settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Grace period for in-flight requests after a shutdown signal
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            shutdown_timeout_secs: 30,
        }
    }
}

impl ServerSettings {
    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .map_err(|e| anyhow::anyhow!("invalid bind address {}: {}", addr, e))
    }

    /// Get the shutdown timeout duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

impl ServerConfig {
    /// Load configuration from files and the environment
    pub fn load(config_path: Option<&str>) -> anyhow::Result<Self> {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false));

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        }

        // STOCKROOM__SERVER__PORT=8080, STOCKROOM__AUTH__JWT__ACCESS_SECRET=...
        builder = builder.add_source(
            config::Environment::with_prefix("STOCKROOM")
                .separator("__")
                .try_parsing(true),
        );

        let mut server_config: ServerConfig = builder.build()?.try_deserialize()?;
        server_config.database.apply_env();
        server_config.auth.apply_env();
        Ok(server_config)
    }

    /// Configuration problems that must stop startup
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = match self.auth.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => errors,
        };

        if self.database.postgres_url.is_empty() {
            errors.push("Database postgres_url must be set".to_string());
        }
        if self.database.redis_url.is_empty() {
            errors.push("Database redis_url must be set".to_string());
        }
        if !matches!(self.logging.format.as_str(), "json" | "pretty") {
            errors.push(format!("Unknown log format: {}", self.logging.format));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
