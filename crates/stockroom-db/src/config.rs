//! Database configuration

use serde::{Deserialize, Serialize};

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub postgres_url: String,
    /// Redis connection URL
    pub redis_url: String,
    /// Maximum PostgreSQL connections
    pub pg_max_connections: u32,
    /// Minimum PostgreSQL connections
    pub pg_min_connections: u32,
    /// Connection acquire timeout in seconds
    pub pg_acquire_timeout_secs: u64,
    /// Run embedded migrations on startup
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            postgres_url: "postgresql://localhost/stockroom".to_string(),
            redis_url: "redis://localhost:6379".to_string(),
            pg_max_connections: 20,
            pg_min_connections: 2,
            pg_acquire_timeout_secs: 30,
            run_migrations: true,
        }
    }
}

impl DatabaseConfig {
    /// Overlay `DATABASE_URL`, `REDIS_URL`, `PG_MAX_CONNECTIONS`,
    /// `PG_MIN_CONNECTIONS`, `PG_ACQUIRE_TIMEOUT` and `RUN_MIGRATIONS`
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.postgres_url = url;
        }
        if let Ok(url) = std::env::var("REDIS_URL") {
            self.redis_url = url;
        }
        if let Some(max) = env_parse("PG_MAX_CONNECTIONS") {
            self.pg_max_connections = max;
        }
        if let Some(min) = env_parse("PG_MIN_CONNECTIONS") {
            self.pg_min_connections = min;
        }
        if let Some(secs) = env_parse("PG_ACQUIRE_TIMEOUT") {
            self.pg_acquire_timeout_secs = secs;
        }
        if let Some(run) = env_parse("RUN_MIGRATIONS") {
            self.run_migrations = run;
        }
    }

    /// Mask sensitive parts of the PostgreSQL URL for logging
    pub fn postgres_url_masked(&self) -> String {
        mask_url(&self.postgres_url)
    }

    /// Mask sensitive parts of the Redis URL for logging
    pub fn redis_url_masked(&self) -> String {
        mask_url(&self.redis_url)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}

fn mask_url(url: &str) -> String {
    let (Some(scheme_end), Some(at_pos)) = (url.find("://"), url.rfind('@')) else {
        return url.to_string();
    };
    if at_pos < scheme_end {
        return url.to_string();
    }

    let scheme = &url[..scheme_end + 3];
    let credentials = &url[scheme_end + 3..at_pos];
    let host = &url[at_pos..];

    match credentials.split_once(':') {
        Some((user, _)) => format!("{}{}:***{}", scheme, user, host),
        None => url.to_string(),
    }
}
