//! Stockroom Database Layer
//!
//! Persistence for the Stockroom service using PostgreSQL for durable data
//! and Redis for the issued-token ledger and rate counters.
//!
//! # Architecture
//!
//! - **PostgreSQL**: users, credentials, roles, refresh sessions, inventory
//! - **Redis**: token ledger (`token -> user_id` with TTL), rate-limit counters
//!
//! # Store Traits
//!
//! Consumers depend on [`CredentialStore`], [`SessionStore`] and
//! [`InventoryStore`] rather than on concrete pools, so the auth engine and
//! router can run against the in-memory stores in `mock` (feature `mock`).

pub mod cache;
pub mod config;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod models;
pub mod repos;
pub mod store;

use std::sync::Arc;
use std::time::Duration;

use deadpool_redis::{Config as RedisConfig, Pool as RedisPool, Runtime};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

pub use cache::CacheManager;
pub use config::DatabaseConfig;
pub use error::{DbError, DbResult};
pub use models::*;
pub use repos::*;
pub use store::{CredentialStore, InventoryStore, SessionStore};

/// Database connection pools
#[derive(Clone)]
pub struct Database {
    /// PostgreSQL connection pool
    pub pg: PgPool,
    /// Redis connection pool
    pub redis: RedisPool,
}

impl Database {
    /// Connect to PostgreSQL and Redis
    pub async fn connect(config: &DatabaseConfig) -> DbResult<Self> {
        info!(url = %config.postgres_url_masked(), "Connecting to PostgreSQL");

        let pg = PgPoolOptions::new()
            .max_connections(config.pg_max_connections)
            .min_connections(config.pg_min_connections)
            .acquire_timeout(Duration::from_secs(config.pg_acquire_timeout_secs))
            .connect(&config.postgres_url)
            .await
            .map_err(|e| DbError::Connection(format!("PostgreSQL: {}", e)))?;

        info!(url = %config.redis_url_masked(), "Connecting to Redis");

        let redis = RedisConfig::from_url(&config.redis_url)
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| DbError::Connection(format!("Redis: {}", e)))?;

        let db = Self { pg, redis };
        db.cache()
            .ping()
            .await
            .map_err(|e| DbError::Connection(format!("Redis ping: {}", e)))?;

        info!("Connected to PostgreSQL and Redis");
        Ok(db)
    }

    /// Run database migrations
    pub async fn migrate(&self) -> DbResult<()> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pg)
            .await
            .map_err(|e| DbError::Migration(e.to_string()))?;
        info!("Migrations complete");
        Ok(())
    }

    pub fn user_repo(&self) -> UserRepo {
        UserRepo::new(self.pg.clone())
    }

    pub fn inventory_repo(&self) -> InventoryRepo {
        InventoryRepo::new(self.pg.clone())
    }

    pub fn cache(&self) -> CacheManager {
        CacheManager::new(self.redis.clone())
    }

    /// Trait-object handles for the service layers
    pub fn stores(&self) -> Stores {
        Stores {
            credentials: Arc::new(self.user_repo()),
            sessions: Arc::new(self.cache()),
            inventory: Arc::new(self.inventory_repo()),
        }
    }
}

/// Shared store handles, injected into the auth engine and API state.
#[derive(Clone)]
pub struct Stores {
    pub credentials: Arc<dyn CredentialStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub inventory: Arc<dyn InventoryStore>,
}

impl Stores {
    /// Health check for both backing stores
    pub async fn health_check(&self) -> HealthStatus {
        let postgres = self.credentials.ping().await.is_ok();
        let redis = self.sessions.ping().await.is_ok();

        HealthStatus {
            postgres,
            redis,
            healthy: postgres && redis,
        }
    }
}

/// Health status of database connections
#[derive(Debug, Clone, serde::Serialize)]
pub struct HealthStatus {
    pub postgres: bool,
    pub redis: bool,
    pub healthy: bool,
}
