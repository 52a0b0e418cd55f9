//! Redis-backed session store: the issued-token ledger and rate counters

use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{redis::AsyncCommands, Pool as RedisPool};

use crate::store::SessionStore;
use crate::DbResult;

/// Cache key prefixes for organization
pub mod keys {
    /// Rate-limit counters. Ledger entries use the bare token as key, so
    /// counters must never share that keyspace.
    pub const RATE_LIMIT: &str = "rate_limit:";
}

#[derive(Clone)]
pub struct CacheManager {
    pool: RedisPool,
}

impl CacheManager {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for CacheManager {
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> DbResult<()> {
        let mut conn = self.pool.get().await?;
        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1)).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> DbResult<Option<String>> {
        let mut conn = self.pool.get().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn delete(&self, key: &str) -> DbResult<bool> {
        let mut conn = self.pool.get().await?;
        let deleted: i64 = conn.del(key).await?;
        Ok(deleted > 0)
    }

    async fn incr(&self, key: &str) -> DbResult<i64> {
        let mut conn = self.pool.get().await?;
        let count: i64 = conn.incr(key, 1).await?;
        Ok(count)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> DbResult<bool> {
        let mut conn = self.pool.get().await?;
        let applied: bool = conn.expire(key, ttl.as_secs().max(1) as i64).await?;
        Ok(applied)
    }

    async fn ping(&self) -> DbResult<()> {
        let mut conn = self.pool.get().await?;
        let _: String = deadpool_redis::redis::cmd("PING")
            .query_async(&mut *conn)
            .await?;
        Ok(())
    }
}
