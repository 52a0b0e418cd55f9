//! Rate Limiting Service
//!
//! Fixed-window counter per bearer token, kept in the session store so every
//! server instance shares the same budget. The first increment in a window
//! sets the expiry; the counter key is namespaced so it never collides with
//! the ledger entry for the same token.
//!
//! Store failures deny the request.

use std::sync::Arc;

use stockroom_db::cache::keys;
use stockroom_db::SessionStore;

use crate::config::RateLimitConfig;
use crate::error::{AuthError, AuthResult};

/// Rate limiter service
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn SessionStore>,
    config: RateLimitConfig,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(store: Arc<dyn SessionStore>, config: RateLimitConfig) -> Self {
        Self { store, config }
    }

    /// Count one request against `token` and decide whether it may proceed.
    pub async fn check(&self, token: &str) -> AuthResult<()> {
        if !self.config.enabled {
            return Ok(());
        }

        let key = format!("{}{}", keys::RATE_LIMIT, token);

        let count = match self.store.incr(&key).await {
            Ok(count) => count,
            Err(e) => {
                tracing::error!(error = %e, "Rate limit counter unavailable, denying request");
                return Err(AuthError::rate_limited(self.config.window));
            }
        };

        if count == 1 {
            if let Err(e) = self.store.expire(&key, self.config.window).await {
                tracing::error!(error = %e, "Failed to set rate limit window, denying request");
                // A counter without expiry would block the token for good.
                if let Err(e) = self.store.delete(&key).await {
                    tracing::error!(error = %e, "Failed to clear rate limit counter without expiry");
                }
                return Err(AuthError::rate_limited(self.config.window));
            }
        }

        if count > i64::from(self.config.max_requests) {
            tracing::debug!(count, max = self.config.max_requests, "Rate limit exceeded");
            return Err(AuthError::rate_limited(self.config.window));
        }

        Ok(())
    }
}
