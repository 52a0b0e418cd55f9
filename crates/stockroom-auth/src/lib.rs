//! Stockroom Authentication Layer
//!
//! Credential checks, token issuance and request authorization for the
//! Stockroom service:
//!
//! - **Token Issuer**: HS256 access and refresh tokens with independent
//!   secrets and lifetimes, backed by a revocable ledger in Redis
//! - **Authentication Engine**: signup, signin, password change, refresh
//!   rotation, role change and signout
//! - **Password Security**: Argon2id hashing (OWASP recommended)
//! - **Rate Limiting**: fixed-window budget per bearer token
//! - **Role Policy**: method/path/role decision for inventory routes
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Request Flow                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Request → AuthLayer → (role policy) → Handler               │
//! │               │                                              │
//! │     bearer → TokenIssuer::verify → RateLimiter → claims      │
//! │               │              │                               │
//! │               ▼              ▼                               │
//! │          SessionStore (ledger, counters)                     │
//! │                                                              │
//! │  Auth routes → AuthEngine → CredentialStore + TokenIssuer    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod policy;
pub mod rate_limit;
pub mod session;
pub mod types;

pub use config::AuthConfig;
pub use engine::{AuthEngine, SignupInput};
pub use error::{AuthError, AuthResult};
pub use jwt::TokenIssuer;
pub use middleware::{AuthLayer, AuthMiddleware};
pub use password::PasswordService;
pub use policy::authorize;
pub use rate_limit::RateLimiter;
pub use types::*;

use stockroom_db::Stores;

/// Main authentication service combining the engine and the request gate
#[derive(Clone)]
pub struct AuthService {
    pub engine: AuthEngine,
    pub rate_limiter: RateLimiter,
    config: AuthConfig,
}

impl AuthService {
    /// Create a new auth service over the given stores
    pub fn new(stores: &Stores, config: AuthConfig) -> AuthResult<Self> {
        let engine = AuthEngine::new(&config, stores.credentials.clone(), stores.sessions.clone())?;
        let rate_limiter = RateLimiter::new(stores.sessions.clone(), config.rate_limit.clone());

        Ok(Self {
            engine,
            rate_limiter,
            config,
        })
    }

    /// Get the config reference
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Gate for routes that only need an authenticated caller
    pub fn layer(&self) -> AuthLayer {
        AuthLayer::new(self.engine.issuer().clone(), self.rate_limiter.clone())
    }

    /// Gate plus role policy, for inventory routes
    pub fn policy_layer(&self) -> AuthLayer {
        self.layer().with_policy()
    }
}
