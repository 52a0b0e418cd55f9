//! Authentication configuration
//!
//! Centralized configuration for token issuance, password hashing and rate
//! limiting, with defaults matching the service's reference behaviour.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main authentication configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// JWT configuration
    pub jwt: JwtConfig,
    /// Password hashing configuration
    pub password: PasswordConfig,
    /// Rate limiting configuration
    pub rate_limit: RateLimitConfig,
}

/// JWT token configuration. Access and refresh tokens are signed with
/// independent secrets.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    /// HMAC secret for access tokens (at least 256 bits)
    pub access_secret: String,
    /// HMAC secret for refresh tokens (at least 256 bits)
    pub refresh_secret: String,
    /// Access token lifetime
    #[serde(with = "humantime_serde")]
    pub access_token_lifetime: Duration,
    /// Refresh token lifetime, also used as the refresh session expiry
    #[serde(with = "humantime_serde")]
    pub refresh_token_lifetime: Duration,
    /// Token issuer claim
    pub issuer: String,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("access_secret", &"[REDACTED]")
            .field("refresh_secret", &"[REDACTED]")
            .field("access_token_lifetime", &self.access_token_lifetime)
            .field("refresh_token_lifetime", &self.refresh_token_lifetime)
            .field("issuer", &self.issuer)
            .finish()
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            access_secret: String::new(), // Must be set in production
            refresh_secret: String::new(), // Must be set in production
            access_token_lifetime: Duration::from_secs(7 * 24 * 60 * 60), // 7 days
            refresh_token_lifetime: Duration::from_secs(30 * 24 * 60 * 60), // 30 days
            issuer: "stockroom".to_string(),
        }
    }
}

/// Password hashing configuration (Argon2id)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordConfig {
    /// Memory cost in KiB (OWASP recommends 19456 KiB = 19 MiB minimum)
    pub memory_cost: u32,
    /// Time cost (iterations) - OWASP recommends 2 minimum
    pub time_cost: u32,
    /// Parallelism factor
    pub parallelism: u32,
    /// Output hash length in bytes
    pub hash_length: u32,
    /// Minimum password length
    pub min_password_length: usize,
    /// Maximum password length (to prevent DoS)
    pub max_password_length: usize,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_cost: 19456, // 19 MiB
            time_cost: 2,
            parallelism: 1,
            hash_length: 32,
            min_password_length: 8,
            max_password_length: 128,
        }
    }
}

/// Per-token request rate limiting
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting
    pub enabled: bool,
    /// Requests allowed per window for one bearer token
    pub max_requests: u32,
    /// Fixed window length
    #[serde(with = "humantime_serde")]
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 1,
            window: Duration::from_secs(10),
        }
    }
}

impl AuthConfig {
    /// Overlay the conventional environment variables (`JWT_ACCESS_SECRET`,
    /// `JWT_REFRESH_SECRET`, `JWT_ISSUER`, `RATE_LIMIT_MAX_REQUESTS`,
    /// `RATE_LIMIT_WINDOW`) on this configuration.
    pub fn apply_env(&mut self) {
        if let Ok(secret) = std::env::var("JWT_ACCESS_SECRET") {
            self.jwt.access_secret = secret;
        }
        if let Ok(secret) = std::env::var("JWT_REFRESH_SECRET") {
            self.jwt.refresh_secret = secret;
        }
        if let Ok(issuer) = std::env::var("JWT_ISSUER") {
            self.jwt.issuer = issuer;
        }
        if let Some(max) = std::env::var("RATE_LIMIT_MAX_REQUESTS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.rate_limit.max_requests = max;
        }
        if let Some(window) = std::env::var("RATE_LIMIT_WINDOW")
            .ok()
            .and_then(|v| humantime_serde::re::humantime::parse_duration(&v).ok())
        {
            self.rate_limit.window = window;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        for (name, secret) in [
            ("access", &self.jwt.access_secret),
            ("refresh", &self.jwt.refresh_secret),
        ] {
            if secret.is_empty() {
                errors.push(format!("JWT {} secret must be set", name));
            } else if secret.len() < 32 {
                errors.push(format!("JWT {} secret should be at least 256 bits (32 bytes)", name));
            }
        }
        if !self.jwt.access_secret.is_empty() && self.jwt.access_secret == self.jwt.refresh_secret {
            errors.push("JWT access and refresh secrets must differ".to_string());
        }
        if self.jwt.access_token_lifetime.is_zero() || self.jwt.refresh_token_lifetime.is_zero() {
            errors.push("Token lifetimes must be non-zero".to_string());
        }

        if self.password.memory_cost < 19456 {
            errors.push("Argon2 memory cost should be at least 19456 KiB (OWASP recommendation)".to_string());
        }
        if self.password.time_cost < 2 {
            errors.push("Argon2 time cost should be at least 2 (OWASP recommendation)".to_string());
        }

        if self.rate_limit.enabled && (self.rate_limit.max_requests == 0 || self.rate_limit.window.is_zero()) {
            errors.push("Rate limit needs a positive request budget and window".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
