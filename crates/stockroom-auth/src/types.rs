//! Core authentication types
//!
//! Shared types used across all authentication components.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::AuthError;

// =============================================================================
// Roles
// =============================================================================

/// User roles. Closed set; anything else is rejected at the boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full control over inventory, including stock levels and warehouses
    SuperAdmin,
    /// Manages the product catalogue
    Admin,
    /// Read-only access
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Admin => "admin",
            Self::User => "user",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super_admin" => Ok(Self::SuperAdmin),
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            other => Err(AuthError::Validation(format!("unknown role: {}", other))),
        }
    }
}

// =============================================================================
// Token Types
// =============================================================================

/// Token class. Each class has its own secret and lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenClass {
    Access,
    Refresh,
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Issuer
    pub iss: String,
    /// User email
    pub email: String,
    /// User role
    pub role: Role,
    /// Token class
    pub class: TokenClass,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// JWT ID, makes two tokens minted in the same second distinct
    pub jti: String,
}

impl TokenClaims {
    /// Parse the subject into a user ID
    pub fn user_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub).map_err(|_| AuthError::InvalidToken)
    }
}

/// Access + refresh token pair returned by signin and refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

// =============================================================================
// Request Context
// =============================================================================

/// Authenticated user attached to request extensions by the gate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    /// Bearer token the request was authenticated with
    #[serde(skip_serializing)]
    pub token: String,
}

impl AuthenticatedUser {
    /// Build from verified claims; fails if the subject is not a UUID.
    pub fn from_claims(claims: TokenClaims, token: String) -> Result<Self, AuthError> {
        Ok(Self {
            user_id: claims.user_id()?,
            email: claims.email,
            role: claims.role,
            token,
        })
    }
}
