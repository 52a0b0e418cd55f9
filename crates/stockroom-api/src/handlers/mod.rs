//! API Handlers
//!
//! Request handlers for all API endpoints.
//! Each module handles a specific resource.

pub mod auth;
pub mod categories;
pub mod health;
pub mod products;
pub mod stocks;
pub mod warehouses;

pub use health::*;

use stockroom_db::DbError;

use crate::error::ApiError;

/// Store error mapper that names the resource when the row is missing
pub(crate) fn store_error(resource: &'static str) -> impl Fn(DbError) -> ApiError {
    move |err| match err {
        DbError::NotFound(_) => ApiError::NotFound(resource.to_string()),
        other => other.into(),
    }
}
