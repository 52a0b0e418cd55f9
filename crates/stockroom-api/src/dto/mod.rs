//! Data Transfer Objects
//!
//! Request and response structures for the API. Every response body is an
//! [`Envelope`] around one of these.

pub mod auth;
pub mod common;
pub mod inventory;

pub use auth::*;
pub use common::*;
pub use inventory::*;
