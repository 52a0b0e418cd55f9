//! Application state shared across handlers
//!
//! Holds the store handles and the authentication service.

use std::sync::Arc;

use stockroom_auth::AuthService;
use stockroom_db::{InventoryStore, Stores};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Store handles
    pub stores: Stores,
    /// Authentication service
    pub auth: Arc<AuthService>,
}

impl AppState {
    /// Create a new application state
    pub fn new(stores: Stores, auth: Arc<AuthService>) -> Self {
        Self { stores, auth }
    }

    pub fn inventory(&self) -> &dyn InventoryStore {
        self.stores.inventory.as_ref()
    }
}
