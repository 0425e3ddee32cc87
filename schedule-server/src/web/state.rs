//! Application state for the web layer.

use crate::store::Database;

/// Shared application state.
///
/// Cloned into every handler; the database handle shares one pool.
#[derive(Clone)]
pub struct AppState {
    /// Schedule database
    pub db: Database,
}

impl AppState {
    /// Create a new app state.
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}
