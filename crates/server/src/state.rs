//! Application state shared across handlers.

use std::sync::Arc;

use crate::db::Database;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    db: Database,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `db` - Handle to the product and cart collections
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self {
            inner: Arc::new(AppStateInner { db }),
        }
    }

    /// Get a reference to the database.
    #[must_use]
    pub fn db(&self) -> &Database {
        &self.inner.db
    }
}
