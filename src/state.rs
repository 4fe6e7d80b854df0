//! Application state for Axum web framework.
//!
//! Contains shared services that are accessible across all request handlers.

use crate::db::AsyncDbPool;
use crate::repositories::{MemoryStore, Repositories};
use crate::services::Services;

/// Application state containing all shared services.
///
/// This struct is designed to be used with Axum's State extractor.
/// Cloning is cheap since services share their repositories behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// All business logic services
    pub services: Services,
}

impl AppState {
    /// Creates a new AppState backed by PostgreSQL.
    ///
    /// # Example
    /// ```ignore
    /// let pool = establish_async_connection_pool(&settings.database).await?;
    /// let state = AppState::new(pool);
    /// ```
    pub fn new(pool: AsyncDbPool) -> Self {
        Self::from_repositories(Repositories::new(pool))
    }

    /// Creates an AppState backed by the in-memory store.
    pub fn in_memory(store: MemoryStore) -> Self {
        Self::from_repositories(Repositories::in_memory(store))
    }

    pub fn from_repositories(repos: Repositories) -> Self {
        Self {
            services: Services::new(repos),
        }
    }
}
