//! Service layer for business logic operations.
//!
//! Services encapsulate business rules and coordinate between
//! repositories, the HTTP handlers and the task worker.

mod application_service;
mod catalog_service;
mod posting_service;

pub use application_service::ApplicationService;
pub use catalog_service::CatalogService;
pub use posting_service::PostingService;

use crate::repositories::Repositories;

/// Aggregates all services for convenient access.
///
/// This struct is designed to be used as Axum application state.
/// Cloning is cheap since repositories are shared behind `Arc`.
#[derive(Clone)]
pub struct Services {
    pub postings: PostingService,
    pub catalog: CatalogService,
    pub applications: ApplicationService,
}

impl Services {
    /// Creates a new Services instance from Repositories.
    pub fn new(repos: Repositories) -> Self {
        Self {
            postings: PostingService::new(repos.postings.clone()),
            catalog: CatalogService::new(repos.postings, repos.applications.clone()),
            applications: ApplicationService::new(repos.applications),
        }
    }
}
