//! Factory for creating repositories
//!
//! This module provides a factory that hands out repositories sharing one
//! connection manager.

use crate::client::{self, ConnectionManager};
use crate::error::DbError;
use crate::repositories::MongoCrudRepo;
use crate::repository::{Record, RepositoryFactory};
use std::sync::Arc;
use tracing::debug;

/// Factory for creating repositories
///
/// Every repository created by the same factory shares its connection manager, and
/// therefore its client and database handles.
#[derive(Debug, Clone)]
pub struct MongoCrudRepoFactory {
    manager: Arc<ConnectionManager>,
}

impl MongoCrudRepoFactory {
    /// Create a new repository factory
    pub fn new(manager: Arc<ConnectionManager>) -> Self {
        Self { manager }
    }

    /// Create a factory on the process-wide connection manager
    ///
    /// # Errors
    ///
    /// [`DbError::NotInitialized`] if [`crate::initialize`] has not run yet.
    pub fn from_global() -> Result<Self, DbError> {
        client::global()
            .map(Self::new)
            .ok_or(DbError::NotInitialized)
    }

    /// Create a repository for records of type `A` in `collection_name`
    pub fn repository<A: Record>(&self, collection_name: &str) -> MongoCrudRepo<A> {
        <Self as RepositoryFactory<MongoCrudRepo<A>, &str>>::create_repository(self, collection_name)
    }

    pub fn manager(&self) -> &Arc<ConnectionManager> {
        &self.manager
    }
}

impl<A: Record> RepositoryFactory<MongoCrudRepo<A>, &str> for MongoCrudRepoFactory {
    fn create_repository(&self, collection_name: &str) -> MongoCrudRepo<A> {
        debug!("Creating repository for collection {}", collection_name);
        MongoCrudRepo::new(Arc::clone(&self.manager), collection_name)
    }
}
