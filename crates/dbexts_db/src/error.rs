//! Error types for the MongoDB repositories

use dbexts_config::SettingsError;
use std::fmt;
use thiserror::Error;

/// Errors that can occur when working with the repositories
#[derive(Debug, Error)]
pub enum DbError {
    /// Error from the MongoDB driver
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    /// A record could not be represented in BSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] mongodb::bson::ser::Error),

    /// Error with the database configuration
    #[error("Database configuration error: {0}")]
    Config(#[from] SettingsError),

    /// Error with the database connection
    #[error("Database connection error: {0}")]
    Connection(String),

    /// The process-wide connection manager was used before being initialized
    #[error("Connection manager is not initialized")]
    NotInitialized,

    /// An argument was rejected before contacting the store
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Failure of a filtered retrieval.
///
/// Carries every record decoded before the failure next to the error that stopped the
/// retrieval, so callers can decide whether the partial data is usable.
pub struct RetrieveError<A> {
    pub records: Vec<A>,
    pub error: DbError,
}

impl<A> RetrieveError<A> {
    pub(crate) fn new(records: Vec<A>, error: impl Into<DbError>) -> Self {
        Self {
            records,
            error: error.into(),
        }
    }

    pub(crate) fn empty(error: impl Into<DbError>) -> Self {
        Self::new(Vec::new(), error)
    }

    /// Splits the error into the partial records and the underlying cause.
    pub fn into_parts(self) -> (Vec<A>, DbError) {
        (self.records, self.error)
    }
}

impl<A> fmt::Debug for RetrieveError<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetrieveError")
            .field("records", &self.records.len())
            .field("error", &self.error)
            .finish()
    }
}

impl<A> fmt::Display for RetrieveError<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} records retrieved before the failure)",
            self.error,
            self.records.len()
        )
    }
}

impl<A> std::error::Error for RetrieveError<A> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
