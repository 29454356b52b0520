//! Error types for settings loading

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading the dbexts settings
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The database name does not follow the naming rule
    #[error("Database >{0}< is not a valid database name")]
    InvalidDatabaseName(String),

    /// The env file could not be loaded
    #[error("Impossible to load env file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenv::Error,
    },

    /// `MONGODB_URI` is not set
    #[error("You must set your 'MONGODB_URI' environment variable")]
    MissingUri,

    /// Error from the config crate
    #[error("Settings error: {0}")]
    Config(#[from] config::ConfigError),
}
