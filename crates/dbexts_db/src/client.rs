//! Connection manager for dbexts
//!
//! This module owns the lifecycle of the MongoDB client and database handles. A
//! [`ConnectionManager`] creates each handle at most once, on first use, and can be
//! shared between repositories behind an `Arc`. [`initialize`] keeps one manager for the
//! whole process.

use crate::error::DbError;
use dbexts_config::{load_settings, validate_database_name, MongoSettings};
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use once_cell::sync::OnceCell as SyncOnceCell;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, error, info};

static GLOBAL_MANAGER: SyncOnceCell<Arc<ConnectionManager>> = SyncOnceCell::new();

/// Lifecycle stage of a connection manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No process-wide manager exists yet
    Uninitialized,
    /// Settings are loaded, no client yet
    Initialized,
    /// The client exists
    Connected,
    /// The client and the database handle exist
    DatabaseBound,
    /// The client was shut down; the manager cannot be reused
    Disconnected,
}

/// Lazily created MongoDB client and database handles
///
/// The client is created on the first call to [`ConnectionManager::client`], the
/// database handle on the first call to [`ConnectionManager::database`]. Concurrent first
/// callers wait for a single construction.
pub struct ConnectionManager {
    /// Connection settings
    settings: MongoSettings,

    /// Name of the database every repository works in
    database_name: String,

    client: OnceCell<Client>,
    database: OnceCell<Database>,
    shut_down: AtomicBool,
}

impl ConnectionManager {
    /// Create a new connection manager
    ///
    /// No connection is attempted here.
    ///
    /// # Errors
    ///
    /// [`DbError::Config`] if `database_name` is not a valid database name.
    pub fn new(settings: MongoSettings, database_name: &str) -> Result<Self, DbError> {
        let database_name = validate_database_name(database_name)?.to_string();
        Ok(Self {
            settings,
            database_name,
            client: OnceCell::new(),
            database: OnceCell::new(),
            shut_down: AtomicBool::new(false),
        })
    }

    /// Create a connection manager from an env file
    ///
    /// The database name is validated before anything is read from `config_source`.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    ///
    /// * The database name is invalid
    /// * The env file cannot be loaded
    /// * `MONGODB_URI` is not set
    pub fn from_env(config_source: &str, database_name: &str) -> Result<Self, DbError> {
        validate_database_name(database_name)?;
        let settings = load_settings(config_source)?;
        Self::new(settings, database_name)
    }

    /// Get the client, creating it on first use
    ///
    /// # Errors
    ///
    /// [`DbError::Connection`] if the connection string cannot be resolved, the client
    /// cannot be built, or the manager was shut down.
    pub async fn client(&self) -> Result<&Client, DbError> {
        if self.shut_down.load(Ordering::Acquire) {
            return Err(DbError::Connection(
                "the connection manager has been shut down".to_string(),
            ));
        }
        self.client.get_or_try_init(|| self.connect()).await
    }

    /// Get the database handle, resolving it from the client on first use
    pub async fn database(&self) -> Result<&Database, DbError> {
        let client = self.client().await?;
        Ok(self
            .database
            .get_or_init(|| async {
                debug!("Binding database {}", self.database_name);
                client.database(&self.database_name)
            })
            .await)
    }

    /// Disconnect the client if one was created
    ///
    /// Calling this when no client exists, or a second time, does nothing beyond marking
    /// the manager as disconnected.
    pub async fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            debug!("Connection manager already shut down");
            return;
        }
        match self.client.get() {
            Some(client) => {
                client.clone().shutdown().await;
                info!("MongoDB client for {} disconnected", self.database_name);
            }
            None => debug!("Shutdown requested before any client was created"),
        }
    }

    /// Current lifecycle stage
    pub fn state(&self) -> ConnectionState {
        if self.shut_down.load(Ordering::Acquire) {
            ConnectionState::Disconnected
        } else if self.database.initialized() {
            ConnectionState::DatabaseBound
        } else if self.client.initialized() {
            ConnectionState::Connected
        } else {
            ConnectionState::Initialized
        }
    }

    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    pub fn settings(&self) -> &MongoSettings {
        &self.settings
    }

    async fn connect(&self) -> Result<Client, DbError> {
        debug!("Creating MongoDB client for database {}", self.database_name);

        let mut options = ClientOptions::parse(&self.settings.uri)
            .await
            .map_err(|e| {
                error!("Failed to parse the MongoDB connection string: {}", e);
                DbError::Connection(e.to_string())
            })?;
        if let Some(app_name) = &self.settings.app_name {
            options.app_name = Some(app_name.clone());
        }

        let client = Client::with_options(options).map_err(|e| {
            error!("Failed to create MongoDB client: {}", e);
            DbError::Connection(e.to_string())
        })?;

        info!("MongoDB client created successfully");
        Ok(client)
    }
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The connection string may carry credentials
        f.debug_struct("ConnectionManager")
            .field("database_name", &self.database_name)
            .field("state", &self.state())
            .finish()
    }
}

/// Initialize the process-wide connection manager
///
/// Only the first successful call does any work; later calls return the same manager
/// whatever arguments they pass.
///
/// # Errors
///
/// See [`ConnectionManager::from_env`].
pub fn try_initialize(
    config_source: &str,
    database_name: &str,
) -> Result<Arc<ConnectionManager>, DbError> {
    GLOBAL_MANAGER
        .get_or_try_init(|| {
            let manager = ConnectionManager::from_env(config_source, database_name)?;
            info!("Connection manager initialized for {}", database_name);
            Ok(Arc::new(manager))
        })
        .cloned()
}

/// Initialize the process-wide connection manager, aborting on configuration errors
///
/// # Panics
///
/// Panics if the database name is invalid, the env file cannot be loaded or
/// `MONGODB_URI` is missing. None of these can be recovered from at runtime.
pub fn initialize(config_source: &str, database_name: &str) -> Arc<ConnectionManager> {
    match try_initialize(config_source, database_name) {
        Ok(manager) => manager,
        Err(e) => {
            error!("Impossible to initialize: {}", e);
            panic!("Impossible to initialize: {e}");
        }
    }
}

/// The process-wide connection manager, if [`initialize`] succeeded
pub fn global() -> Option<Arc<ConnectionManager>> {
    GLOBAL_MANAGER.get().cloned()
}

/// Lifecycle stage of the process-wide connection manager
pub fn global_state() -> ConnectionState {
    GLOBAL_MANAGER
        .get()
        .map_or(ConnectionState::Uninitialized, |manager| manager.state())
}
