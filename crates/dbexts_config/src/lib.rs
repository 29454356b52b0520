//! Configuration for dbexts
//!
//! This crate resolves which environment file to load, loads it once per process with
//! `dotenv`, and reads the MongoDB settings out of the environment through the `config`
//! crate. It also owns the naming rule databases have to follow.
//!
//! # Example
//!
//! ```rust,no_run
//! use dbexts_config::{load_settings, validate_database_name};
//!
//! fn setup() -> Result<(), dbexts_config::SettingsError> {
//!     let name = validate_database_name("skillsdata")?;
//!     let settings = load_settings("../local.env")?;
//!     println!("connecting to {} / {}", settings.uri, name);
//!     Ok(())
//! }
//! ```

pub mod env_file;
pub mod error;
pub mod models;

use config::{Config, Environment};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

pub use env_file::{ensure_dotenv_loaded, resolve_env_file, DEFAULT_ENV_FILE};
pub use error::SettingsError;
pub use models::MongoSettings;

/// Environment variables read by [`load_settings`] all start with this prefix.
pub const ENV_PREFIX: &str = "MONGODB";

/// Names a database may take: letters first, then letters or digits, two characters minimum.
pub static DATABASE_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]+[A-Za-z0-9]+$").expect("database name pattern is valid"));

/// Checks `name` against [`DATABASE_NAME_PATTERN`].
pub fn validate_database_name(name: &str) -> Result<&str, SettingsError> {
    if DATABASE_NAME_PATTERN.is_match(name) {
        Ok(name)
    } else {
        Err(SettingsError::InvalidDatabaseName(name.to_string()))
    }
}

/// Loads the env file named by `config_source` and reads the MongoDB settings.
///
/// `config_source` goes through [`resolve_env_file`] first, so anything that does not look
/// like a `.env` path falls back to [`DEFAULT_ENV_FILE`]. Variables already present in the
/// process environment win over the ones in the file.
///
/// # Errors
///
/// * [`SettingsError::EnvFile`] when the env file cannot be read
/// * [`SettingsError::MissingUri`] when `MONGODB_URI` is unset or empty
/// * [`SettingsError::Config`] when the environment cannot be deserialized
pub fn load_settings(config_source: &str) -> Result<MongoSettings, SettingsError> {
    let env_file = ensure_dotenv_loaded(config_source)?;
    debug!("Reading MongoDB settings after loading {}", env_file.display());
    settings_from_env()
}

/// Reads the MongoDB settings from the current process environment only.
pub fn settings_from_env() -> Result<MongoSettings, SettingsError> {
    let raw: models::RawMongoSettings = Config::builder()
        .add_source(Environment::with_prefix(ENV_PREFIX))
        .build()?
        .try_deserialize()?;
    raw.try_into()
}
