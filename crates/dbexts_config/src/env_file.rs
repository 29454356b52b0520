//! Env file discovery and loading.
//!
//! The env file is loaded into the process environment at most once. Paths that do not
//! look like a `.env` file are replaced by [`DEFAULT_ENV_FILE`].

use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::SettingsError;

/// Env file used when the caller supplies nothing usable.
pub const DEFAULT_ENV_FILE: &str = "local.env";

/// Relative or absolute path ending in `.env`.
pub static ENV_FILE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\.\./|[/a-zA-Z])+(/[a-zA-Z\d.\-])*\.env$").expect("env file pattern is valid")
});

static LOADED_ENV_FILE: OnceCell<PathBuf> = OnceCell::new();

/// Returns `candidate` if it matches [`ENV_FILE_PATTERN`], [`DEFAULT_ENV_FILE`] otherwise.
pub fn resolve_env_file(candidate: &str) -> &str {
    if ENV_FILE_PATTERN.is_match(candidate) {
        candidate
    } else {
        debug!(
            "{:?} is not an env file path, using {}",
            candidate, DEFAULT_ENV_FILE
        );
        DEFAULT_ENV_FILE
    }
}

/// Loads the env file resolved from `candidate` unless one was loaded already.
///
/// Returns the path of the file that is loaded for this process, which is the first one
/// that loaded successfully regardless of what later callers pass in.
///
/// # Errors
///
/// [`SettingsError::EnvFile`] if no env file was loaded yet and this one cannot be read.
pub fn ensure_dotenv_loaded(candidate: &str) -> Result<&'static Path, SettingsError> {
    LOADED_ENV_FILE
        .get_or_try_init(|| load_env_file(Path::new(resolve_env_file(candidate))))
        .map(PathBuf::as_path)
}

pub(crate) fn load_env_file(path: &Path) -> Result<PathBuf, SettingsError> {
    let loaded = dotenv::from_filename(path).map_err(|source| SettingsError::EnvFile {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Loaded environment from {}", loaded.display());
    Ok(loaded)
}
