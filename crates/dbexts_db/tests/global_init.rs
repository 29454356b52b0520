//! Process-wide initialization
//!
//! Kept in its own test binary: the connection manager and the loaded env file are
//! global to the process.

use dbexts_config::env_file::ENV_FILE_PATTERN;
use dbexts_config::ensure_dotenv_loaded;
use dbexts_db::{global, global_state, initialize, ConnectionState};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// A temp dir holding `first.env`, or `None` when the temp path cannot pass as an env file path
fn env_file() -> Option<(TempDir, PathBuf)> {
    for _ in 0..64 {
        let dir = tempfile::Builder::new()
            .prefix("dbextsenv")
            .tempdir()
            .expect("create temp dir");
        let path = dir.path().join("first.env");
        if ENV_FILE_PATTERN.is_match(&path.to_string_lossy()) {
            let mut file = std::fs::File::create(&path).expect("create env file");
            writeln!(file, "MONGODB_URI=mongodb://localhost:27017").expect("write env file");
            return Some((dir, path));
        }
    }
    None
}

#[test]
fn test_initialize_runs_once() {
    let Some((_dir, path)) = env_file() else {
        eprintln!("Skipping: temp dir path is not a valid env file path");
        return;
    };
    let path = path.to_string_lossy().into_owned();

    assert_eq!(global_state(), ConnectionState::Uninitialized);
    assert!(global().is_none());

    let first = initialize(&path, "skillsdata");
    assert_eq!(first.database_name(), "skillsdata");
    assert_eq!(global_state(), ConnectionState::Initialized);

    // different arguments, nothing is re-read
    let second = initialize("/nonexistent/other.env", "otherdb");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.database_name(), "skillsdata");
    assert!(Arc::ptr_eq(&first, &global().expect("global manager")));
    assert_eq!(global_state(), ConnectionState::Initialized);

    // the env file stays the first one loaded
    let loaded = ensure_dotenv_loaded("/nonexistent/other.env").expect("env file loaded");
    assert!(loaded.ends_with("first.env"));
}
