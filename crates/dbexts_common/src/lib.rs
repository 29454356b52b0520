// --- File: crates/dbexts_common/src/lib.rs ---

pub mod logging; // Logging utilities

// Re-export logging utilities for easier access
pub use logging::{init, init_with_level, log_error, log_result};

// Shared functionality used by the other dbexts crates.
