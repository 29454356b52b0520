//! Repository implementations
//!
//! This module contains the MongoDB implementation of the generic CRUD repository.

pub mod mongo_crud;

// Re-export the repository for ease of use
pub use mongo_crud::{MongoCrudRepo, UNLIMITED};
