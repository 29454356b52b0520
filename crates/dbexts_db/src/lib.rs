//! MongoDB repositories for dbexts
//!
//! This crate provides a generic CRUD repository over MongoDB collections, a connection
//! manager that lazily creates the client and database handles at most once, and a diff
//! engine that turns two versions of a record into a minimal `$set` update.
//!
//! # Features
//!
//! - Typed create/retrieve/update/delete for any serde record
//! - Lazily created, memoised client, database and collection handles
//! - Partial updates computed from an old/new pair of records
//! - Lenient hex identifier parsing for user-supplied ids
//!
//! # Example
//!
//! ```rust,no_run
//! use dbexts_db::{make_update_set_statement, MongoCrud, MongoCrudRepo, Record};
//! use mongodb::bson::oid::ObjectId;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! struct Person {
//!     #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
//!     id: Option<ObjectId>,
//!     #[serde(rename = "first_name")]
//!     first_name: String,
//! }
//!
//! impl Record for Person {
//!     fn id(&self) -> Option<ObjectId> {
//!         self.id
//!     }
//! }
//!
//! async fn rename() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = dbexts_db::initialize("../local.env", "skillsdata");
//!     let repo = MongoCrudRepo::<Person>::new(manager, "People");
//!
//!     let inserted = repo.create(&Person { id: None, first_name: "John".into() }).await?;
//!     let Some(id) = inserted.inserted_id.as_object_id() else {
//!         return Ok(());
//!     };
//!     if let Some(old) = repo.retrieve_by_id(id).await {
//!         let new = Person { first_name: "Jane".into(), ..old.clone() };
//!         repo.update_by_id(old.id)(make_update_set_statement(&old, &new)).await?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod diff;
pub mod error;
pub mod factory;
pub mod oid;
pub mod repositories;
pub mod repository;

// Re-export the client, factory, and repository traits for ease of use
pub use client::{
    global, global_state, initialize, try_initialize, ConnectionManager, ConnectionState,
};
pub use diff::{
    make_update_set_statement, make_update_statements, try_make_update_statements, FieldValue,
};
pub use error::{DbError, RetrieveError};
pub use factory::MongoCrudRepoFactory;
pub use oid::to_object_id;
pub use repositories::MongoCrudRepo;
pub use repository::{MongoCrud, Record, RepositoryFactory, UpdateFn};

// Re-export the driver so callers build filters with the same bson version
pub use mongodb;
pub use mongodb::bson;
