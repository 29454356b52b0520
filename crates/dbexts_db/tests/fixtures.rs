//! Test fixtures for the MongoDB repository tests
//!
//! These tests need a running MongoDB. `MONGODB_URI` is read from the environment or
//! from `local.env` at the workspace root; without it the tests return early.

#![allow(dead_code)]

use dbexts_db::bson::oid::ObjectId;
use dbexts_db::{ConnectionManager, MongoCrudRepo, Record};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const DB_NAME: &str = "skillsdata";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub first_name: String,
    pub last_name: String,
}

impl Record for Person {
    fn id(&self) -> Option<ObjectId> {
        self.id
    }
}

/// Creates the person most tests start from
pub fn mk_test_person() -> Person {
    person("John", "Doe")
}

pub fn person(first_name: &str, last_name: &str) -> Person {
    Person {
        id: None,
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
    }
}

/// Connection manager for the test database, or `None` when no MongoDB is configured
pub fn test_manager() -> Option<Arc<ConnectionManager>> {
    dbexts_common::init();
    let _ = dbexts_config::ensure_dotenv_loaded("../../local.env");
    match dbexts_config::settings_from_env() {
        Ok(settings) => Some(Arc::new(
            ConnectionManager::new(settings, DB_NAME).expect("valid test database name"),
        )),
        Err(e) => {
            eprintln!("Skipping MongoDB test: {e}");
            None
        }
    }
}

/// A repository on an emptied collection
pub async fn fresh_repo(
    manager: &Arc<ConnectionManager>,
    collection_name: &str,
) -> MongoCrudRepo<Person> {
    let db = manager.database().await.expect("database handle");
    db.collection::<Person>(collection_name)
        .drop(None)
        .await
        .expect("drop test collection");

    let repo = MongoCrudRepo::new(Arc::clone(manager), collection_name);
    repo.init().await.expect("init repository");
    repo
}
