//! MongoDB implementation of the generic CRUD repository
//!
//! This module provides [`MongoCrudRepo`], the [`MongoCrud`] implementation bound to one
//! collection. The collection handle is resolved through the shared
//! [`ConnectionManager`] on first use and memoised afterwards.

use crate::client::{self, ConnectionManager};
use crate::diff::{try_make_update_statements, OID, SET};
use crate::error::{DbError, RetrieveError};
use crate::repository::{MongoCrud, Record, UpdateFn};
use dbexts_common::log_error;
use futures_util::{FutureExt, TryStreamExt};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Document};
use mongodb::error::ErrorKind;
use mongodb::options::FindOptions;
use mongodb::results::{InsertOneResult, UpdateResult};
use mongodb::{Collection, Database};
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// `limit` value meaning "no limit"
pub const UNLIMITED: i64 = -1;

// Server error code returned when creating a collection that already exists
const NAMESPACE_EXISTS: i32 = 48;

/// CRUD repository for records of type `A` stored in one collection
pub struct MongoCrudRepo<A: Record> {
    /// The shared connection manager
    manager: Arc<ConnectionManager>,

    /// Name of the backing collection
    collection_name: String,

    db: OnceCell<Database>,
    coll: OnceCell<Collection<A>>,
}

impl<A: Record> MongoCrudRepo<A> {
    /// Create a new repository bound to `collection_name`
    ///
    /// Nothing is resolved until the first operation or an explicit [`Self::init`].
    pub fn new(manager: Arc<ConnectionManager>, collection_name: impl Into<String>) -> Self {
        Self {
            manager,
            collection_name: collection_name.into(),
            db: OnceCell::new(),
            coll: OnceCell::new(),
        }
    }

    /// Create a repository on the process-wide connection manager
    ///
    /// # Errors
    ///
    /// [`DbError::NotInitialized`] if [`crate::initialize`] has not run yet.
    pub fn with_global(collection_name: impl Into<String>) -> Result<Self, DbError> {
        let manager = client::global().ok_or(DbError::NotInitialized)?;
        Ok(Self::new(manager, collection_name))
    }

    /// Resolve the database and collection handles
    ///
    /// The collection is created in the database when it does not exist yet. Calling
    /// this again once it succeeded does nothing.
    pub async fn init(&self) -> Result<&Self, DbError> {
        self.collection().await?;
        Ok(self)
    }

    /// The collection handle, resolved on first use
    pub async fn collection(&self) -> Result<&Collection<A>, DbError> {
        self.coll
            .get_or_try_init(|| async {
                let db = self.database().await?;
                ensure_collection(db, &self.collection_name).await?;
                Ok::<_, DbError>(db.collection::<A>(&self.collection_name))
            })
            .await
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    async fn database(&self) -> Result<&Database, DbError> {
        self.db
            .get_or_try_init(|| async { self.manager.database().await.cloned() })
            .await
    }

    async fn update_one(&self, oid: ObjectId, update: Document) -> Result<UpdateResult, DbError> {
        let coll = self.collection().await?;
        debug!("Updating {} in {}", oid, self.collection_name);
        let result = coll.update_one(id_filter(oid), update, None).await?;
        Ok(result)
    }
}

impl<A: Record> MongoCrud<A> for MongoCrudRepo<A> {
    async fn create(&self, record: &A) -> Result<InsertOneResult, DbError> {
        let coll = self.collection().await?;
        let result = coll.insert_one(record, None).await?;
        debug!(
            "Inserted {} into {}",
            result.inserted_id, self.collection_name
        );
        Ok(result)
    }

    async fn retrieve_by_id(&self, oid: ObjectId) -> Option<A> {
        let coll = match self.collection().await {
            Ok(coll) => coll,
            Err(e) => {
                warn!("Cannot look up {}: {}", oid, e);
                return None;
            }
        };
        match coll.find_one(id_filter(oid), None).await {
            Ok(found) => {
                if found.is_none() {
                    debug!("{} not found in {}", oid, self.collection_name);
                }
                found
            }
            Err(e) => {
                warn!("Suppressed error reading {}: {}", oid, e);
                None
            }
        }
    }

    async fn retrieve_by_filter(&self, filter: Document) -> Result<Vec<A>, RetrieveError<A>> {
        self.retrieve_with_limit(filter, UNLIMITED).await
    }

    async fn retrieve_with_limit(
        &self,
        filter: Document,
        limit: i64,
    ) -> Result<Vec<A>, RetrieveError<A>> {
        let coll = self.collection().await.map_err(RetrieveError::empty)?;

        let options = (limit > 0).then(|| {
            let mut options = FindOptions::default();
            options.limit = Some(limit);
            options
        });
        let mut cursor = coll.find(filter, options).await.map_err(|e| {
            warn!("Suppressed error: {}", e);
            RetrieveError::empty(e)
        })?;

        if limit <= 0 {
            return cursor
                .try_collect::<Vec<A>>()
                .await
                .map_err(RetrieveError::empty);
        }

        let max = usize::try_from(limit).unwrap_or(usize::MAX);
        let mut list = Vec::new();
        while list.len() < max {
            match cursor.try_next().await {
                Ok(Some(record)) => list.push(record),
                Ok(None) => break,
                Err(e) => {
                    drop(cursor);
                    return Err(RetrieveError::new(list, e));
                }
            }
        }
        drop(cursor);
        Ok(list)
    }

    fn update_by_id(&self, id: Option<ObjectId>) -> UpdateFn<'_> {
        match id {
            Some(oid) => Box::new(move |update: Document| self.update_one(oid, update).boxed()),
            None => Box::new(|_update: Document| {
                async {
                    Err::<UpdateResult, _>(DbError::InvalidArgument(
                        "cannot update a record without an identifier".to_string(),
                    ))
                }
                .boxed()
            }),
        }
    }

    async fn save_changes(&self, old: &A, new: &A) -> Result<Option<UpdateResult>, DbError> {
        let changes = try_make_update_statements(old, new)?;
        if changes.is_empty() {
            debug!("No changes to save in {}", self.collection_name);
            return Ok(None);
        }
        let mut statement = Document::new();
        statement.insert(SET, changes);
        self.update_by_id(old.id())(statement).await.map(Some)
    }

    async fn delete_by_id(&self, id: &str) -> i64 {
        let oid = match ObjectId::parse_str(id) {
            Ok(oid) => oid,
            Err(e) => {
                warn!("Error {}. {} is not a valid oid", e, id);
                return -1;
            }
        };
        let coll = match self.collection().await {
            Ok(coll) => coll,
            Err(e) => {
                log_error(e, "Nothing deleted");
                return -1;
            }
        };
        match coll.delete_one(id_filter(oid), None).await {
            Ok(result) => i64::try_from(result.deleted_count).unwrap_or(i64::MAX),
            Err(e) => {
                log_error(e, "Nothing deleted");
                -1
            }
        }
    }
}

impl<A: Record> fmt::Debug for MongoCrudRepo<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MongoCrudRepo")
            .field("collection_name", &self.collection_name)
            .field("resolved", &self.coll.initialized())
            .finish()
    }
}

fn id_filter(oid: ObjectId) -> Document {
    let mut filter = Document::new();
    filter.insert(OID, oid);
    filter
}

async fn ensure_collection(db: &Database, name: &str) -> Result<(), DbError> {
    let existing = db.list_collection_names(doc! { "name": name }).await?;
    if !existing.is_empty() {
        return Ok(());
    }

    info!("Creating collection {} in {}", name, db.name());
    match db.create_collection(name, None).await {
        Ok(()) => Ok(()),
        Err(e) if matches!(*e.kind, ErrorKind::Command(ref c) if c.code == NAMESPACE_EXISTS) => {
            debug!("Collection {} was created concurrently", name);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
