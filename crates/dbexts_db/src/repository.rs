//! Repository traits for MongoDB access
//!
//! This module defines the capabilities a record type needs to be stored, the generic
//! CRUD interface implemented by [`crate::MongoCrudRepo`], and the factory trait used to
//! build repositories.

use crate::error::{DbError, RetrieveError};
use futures_util::future::BoxFuture;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::Document;
use mongodb::results::{InsertOneResult, UpdateResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;

/// A type that can be stored in a collection
///
/// Field names in the store are the serde names of the fields. The identifier is the
/// field serialized as `_id`; it is never part of an update statement.
pub trait Record: Serialize + DeserializeOwned + Unpin + Send + Sync + 'static {
    /// The identifier of this record, if it has been assigned one
    fn id(&self) -> Option<ObjectId>;
}

/// Applies an update document to the record the closure was built for
pub type UpdateFn<'a> =
    Box<dyn Fn(Document) -> BoxFuture<'a, Result<UpdateResult, DbError>> + Send + Sync + 'a>;

/// Generic CRUD operations over a collection of `A`
pub trait MongoCrud<A: Record> {
    /// Insert a new record
    ///
    /// # Returns
    ///
    /// The insert result holding the identifier assigned by the store
    fn create(
        &self,
        record: &A,
    ) -> impl Future<Output = Result<InsertOneResult, DbError>> + Send;

    /// Find a record by its identifier
    ///
    /// # Returns
    ///
    /// The record, or `None` if it does not exist or could not be read. The two cases are
    /// not told apart.
    fn retrieve_by_id(&self, oid: ObjectId) -> impl Future<Output = Option<A>> + Send;

    /// Find every record matching `filter`
    fn retrieve_by_filter(
        &self,
        filter: Document,
    ) -> impl Future<Output = Result<Vec<A>, RetrieveError<A>>> + Send;

    /// Find records matching `filter`, at most `limit` of them
    ///
    /// A `limit` of zero or less means no limit. When a record cannot be decoded the
    /// retrieval stops and the error carries the records read so far.
    fn retrieve_with_limit(
        &self,
        filter: Document,
        limit: i64,
    ) -> impl Future<Output = Result<Vec<A>, RetrieveError<A>>> + Send;

    /// Build an update function for the record identified by `id`
    ///
    /// With `id == None` the returned function always fails with
    /// [`DbError::InvalidArgument`] and never contacts the store.
    fn update_by_id(&self, id: Option<ObjectId>) -> UpdateFn<'_>;

    /// Write the fields that differ between `old` and `new` to the record `old` was read from
    ///
    /// # Returns
    ///
    /// `None` when nothing changed and the store was not contacted
    fn save_changes(
        &self,
        old: &A,
        new: &A,
    ) -> impl Future<Output = Result<Option<UpdateResult>, DbError>> + Send;

    /// Delete a record by the hex form of its identifier
    ///
    /// # Returns
    ///
    /// The number of deleted records, or `-1` if `id` is not a valid identifier or the
    /// store reported an error
    fn delete_by_id(&self, id: &str) -> impl Future<Output = i64> + Send;
}

/// A trait for repository factories
///
/// It is generic over the repository type and the configuration type.
pub trait RepositoryFactory<R, C> {
    /// Create a new repository instance
    fn create_repository(&self, config: C) -> R;
}
