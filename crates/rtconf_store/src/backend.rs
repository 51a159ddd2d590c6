//! Client pool, client and collection traits.

use crate::error::StoreResult;
use crate::query::{FindOptions, Query};
use bson::Document;

/// A lazily consumed stream of result documents.
pub type Cursor<'a> = Box<dyn Iterator<Item = StoreResult<Document>> + 'a>;

/// A pool of store clients.
///
/// The pool is owned by the surrounding system. The bridge never keeps a
/// client across two operations: each operation checks one out and checks
/// it back in before returning, which [`crate::PooledClient`] enforces.
///
/// # Invariants
///
/// - `checkout` may block while the pool is exhausted
/// - every client handed out by `checkout` is passed to `checkin` exactly once
/// - implementations must be `Send + Sync`; operations run on many threads
pub trait ClientPool: Send + Sync {
    /// Takes a client out of the pool.
    ///
    /// # Errors
    ///
    /// Returns an error if no client can be produced.
    fn checkout(&self) -> StoreResult<Box<dyn StoreClient>>;

    /// Returns a client to the pool.
    fn checkin(&self, client: Box<dyn StoreClient>);
}

/// A single connection to the document store.
pub trait StoreClient: Send {
    /// Resolves a collection handle for `database`.`name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be resolved.
    fn collection(&self, database: &str, name: &str) -> StoreResult<Box<dyn Collection + '_>>;
}

/// A handle to one collection, valid while its client is borrowed.
pub trait Collection {
    /// Returns the collection name.
    fn name(&self) -> &str;

    /// Runs a query and returns a cursor over matching documents.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the query.
    fn find(&self, query: &Query, options: &FindOptions) -> StoreResult<Cursor<'_>>;

    /// Inserts one document.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the insert, including
    /// identity collisions.
    fn insert_one(&self, document: Document) -> StoreResult<()>;

    /// Applies `update` to every document matching `filter`.
    ///
    /// Returns the store-reported count of modified documents.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the update.
    fn update_many(&self, filter: &Document, update: &Document) -> StoreResult<u64>;

    /// Removes at most one document matching `filter`.
    ///
    /// Returns the number of removed documents (0 or 1).
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the delete.
    fn delete_one(&self, filter: &Document) -> StoreResult<u64>;
}
