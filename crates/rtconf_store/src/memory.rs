//! In-memory document store for testing and local tooling.

use crate::backend::{ClientPool, Collection, Cursor, StoreClient};
use crate::error::{StoreError, StoreResult};
use crate::matcher;
use crate::query::{FindOptions, Query};
use bson::oid::ObjectId;
use bson::{Bson, Document};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Store operations that can be made to fail on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `Collection::find`.
    Find,
    /// `Collection::insert_one`.
    Insert,
    /// `Collection::update_many`.
    Update,
    /// `Collection::delete_one`.
    Delete,
}

impl Operation {
    fn name(self) -> &'static str {
        match self {
            Operation::Find => "find",
            Operation::Insert => "insert",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

#[derive(Debug, Default)]
struct Faults {
    exhausted: bool,
    missing_collections: bool,
    failing: HashSet<Operation>,
}

type Databases = HashMap<String, HashMap<String, Vec<Document>>>;

#[derive(Debug, Default)]
struct Shared {
    databases: RwLock<Databases>,
    faults: RwLock<Faults>,
    checkouts: AtomicUsize,
    checkins: AtomicUsize,
}

/// An in-memory client pool.
///
/// Cloning the pool shares the underlying store. Besides holding documents
/// it keeps checkout/checkin counters and lets tests inject failures at
/// every step an operation goes through.
///
/// # Thread Safety
///
/// The pool is `Send + Sync`; documents sit behind a read-write lock.
///
/// # Example
///
/// ```rust
/// use bson::doc;
/// use rtconf_store::{FindOptions, InMemoryPool, PooledClient, Query};
///
/// let pool = InMemoryPool::new();
/// pool.seed("asterisk", "ps_aors", [doc! { "_id": "6001", "max_contacts": 10.0 }]);
///
/// let client = PooledClient::borrow(&pool).unwrap();
/// let aors = client.collection("asterisk", "ps_aors").unwrap();
/// let found: Vec<_> = aors
///     .find(&Query::new(doc! { "_id": "6001" }), &FindOptions::default())
///     .unwrap()
///     .collect();
/// assert_eq!(found.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryPool {
    shared: Arc<Shared>,
}

impl InMemoryPool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts documents directly, bypassing the pool counters.
    ///
    /// Documents without an `_id` get a fresh identity.
    pub fn seed(
        &self,
        database: &str,
        collection: &str,
        documents: impl IntoIterator<Item = Document>,
    ) {
        let mut databases = self.shared.databases.write();
        let stored = databases
            .entry(database.to_string())
            .or_default()
            .entry(collection.to_string())
            .or_default();
        stored.extend(documents.into_iter().map(with_identity));
    }

    /// Returns a snapshot of a collection's documents in insertion order.
    #[must_use]
    pub fn documents(&self, database: &str, collection: &str) -> Vec<Document> {
        self.shared
            .databases
            .read()
            .get(database)
            .and_then(|collections| collections.get(collection))
            .cloned()
            .unwrap_or_default()
    }

    /// Number of successful checkouts so far.
    #[must_use]
    pub fn checkouts(&self) -> usize {
        self.shared.checkouts.load(Ordering::SeqCst)
    }

    /// Number of checkins so far.
    #[must_use]
    pub fn checkins(&self) -> usize {
        self.shared.checkins.load(Ordering::SeqCst)
    }

    /// Clients currently checked out.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.checkouts().saturating_sub(self.checkins())
    }

    /// Makes every checkout fail with [`StoreError::PoolExhausted`].
    pub fn set_exhausted(&self, exhausted: bool) {
        self.shared.faults.write().exhausted = exhausted;
    }

    /// Makes every collection lookup fail.
    pub fn set_missing_collections(&self, missing: bool) {
        self.shared.faults.write().missing_collections = missing;
    }

    /// Makes `operation` fail on every collection.
    pub fn fail_operation(&self, operation: Operation) {
        self.shared.faults.write().failing.insert(operation);
    }

    /// Removes all injected faults.
    pub fn clear_faults(&self) {
        *self.shared.faults.write() = Faults::default();
    }
}

impl ClientPool for InMemoryPool {
    fn checkout(&self) -> StoreResult<Box<dyn StoreClient>> {
        if self.shared.faults.read().exhausted {
            return Err(StoreError::PoolExhausted);
        }
        self.shared.checkouts.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(InMemoryClient {
            shared: Arc::clone(&self.shared),
        }))
    }

    fn checkin(&self, _client: Box<dyn StoreClient>) {
        self.shared.checkins.fetch_add(1, Ordering::SeqCst);
    }
}

struct InMemoryClient {
    shared: Arc<Shared>,
}

impl StoreClient for InMemoryClient {
    fn collection(&self, database: &str, name: &str) -> StoreResult<Box<dyn Collection + '_>> {
        if self.shared.faults.read().missing_collections {
            return Err(StoreError::CollectionUnavailable {
                database: database.to_string(),
                collection: name.to_string(),
            });
        }
        Ok(Box::new(InMemoryCollection {
            shared: &self.shared,
            database: database.to_string(),
            name: name.to_string(),
        }))
    }
}

struct InMemoryCollection<'a> {
    shared: &'a Shared,
    database: String,
    name: String,
}

impl InMemoryCollection<'_> {
    fn check(&self, operation: Operation) -> StoreResult<()> {
        if self.shared.faults.read().failing.contains(&operation) {
            return Err(StoreError::operation_failed(
                operation.name(),
                format!("injected failure on {}.{}", self.database, self.name),
            ));
        }
        Ok(())
    }

    fn with_documents<T>(&self, f: impl FnOnce(&mut Vec<Document>) -> T) -> T {
        let mut databases = self.shared.databases.write();
        let documents = databases
            .entry(self.database.clone())
            .or_default()
            .entry(self.name.clone())
            .or_default();
        f(documents)
    }
}

impl Collection for InMemoryCollection<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    fn find(&self, query: &Query, options: &FindOptions) -> StoreResult<Cursor<'_>> {
        self.check(Operation::Find)?;
        let mut found = Vec::new();
        for document in self.documents_snapshot() {
            if matcher::matches(&document, &query.filter)? {
                found.push(document);
            }
        }
        matcher::sort_documents(&mut found, &query.sort);
        if let Some(limit) = options.limit.and_then(|l| usize::try_from(l).ok()) {
            if limit > 0 {
                found.truncate(limit);
            }
        }
        if let Some(projection) = &options.projection {
            found = found
                .into_iter()
                .map(|document| matcher::project(document, projection))
                .collect();
        }
        Ok(Box::new(found.into_iter().map(Ok::<Document, StoreError>)))
    }

    fn insert_one(&self, document: Document) -> StoreResult<()> {
        self.check(Operation::Insert)?;
        let document = with_identity(document);
        self.with_documents(|documents: &mut Vec<Document>| -> StoreResult<()> {
            let id = document.get("_id");
            if documents.iter().any(|existing| existing.get("_id") == id) {
                return Err(StoreError::DuplicateKey {
                    key: id.map(ToString::to_string).unwrap_or_default(),
                });
            }
            documents.push(document);
            Ok(())
        })
    }

    fn update_many(&self, filter: &Document, update: &Document) -> StoreResult<u64> {
        self.check(Operation::Update)?;
        self.with_documents(|documents: &mut Vec<Document>| -> StoreResult<u64> {
            let mut modified = 0;
            for document in documents.iter_mut() {
                if matcher::matches(document, filter)? && matcher::apply_update(document, update)? {
                    modified += 1;
                }
            }
            Ok(modified)
        })
    }

    fn delete_one(&self, filter: &Document) -> StoreResult<u64> {
        self.check(Operation::Delete)?;
        self.with_documents(|documents: &mut Vec<Document>| -> StoreResult<u64> {
            for index in 0..documents.len() {
                if matcher::matches(&documents[index], filter)? {
                    documents.remove(index);
                    return Ok(1);
                }
            }
            Ok(0)
        })
    }
}

impl InMemoryCollection<'_> {
    fn documents_snapshot(&self) -> Vec<Document> {
        self.shared
            .databases
            .read()
            .get(&self.database)
            .and_then(|collections| collections.get(&self.name))
            .cloned()
            .unwrap_or_default()
    }
}

/// Puts an `_id` first, generating one when absent.
fn with_identity(document: Document) -> Document {
    if document.contains_key("_id") {
        return document;
    }
    let mut stored = Document::new();
    stored.insert("_id", Bson::ObjectId(ObjectId::new()));
    for (key, value) in document {
        stored.insert(key, value);
    }
    stored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pooled::PooledClient;
    use bson::doc;

    fn pool_with_aors() -> InMemoryPool {
        let pool = InMemoryPool::new();
        pool.seed(
            "asterisk",
            "ps_aors",
            [
                doc! { "_id": "6001", "max_contacts": 10.0 },
                doc! { "_id": "6002", "max_contacts": 1.0 },
            ],
        );
        pool
    }

    #[test]
    fn seed_assigns_identity() {
        let pool = InMemoryPool::new();
        pool.seed("db", "t", [doc! { "name": "x" }]);
        let stored = pool.documents("db", "t");
        assert!(matches!(stored[0].get("_id"), Some(Bson::ObjectId(_))));
        assert_eq!(stored[0].keys().next().map(String::as_str), Some("_id"));
    }

    #[test]
    fn find_with_limit_and_sort() {
        let pool = pool_with_aors();
        let client = PooledClient::borrow(&pool).unwrap();
        let aors = client.collection("asterisk", "ps_aors").unwrap();
        let query = Query::new(Document::new()).with_sort(doc! { "max_contacts": 1.0 });
        let found: Vec<_> = aors
            .find(&query, &FindOptions::default().limit(1))
            .unwrap()
            .collect::<StoreResult<_>>()
            .unwrap();
        assert_eq!(found, vec![doc! { "_id": "6002", "max_contacts": 1.0 }]);
    }

    #[test]
    fn insert_rejects_duplicate_identity() {
        let pool = pool_with_aors();
        let client = PooledClient::borrow(&pool).unwrap();
        let aors = client.collection("asterisk", "ps_aors").unwrap();
        let err = aors.insert_one(doc! { "_id": "6001" }).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { .. }));
        aors.insert_one(doc! { "_id": "6003" }).unwrap();
        assert_eq!(pool.documents("asterisk", "ps_aors").len(), 3);
    }

    #[test]
    fn update_counts_only_changed_documents() {
        let pool = pool_with_aors();
        let client = PooledClient::borrow(&pool).unwrap();
        let aors = client.collection("asterisk", "ps_aors").unwrap();
        let update = doc! { "$set": { "max_contacts": 10.0 } };
        assert_eq!(aors.update_many(&Document::new(), &update).unwrap(), 1);
        assert_eq!(aors.update_many(&Document::new(), &update).unwrap(), 0);
    }

    #[test]
    fn delete_removes_at_most_one() {
        let pool = pool_with_aors();
        let client = PooledClient::borrow(&pool).unwrap();
        let aors = client.collection("asterisk", "ps_aors").unwrap();
        assert_eq!(aors.delete_one(&Document::new()).unwrap(), 1);
        assert_eq!(aors.delete_one(&doc! { "_id": "nope" }).unwrap(), 0);
        assert_eq!(pool.documents("asterisk", "ps_aors").len(), 1);
    }

    #[test]
    fn injected_faults() {
        let pool = pool_with_aors();
        pool.fail_operation(Operation::Insert);
        {
            let client = PooledClient::borrow(&pool).unwrap();
            let aors = client.collection("asterisk", "ps_aors").unwrap();
            assert!(aors.insert_one(doc! { "x": 1 }).is_err());
        }
        pool.set_missing_collections(true);
        {
            let client = PooledClient::borrow(&pool).unwrap();
            assert!(client.collection("asterisk", "ps_aors").is_err());
        }
        pool.clear_faults();
        assert_eq!(pool.checkouts(), 2);
        assert_eq!(pool.outstanding(), 0);
    }
}
