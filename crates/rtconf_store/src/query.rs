//! Query envelope shared by the translator and the store backends.

use crate::error::{StoreError, StoreResult};
use bson::{doc, Bson, Document};

/// Key of the filter inside a query-with-modifiers envelope.
pub const QUERY_KEY: &str = "$query";
/// Key of the sort inside a query-with-modifiers envelope.
pub const ORDERBY_KEY: &str = "$orderby";

/// A filter plus an optional sort.
///
/// Newer drivers take the two as separate parameters. Older ones expect a
/// single `{ $query: .., $orderby: .. }` document, which [`Query::to_modifiers`]
/// produces and [`Query::from_modifiers`] reads back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Filter document.
    pub filter: Document,
    /// Sort document; empty means store-native order.
    pub sort: Document,
}

impl Query {
    /// Creates a query with no sort.
    #[must_use]
    pub fn new(filter: Document) -> Self {
        Self {
            filter,
            sort: Document::new(),
        }
    }

    /// Sets the sort document.
    #[must_use]
    pub fn with_sort(mut self, sort: Document) -> Self {
        self.sort = sort;
        self
    }

    /// Wraps filter and sort into the query-with-modifiers envelope.
    #[must_use]
    pub fn to_modifiers(&self) -> Document {
        doc! {
            QUERY_KEY: self.filter.clone(),
            ORDERBY_KEY: self.sort.clone(),
        }
    }

    /// Reads a query from either envelope shape.
    ///
    /// A document without a `$query` key is taken to be a bare filter.
    ///
    /// # Errors
    ///
    /// Returns an error if `$query` or `$orderby` is not a document.
    pub fn from_modifiers(envelope: &Document) -> StoreResult<Self> {
        let Some(filter) = envelope.get(QUERY_KEY) else {
            return Ok(Self::new(envelope.clone()));
        };
        let filter = as_document(QUERY_KEY, filter)?;
        let sort = match envelope.get(ORDERBY_KEY) {
            Some(sort) => as_document(ORDERBY_KEY, sort)?,
            None => Document::new(),
        };
        Ok(Self { filter, sort })
    }
}

fn as_document(key: &str, value: &Bson) -> StoreResult<Document> {
    value
        .as_document()
        .cloned()
        .ok_or_else(|| StoreError::InvalidQuery(format!("{key} must be a document")))
}

/// Options for a find call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    /// Maximum number of documents to return.
    pub limit: Option<u64>,
    /// Inclusion projection.
    pub projection: Option<Document>,
}

impl FindOptions {
    /// Limits the result to `limit` documents.
    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Restricts returned fields to the given inclusion projection.
    #[must_use]
    pub fn projection(mut self, projection: Document) -> Self {
        self.projection = Some(projection);
        self
    }
}
