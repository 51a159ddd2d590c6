//! JSON fixtures for the in-memory pool.
//!
//! A fixture is one object mapping table names to arrays of documents in
//! extended JSON, so `{"$oid": "..."}` and friends are accepted.

use bson::Bson;
use rtconf_store::InMemoryPool;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

/// A fixture that could not be read.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// The file could not be read.
    #[error("fixture unreadable: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not JSON.
    #[error("fixture is not JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The top level is not an object of tables.
    #[error("fixture must be an object mapping tables to documents")]
    NotAnObject,

    /// A table entry is not an array.
    #[error("table {table:?} must be an array of documents")]
    NotAnArray {
        /// Offending table.
        table: String,
    },

    /// A table entry holds something other than a document.
    #[error("entry {index} of table {table:?} is not a document{reason}")]
    NotADocument {
        /// Offending table.
        table: String,
        /// Position in the table array.
        index: usize,
        /// Extended JSON error, prefixed with `: ` when present.
        reason: String,
    },
}

/// Reads a fixture file into a new pool under `database`.
pub fn load(path: &Path, database: &str) -> Result<InMemoryPool, FixtureError> {
    let text = std::fs::read_to_string(path)?;
    parse(&text, database)
}

/// Parses fixture text into a new pool under `database`.
pub fn parse(text: &str, database: &str) -> Result<InMemoryPool, FixtureError> {
    let Value::Object(tables) = serde_json::from_str::<Value>(text)? else {
        return Err(FixtureError::NotAnObject);
    };
    let pool = InMemoryPool::new();
    for (table, entries) in tables {
        let Value::Array(entries) = entries else {
            return Err(FixtureError::NotAnArray { table });
        };
        let mut documents = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            match Bson::try_from(entry) {
                Ok(Bson::Document(document)) => documents.push(document),
                Ok(_) => {
                    return Err(FixtureError::NotADocument {
                        table,
                        index,
                        reason: String::new(),
                    })
                }
                Err(err) => {
                    return Err(FixtureError::NotADocument {
                        table,
                        index,
                        reason: format!(": {err}"),
                    })
                }
            }
        }
        tracing::debug!(table = %table, documents = documents.len(), "fixture table");
        pool.seed(database, &table, documents);
    }
    Ok(pool)
}
