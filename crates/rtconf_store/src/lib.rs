//! # rtconf Store
//!
//! Document store seam for the realtime configuration bridge.
//!
//! The bridge talks to the document store only through the traits in this
//! crate. A host system supplies a [`ClientPool`]; each bridge operation
//! borrows one client with [`PooledClient`], resolves a [`Collection`] and
//! runs exactly one store call before the client goes back.
//!
//! ## Design Principles
//!
//! - The pool belongs to the host; the bridge never retains a client
//! - Queries carry filter and sort separately ([`Query`]) and can be
//!   rendered into the older `{ $query, $orderby }` envelope
//! - Implementations must be `Send + Sync` for concurrent access
//!
//! ## Available Backends
//!
//! - [`InMemoryPool`] - For testing and local tooling, with fault injection
//!
//! ## Example
//!
//! ```rust
//! use bson::doc;
//! use rtconf_store::{FindOptions, InMemoryPool, PooledClient, Query};
//!
//! let pool = InMemoryPool::new();
//! {
//!     let client = PooledClient::borrow(&pool).unwrap();
//!     let endpoints = client.collection("asterisk", "ps_endpoints").unwrap();
//!     endpoints.insert_one(doc! { "_id": "6001", "context": "default" }).unwrap();
//!     let found = endpoints
//!         .find(&Query::new(doc! { "context": "default" }), &FindOptions::default())
//!         .unwrap()
//!         .count();
//!     assert_eq!(found, 1);
//! }
//! assert_eq!(pool.outstanding(), 0);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod matcher;
mod memory;
mod pooled;
mod query;

pub use backend::{ClientPool, Collection, Cursor, StoreClient};
pub use error::{StoreError, StoreResult};
pub use memory::{InMemoryPool, Operation};
pub use pooled::PooledClient;
pub use query::{FindOptions, Query, ORDERBY_KEY, QUERY_KEY};
