//! # rtconf Testkit
//!
//! Test utilities for rtconf.
//!
//! This crate provides:
//! - Seeded in-memory pools with PJSIP-style realtime tables
//! - A builder for static configuration documents
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use rtconf_store::PooledClient;
//! use rtconf_testkit::prelude::*;
//!
//! let pool = seeded_pool();
//! let client = PooledClient::borrow(&pool).unwrap();
//! assert!(client.collection(DATABASE, ENDPOINTS).is_ok());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
