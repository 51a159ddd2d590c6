//! # rtconf Core
//!
//! Realtime configuration bridge over a document store.
//!
//! Host systems ask for configuration rows by table name and a list of
//! `field [operator]` / value lookup terms. This crate turns those lookups
//! into document store queries, turns the returned documents back into
//! flat rows, and rebuilds sectioned static configuration files from
//! category records.
//!
//! This crate provides:
//! - [`QueryTranslator`] for lookup terms, wildcard patterns and sorting
//! - [`SchemaRegistry`] for declared per-table field types
//! - [`mapper`] for document/row conversion
//! - [`Reconstructor`] for static configuration with nested includes
//! - [`RealtimeBridge`], the data access facade over a [`ClientPool`]
//! - [`RecordLogger`] for call detail and channel event records
//!
//! [`ClientPool`]: rtconf_store::ClientPool

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

mod bridge;
mod config;
mod error;
pub mod mapper;
mod reconstruct;
mod records;
mod row;
mod schema;
mod translate;

pub use bridge::{PoolConnector, RealtimeBridge, TableIncludes, MAX_INCLUDE_DEPTH};
pub use config::{
    BridgeSettings, ConfFile, ConfigSource, LogSettings, RecordSinkSettings, StaticSource,
    BRIDGE_CATEGORY, LOG_CATEGORY, MAX_LOG_LEVEL, RECORD_CATEGORY, SETTINGS_FILE,
};
pub use error::{CoreError, CoreResult};
pub use reconstruct::{
    reconstruct, CategoryRecord, ConfigSection, ConfigTree, IncludeLoader, NoIncludes,
    Reconstruction, Reconstructor, INCLUDE_DIRECTIVE,
};
pub use records::{CdrRecord, CelRecord, RecordLogger, ToDocument};
pub use row::{LookupTerm, Operator, Row, UnknownOperator};
pub use schema::{RequireType, SchemaRegistry};
pub use translate::{
    make_condition, row_key, store_key, QueryTranslator, MAX_FIELD_TOKEN, PARTITION_FIELD,
    ROW_IDENTITY, STORE_IDENTITY,
};
