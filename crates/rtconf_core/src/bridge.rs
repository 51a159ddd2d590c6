//! The data access facade.

use crate::config::{BridgeSettings, ConfigSource, SETTINGS_FILE};
use crate::error::{CoreError, CoreResult};
use crate::mapper::{append_fields, to_document, to_row};
use crate::reconstruct::{
    reconstruct, CategoryRecord, ConfigSection, ConfigTree, IncludeLoader, Reconstructor,
};
use crate::row::{LookupTerm, Row};
use crate::schema::{RequireType, SchemaRegistry};
use crate::translate::QueryTranslator;
use bson::oid::ObjectId;
use bson::{doc, Document};
use parking_lot::RwLock;
use rtconf_codec::FieldType;
use rtconf_store::{ClientPool, Collection, FindOptions, PooledClient, Query};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// How deep include directives may nest before a load gives up.
pub const MAX_INCLUDE_DEPTH: usize = 8;

/// Creates a client pool from connection settings.
pub trait PoolConnector {
    /// Opens a pool for `settings`.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot be created.
    fn connect(&self, settings: &BridgeSettings) -> CoreResult<Arc<dyn ClientPool>>;
}

impl<F> PoolConnector for F
where
    F: Fn(&BridgeSettings) -> CoreResult<Arc<dyn ClientPool>>,
{
    fn connect(&self, settings: &BridgeSettings) -> CoreResult<Arc<dyn ClientPool>> {
        self(settings)
    }
}

struct Connection {
    pool: Arc<dyn ClientPool>,
    translator: QueryTranslator,
}

/// Relational-style realtime lookups over a document store.
///
/// Every operation borrows one client from the pool, resolves the
/// collection, translates its input, runs one store call and returns the
/// client before returning, on success and on every failure path.
///
/// The schema registry lives as long as the bridge; a reload replaces
/// only the pool and the partition.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use rtconf_core::{LookupTerm, RealtimeBridge, Row};
/// use rtconf_store::InMemoryPool;
///
/// let pool = InMemoryPool::new();
/// let bridge = RealtimeBridge::new(Arc::new(pool.clone()), None);
///
/// let row = Row::new().with("id", "6001").with("context", "default");
/// bridge.insert("asterisk", "ps_endpoints", &row).unwrap();
///
/// let found = bridge
///     .find_one("asterisk", "ps_endpoints", &[LookupTerm::equals("id", "6001")])
///     .unwrap();
/// assert_eq!(found, Some(row));
/// assert_eq!(pool.outstanding(), 0);
/// ```
pub struct RealtimeBridge {
    schema: SchemaRegistry,
    connection: RwLock<Option<Arc<Connection>>>,
}

impl RealtimeBridge {
    /// Creates a bridge over `pool`, optionally scoped to `partition`.
    pub fn new(pool: Arc<dyn ClientPool>, partition: Option<ObjectId>) -> Self {
        Self::with_connection(Some(Connection {
            pool,
            translator: QueryTranslator::new(partition),
        }))
    }

    /// Creates a bridge with no pool; every operation fails until a
    /// successful [`RealtimeBridge::reload`].
    #[must_use]
    pub fn unconnected() -> Self {
        Self::with_connection(None)
    }

    /// Creates a bridge from the `[config]` settings in `source`.
    ///
    /// # Errors
    ///
    /// Returns the settings or connector error.
    pub fn connect(source: &dyn ConfigSource, connector: &dyn PoolConnector) -> CoreResult<Self> {
        let connection = Self::open(source, connector)?;
        Ok(Self::with_connection(Some(connection)))
    }

    fn with_connection(connection: Option<Connection>) -> Self {
        Self {
            schema: SchemaRegistry::new(),
            connection: RwLock::new(connection.map(Arc::new)),
        }
    }

    fn open(source: &dyn ConfigSource, connector: &dyn PoolConnector) -> CoreResult<Connection> {
        let settings = BridgeSettings::from_source(source)?;
        let pool = connector.connect(&settings)?;
        info!(
            partition = ?settings.partition.map(|p| p.to_hex()),
            apm = settings.apm,
            "connection pool ready"
        );
        Ok(Connection {
            pool,
            translator: QueryTranslator::new(settings.partition),
        })
    }

    /// Re-reads settings and swaps in a new pool.
    ///
    /// On failure the previous pool and partition stay active. Declared
    /// schemas are kept either way.
    ///
    /// # Errors
    ///
    /// Returns the settings or connector error.
    pub fn reload(&self, source: &dyn ConfigSource, connector: &dyn PoolConnector) -> CoreResult<()> {
        match Self::open(source, connector) {
            Ok(connection) => {
                *self.connection.write() = Some(Arc::new(connection));
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "reload failed, previous configuration kept");
                Err(err)
            }
        }
    }

    /// Returns true if a pool is configured.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection.read().is_some()
    }

    /// The active partition identifier.
    #[must_use]
    pub fn partition(&self) -> Option<ObjectId> {
        self.connection
            .read()
            .as_ref()
            .and_then(|c| c.translator.partition())
    }

    /// The schema registry.
    #[must_use]
    pub fn schema(&self) -> &SchemaRegistry {
        &self.schema
    }

    /// Declares field types for `table`; first declaration of a field wins.
    ///
    /// Returns the number of fields newly declared.
    pub fn declare_schema<S: AsRef<str>>(
        &self,
        table: &str,
        fields: impl IntoIterator<Item = (S, FieldType)>,
    ) -> usize {
        self.schema.declare_all(table, fields)
    }

    /// Registers `table` from the framework's require call.
    ///
    /// Returns false if the table was already registered.
    pub fn declare_required<S: AsRef<str>>(
        &self,
        table: &str,
        fields: impl IntoIterator<Item = (S, RequireType)>,
    ) -> bool {
        self.schema.require(table, fields)
    }

    /// Returns the first row matching `terms`.
    ///
    /// # Errors
    ///
    /// Returns an error if no client is available, the terms cannot be
    /// translated, or the store rejects the query.
    pub fn find_one(
        &self,
        database: &str,
        table: &str,
        terms: &[LookupTerm],
    ) -> CoreResult<Option<Row>> {
        self.run("find_one", database, table, |translator, collection| {
            require_terms(terms)?;
            let query = translator.translate(terms, None)?;
            let mut cursor = collection.find(&query, &FindOptions::default().limit(1))?;
            let Some(document) = cursor.next().transpose()? else {
                return Ok(None);
            };
            debug!(document = %document, "query found");
            let row = to_row(&document);
            Ok((!row.is_empty()).then_some(row))
        })
    }

    /// Returns every row matching `terms`, sorted by `sort_field` when
    /// given.
    ///
    /// # Errors
    ///
    /// Returns an error if no client is available, the terms cannot be
    /// translated, or the store rejects the query.
    pub fn find_many(
        &self,
        database: &str,
        table: &str,
        terms: &[LookupTerm],
        sort_field: Option<&str>,
    ) -> CoreResult<Vec<Row>> {
        self.run("find_many", database, table, |translator, collection| {
            require_terms(terms)?;
            let query = translator.translate(terms, sort_field)?;
            let mut rows = Vec::new();
            for document in collection.find(&query, &FindOptions::default())? {
                let document = document?;
                debug!(document = %document, "query found");
                rows.push(to_row(&document));
            }
            Ok(rows)
        })
    }

    /// Multi-row lookup shaped as configuration sections.
    ///
    /// Results are sorted by the first term's field, and each row becomes
    /// a section named after its value of that field.
    ///
    /// # Errors
    ///
    /// Same as [`RealtimeBridge::find_many`].
    pub fn find_many_as_config(
        &self,
        database: &str,
        table: &str,
        terms: &[LookupTerm],
    ) -> CoreResult<ConfigTree> {
        self.run("find_many_as_config", database, table, |translator, collection| {
            require_terms(terms)?;
            let key = terms[0].name();
            let query = translator.translate(terms, Some(key))?;
            let mut tree = ConfigTree::new();
            for document in collection.find(&query, &FindOptions::default())? {
                let row = to_row(&document?);
                let mut section = ConfigSection::new(row.get(key).unwrap_or_default());
                for (name, value) in row.iter() {
                    section.push(name, value);
                }
                tree.push(section);
            }
            Ok(tree)
        })
    }

    /// Inserts `row` as a new document.
    ///
    /// # Errors
    ///
    /// Returns an error if no client is available, a value does not match
    /// its declared type, or the store rejects the insert.
    pub fn insert(&self, database: &str, table: &str, row: &Row) -> CoreResult<()> {
        self.run("insert", database, table, |translator, collection| {
            let mut document = translator.seed();
            append_fields(&self.schema, table, row, &mut document)?;
            debug!(document = %document, "insert");
            collection.insert_one(document)?;
            Ok(())
        })
    }

    /// Sets the fields of `row` on every document whose `key_field`
    /// equals `lookup`.
    ///
    /// Returns the store-reported count of modified documents.
    ///
    /// # Errors
    ///
    /// Returns an error if no client is available, the row has nothing to
    /// set, a value does not match its declared type, or the store rejects
    /// the update.
    pub fn update(
        &self,
        database: &str,
        table: &str,
        key_field: &str,
        lookup: &str,
        row: &Row,
    ) -> CoreResult<u64> {
        self.run("update", database, table, |translator, collection| {
            let selector = translator.key_selector(key_field, lookup);
            let update = set_update(to_document(&self.schema, table, row)?)?;
            modify(collection, &selector, &update)
        })
    }

    /// Sets the fields of `row` on every document matching `terms`.
    ///
    /// Terms whose field token has more than two parts are skipped.
    ///
    /// # Errors
    ///
    /// Same as [`RealtimeBridge::update`], plus unsupported operators.
    pub fn update_many(
        &self,
        database: &str,
        table: &str,
        terms: &[LookupTerm],
        row: &Row,
    ) -> CoreResult<u64> {
        self.run("update_many", database, table, |translator, collection| {
            require_terms(terms)?;
            let selector = translator.translate_selector(terms)?;
            let update = set_update(to_document(&self.schema, table, row)?)?;
            modify(collection, &selector, &update)
        })
    }

    /// Removes at most one document whose `key_field` equals `lookup`.
    ///
    /// Returns the number of removed documents.
    ///
    /// # Errors
    ///
    /// Returns an error if no client is available or the store rejects the
    /// delete.
    pub fn delete(&self, database: &str, table: &str, key_field: &str, lookup: &str) -> CoreResult<u64> {
        self.run("delete", database, table, |translator, collection| {
            let selector = translator.key_selector(key_field, lookup);
            debug!(selector = %selector, "delete");
            Ok(collection.delete_one(&selector)?)
        })
    }

    /// Loads a static configuration file stored in `table`.
    ///
    /// Returns `Ok(None)` for the bridge's own settings file. A failed
    /// include stops the load; the sections read up to that point are
    /// still returned.
    ///
    /// # Errors
    ///
    /// Returns an error if no client is available or the store rejects the
    /// query.
    pub fn load_static(
        &self,
        database: &str,
        table: &str,
        file: &str,
        includes: &mut dyn IncludeLoader,
    ) -> CoreResult<Option<ConfigTree>> {
        if file == SETTINGS_FILE {
            debug!(file, "refusing to load the settings file from itself");
            return Ok(None);
        }
        let records = self.static_records(database, table, file)?;
        let result = reconstruct(records, includes);
        if let Some(err) = &result.interrupted {
            warn!(file, error = %err, "load ended at include");
        }
        Ok(Some(result.tree))
    }

    /// Cache purge hook. Nothing is cached, so this always returns false.
    #[must_use]
    pub fn purge_cache(&self, database: &str, table: &str) -> bool {
        debug!(database, table, "no cache to purge");
        false
    }

    fn static_records(&self, database: &str, table: &str, file: &str) -> CoreResult<Vec<CategoryRecord>> {
        self.run("load", database, table, |translator, collection| {
            let mut filter = translator.seed();
            filter.insert("filename", file);
            filter.insert("commented", 0.0);
            let query = Query::new(filter).with_sort(doc! {
                "cat_metric": -1.0,
                "var_metric": 1.0,
                "category": 1.0,
                "var_name": 1.0,
            });
            let options = FindOptions::default().projection(doc! {
                "cat_metric": 1.0,
                "category": 1.0,
                "var_name": 1.0,
                "var_val": 1.0,
            });
            debug!(query = %query.to_modifiers(), "static load");

            let mut records = Vec::new();
            for document in collection.find(&query, &options)? {
                let document = document?;
                match CategoryRecord::from_document(&document) {
                    Ok(record) => records.push(record),
                    Err(err) => {
                        error!(file, error = %err, "unreadable record, load stopped");
                        break;
                    }
                }
            }
            Ok(records)
        })
    }

    fn current(&self) -> CoreResult<Arc<Connection>> {
        self.connection
            .read()
            .clone()
            .ok_or_else(|| CoreError::ClientUnavailable {
                message: "no connection pool".to_string(),
            })
    }

    /// Borrows a client, resolves the collection and runs `operation`.
    ///
    /// The client guard is dropped before this returns, whatever the
    /// outcome.
    fn run<T>(
        &self,
        name: &'static str,
        database: &str,
        table: &str,
        operation: impl FnOnce(&QueryTranslator, &dyn Collection) -> CoreResult<T>,
    ) -> CoreResult<T> {
        debug!(operation = name, database, table, "start");
        let result = self.current().and_then(|connection| {
            let client = PooledClient::borrow(&*connection.pool)?;
            let collection = client.collection(database, table)?;
            operation(&connection.translator, &*collection)
        });
        if let Err(err) = &result {
            error!(operation = name, database, table, error = %err, "operation failed");
        }
        result
    }
}

impl fmt::Debug for RealtimeBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RealtimeBridge")
            .field("connected", &self.is_connected())
            .field("partition", &self.partition())
            .finish_non_exhaustive()
    }
}

fn require_terms(terms: &[LookupTerm]) -> CoreResult<()> {
    if terms.is_empty() {
        Err(CoreError::translation("", "no lookup terms given"))
    } else {
        Ok(())
    }
}

fn set_update(fields: Document) -> CoreResult<Document> {
    if fields.is_empty() {
        return Err(CoreError::translation("", "no fields to update"));
    }
    Ok(doc! { "$set": fields })
}

fn modify(collection: &dyn Collection, selector: &Document, update: &Document) -> CoreResult<u64> {
    debug!(selector = %selector, update = %update, "update");
    let modified = collection.update_many(selector, update)?;
    debug!(modified, "update done");
    Ok(modified)
}

/// Resolves include directives from the same table as the outer load.
///
/// Nesting is limited to [`MAX_INCLUDE_DEPTH`] levels, and the settings
/// file is never included.
#[derive(Debug)]
pub struct TableIncludes<'b> {
    bridge: &'b RealtimeBridge,
    database: String,
    table: String,
    depth: usize,
}

impl<'b> TableIncludes<'b> {
    /// Creates a loader reading from `database`.`table` through `bridge`.
    pub fn new(bridge: &'b RealtimeBridge, database: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            bridge,
            database: database.into(),
            table: table.into(),
            depth: 0,
        }
    }
}

impl IncludeLoader for TableIncludes<'_> {
    fn include(&mut self, resource: &str, tree: &mut ConfigTree) -> CoreResult<()> {
        if resource == SETTINGS_FILE {
            return Err(CoreError::include(resource, "the settings file cannot be included"));
        }
        if self.depth >= MAX_INCLUDE_DEPTH {
            return Err(CoreError::include(resource, "includes nested too deeply"));
        }
        let records = self
            .bridge
            .static_records(&self.database, &self.table, resource)
            .map_err(|err| CoreError::include(resource, err.to_string()))?;

        self.depth += 1;
        let mut nested = Reconstructor::with_tree(std::mem::take(tree));
        let mut outcome = Ok(());
        for record in records {
            if let Err(err) = nested.push(record, &mut *self) {
                outcome = Err(err);
                break;
            }
        }
        self.depth -= 1;
        *tree = nested.finish();
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StaticSource;
    use crate::reconstruct::NoIncludes;
    use crate::translate::PARTITION_FIELD;
    use rtconf_store::InMemoryPool;

    const DB: &str = "asterisk";

    fn bridge() -> (InMemoryPool, RealtimeBridge) {
        let pool = InMemoryPool::new();
        let bridge = RealtimeBridge::new(Arc::new(pool.clone()), None);
        (pool, bridge)
    }

    #[test]
    fn insert_then_find() {
        let (pool, bridge) = bridge();
        let row = Row::new()
            .with("id", "alice")
            .with("context", "default")
            .with("max_contacts", "1");
        bridge.insert(DB, "ps_aors", &row).unwrap();

        let stored = pool.documents(DB, "ps_aors");
        assert_eq!(stored[0], doc! { "_id": "alice", "context": "default", "max_contacts": 1.0 });

        let found = bridge
            .find_one(DB, "ps_aors", &[LookupTerm::equals("id", "alice")])
            .unwrap();
        assert_eq!(found, Some(row));
        assert_eq!(pool.checkouts(), 2);
        assert_eq!(pool.outstanding(), 0);
    }

    #[test]
    fn find_one_without_match() {
        let (_pool, bridge) = bridge();
        let found = bridge
            .find_one(DB, "ps_aors", &[LookupTerm::equals("id", "nobody")])
            .unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn find_many_sorted() {
        let (pool, bridge) = bridge();
        pool.seed(
            DB,
            "sippeers",
            [
                doc! { "name": "b", "host": "dynamic" },
                doc! { "name": "a", "host": "dynamic" },
                doc! { "name": "c", "host": "10.0.0.1" },
            ],
        );
        let rows = bridge
            .find_many(DB, "sippeers", &[LookupTerm::equals("host", "dynamic")], Some("name"))
            .unwrap();
        let names: Vec<_> = rows.iter().filter_map(|r| r.get("name")).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn multi_lookup_as_sections() {
        let (pool, bridge) = bridge();
        pool.seed(
            DB,
            "extensions",
            [
                doc! { "exten": "200", "context": "default", "app": "Dial" },
                doc! { "exten": "100", "context": "default", "app": "Answer" },
            ],
        );
        let tree = bridge
            .find_many_as_config(DB, "extensions", &[LookupTerm::new("exten LIKE", "%")])
            .unwrap();
        let names: Vec<_> = tree.sections().iter().map(ConfigSection::name).collect();
        assert_eq!(names, ["100", "200"]);
        assert_eq!(tree.sections()[0].get("app"), Some("Answer"));
    }

    #[test]
    fn update_and_delete_by_key() {
        let (pool, bridge) = bridge();
        pool.seed(
            DB,
            "sippeers",
            [
                doc! { "name": "a", "ipaddr": "" },
                doc! { "name": "b", "ipaddr": "" },
            ],
        );
        let row = Row::new().with("ipaddr", "10.0.0.9").with("port", "");
        assert_eq!(bridge.update(DB, "sippeers", "name", "a", &row).unwrap(), 1);
        assert_eq!(bridge.update(DB, "sippeers", "name", "a", &row).unwrap(), 0);

        let terms = [LookupTerm::new("name !=", "a")];
        assert_eq!(bridge.update_many(DB, "sippeers", &terms, &row).unwrap(), 1);

        assert_eq!(bridge.delete(DB, "sippeers", "name", "a").unwrap(), 1);
        assert_eq!(bridge.delete(DB, "sippeers", "name", "a").unwrap(), 0);
        assert_eq!(pool.documents(DB, "sippeers").len(), 1);
        assert_eq!(pool.outstanding(), 0);
    }

    #[test]
    fn identity_rows_are_writable_by_id() {
        let (pool, bridge) = bridge();
        let hex = "5a1b2c3d4e5f60718293a4b5";
        let row = Row::new().with("id", hex).with("context", "a");
        bridge.insert(DB, "ps_endpoints", &row).unwrap();

        let by_id = [LookupTerm::equals("id", hex)];
        assert_eq!(bridge.find_one(DB, "ps_endpoints", &by_id).unwrap(), Some(row));

        let change = Row::new().with("context", "b");
        assert_eq!(bridge.update(DB, "ps_endpoints", "id", hex, &change).unwrap(), 1);
        let found = bridge.find_one(DB, "ps_endpoints", &by_id).unwrap().unwrap();
        assert_eq!(found.get("context"), Some("b"));

        assert_eq!(bridge.delete(DB, "ps_endpoints", "id", hex).unwrap(), 1);
        assert!(pool.documents(DB, "ps_endpoints").is_empty());
        assert_eq!(pool.outstanding(), 0);
    }

    #[test]
    fn rows_cannot_move_partitions() {
        let ours = ObjectId::new();
        let pool = InMemoryPool::new();
        let bridge = RealtimeBridge::new(Arc::new(pool.clone()), Some(ours));
        let foreign = ObjectId::new().to_hex();

        let row = Row::new()
            .with("id", "6001")
            .with("serverid", foreign.as_str())
            .with("context", "a");
        bridge.insert(DB, "ps_endpoints", &row).unwrap();
        let change = Row::new().with("serverid", foreign.as_str()).with("context", "b");
        assert_eq!(bridge.update(DB, "ps_endpoints", "id", "6001", &change).unwrap(), 1);

        let stored = pool.documents(DB, "ps_endpoints");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].get_object_id(PARTITION_FIELD).unwrap(), ours);
        assert_eq!(stored[0].get_str("context").unwrap(), "b");
    }

    #[test]
    fn update_needs_fields() {
        let (pool, bridge) = bridge();
        let err = bridge
            .update(DB, "sippeers", "name", "a", &Row::new().with("ipaddr", ""))
            .unwrap_err();
        assert!(matches!(err, CoreError::Translation { .. }));
        assert_eq!(pool.checkins(), 1);
    }

    #[test]
    fn partition_scopes_reads_and_writes() {
        let pool = InMemoryPool::new();
        let mine = ObjectId::new();
        let theirs = ObjectId::new();
        pool.seed(DB, "ps_aors", [doc! { "_id": "6001", "serverid": theirs }]);
        let bridge = RealtimeBridge::new(Arc::new(pool.clone()), Some(mine));

        let terms = [LookupTerm::equals("id", "6001")];
        assert_eq!(bridge.find_one(DB, "ps_aors", &terms).unwrap(), None);

        bridge
            .insert(DB, "ps_aors", &Row::new().with("id", "6002"))
            .unwrap();
        let stored = pool.documents(DB, "ps_aors");
        assert_eq!(stored[1], doc! { "serverid": mine, "_id": "6002" });

        let found = bridge
            .find_one(DB, "ps_aors", &[LookupTerm::equals("id", "6002")])
            .unwrap()
            .unwrap();
        assert_eq!(found, Row::new().with("id", "6002"));
        assert_eq!(bridge.delete(DB, "ps_aors", "id", "6001").unwrap(), 0);
    }

    #[test]
    fn settings_file_is_never_loaded() {
        let (pool, bridge) = bridge();
        let loaded = bridge
            .load_static(DB, "ast_config", SETTINGS_FILE, &mut NoIncludes)
            .unwrap();
        assert!(loaded.is_none());
        assert_eq!(pool.checkouts(), 0);
    }

    #[test]
    fn unconnected_bridge_fails_cleanly() {
        let bridge = RealtimeBridge::unconnected();
        let err = bridge
            .find_one(DB, "t", &[LookupTerm::equals("a", "b")])
            .unwrap_err();
        assert!(err.is_client_unavailable());
        assert!(!bridge.purge_cache(DB, "t"));
    }

    #[test]
    fn reload_keeps_previous_pool_on_failure() {
        let first = InMemoryPool::new();
        let second = InMemoryPool::new();
        let partition = ObjectId::new();
        let connector = {
            let second = second.clone();
            move |_: &BridgeSettings| -> CoreResult<Arc<dyn ClientPool>> { Ok(Arc::new(second.clone())) }
        };
        let bridge = RealtimeBridge::new(Arc::new(first.clone()), None);
        bridge.declare_schema("t", [("n", FieldType::Int32)]);

        let bad = StaticSource::new().with("config", "uri", "redis://nope");
        assert!(bridge.reload(&bad, &connector).is_err());
        bridge.insert(DB, "t", &Row::new().with("n", "1")).unwrap();
        assert_eq!(first.documents(DB, "t").len(), 1);

        let good = StaticSource::new()
            .with("config", "uri", "mongodb://localhost")
            .with("config", "serverid", partition.to_hex());
        bridge.reload(&good, &connector).unwrap();
        assert_eq!(bridge.partition(), Some(partition));
        bridge.insert(DB, "t", &Row::new().with("n", "2")).unwrap();
        let stored = second.documents(DB, "t");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].get_object_id("serverid").unwrap(), partition);
        assert_eq!(stored[0].get_i32("n").unwrap(), 2);
        assert_eq!(bridge.schema().declared_type("t", "n"), Some(FieldType::Int32));
    }
}
