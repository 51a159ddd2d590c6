//! Test fixtures and pool helpers.
//!
//! Provides seeded pools for realtime lookups and a builder for the
//! documents that back static configuration files.

use bson::oid::ObjectId;
use bson::{doc, Document};
use rtconf_store::InMemoryPool;

/// Database all fixtures live in.
pub const DATABASE: &str = "asterisk";

/// Realtime endpoint table.
pub const ENDPOINTS: &str = "ps_endpoints";

/// Realtime address-of-record table.
pub const AORS: &str = "ps_aors";

/// Table holding static configuration records.
pub const STATIC_TABLE: &str = "ast_config";

/// Builds one endpoint document.
#[must_use]
pub fn endpoint(id: &str, context: &str) -> Document {
    doc! {
        "_id": id,
        "transport": "transport-udp",
        "context": context,
        "disallow": "all",
        "allow": "ulaw,alaw",
        "direct_media": "no",
        "aors": id,
    }
}

/// Four endpoints: three in `default`, one in `office`.
#[must_use]
pub fn pjsip_endpoints() -> Vec<Document> {
    vec![
        endpoint("6001", "default"),
        endpoint("6002", "default"),
        endpoint("6003", "default"),
        endpoint("7001", "office"),
    ]
}

/// One address-of-record per endpoint, with numeric fields stored as
/// doubles.
#[must_use]
pub fn pjsip_aors() -> Vec<Document> {
    ["6001", "6002", "6003", "7001"]
        .into_iter()
        .map(|id| {
            doc! {
                "_id": id,
                "max_contacts": 1.0,
                "qualify_frequency": 60.0,
                "remove_existing": true,
            }
        })
        .collect()
}

/// Tags every document with `serverid` = `partition`.
#[must_use]
pub fn partitioned(documents: Vec<Document>, partition: ObjectId) -> Vec<Document> {
    documents
        .into_iter()
        .map(|mut document| {
            document.insert("serverid", partition);
            document
        })
        .collect()
}

/// A pool holding [`pjsip_endpoints`] and [`pjsip_aors`].
#[must_use]
pub fn seeded_pool() -> InMemoryPool {
    let pool = InMemoryPool::new();
    pool.seed(DATABASE, ENDPOINTS, pjsip_endpoints());
    pool.seed(DATABASE, AORS, pjsip_aors());
    pool
}

/// Builds the stored records of one static configuration file.
///
/// Sections get descending `cat_metric` values in the order they are
/// opened, so a load sorted by descending metric returns them in
/// declaration order.
///
/// # Example
///
/// ```rust
/// use rtconf_testkit::StaticFile;
///
/// let documents = StaticFile::new("extensions.conf")
///     .section("general")
///     .var("static", "yes")
///     .section("default")
///     .include("users.conf")
///     .build();
/// assert_eq!(documents.len(), 2);
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct StaticFile {
    filename: String,
    category: String,
    cat_metric: i32,
    var_metric: i32,
    documents: Vec<Document>,
}

impl StaticFile {
    /// Starts a file with no sections.
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            category: String::new(),
            cat_metric: 1000,
            var_metric: 0,
            documents: Vec::new(),
        }
    }

    /// Opens the next section.
    pub fn section(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self.cat_metric -= 1;
        self.var_metric = 0;
        self
    }

    /// Adds a variable to the open section.
    pub fn var(self, name: &str, value: &str) -> Self {
        self.record(name, value, 0)
    }

    /// Adds a commented-out variable, which loads must ignore.
    pub fn commented(self, name: &str, value: &str) -> Self {
        self.record(name, value, 1)
    }

    /// Adds an include directive for `resource`.
    pub fn include(self, resource: &str) -> Self {
        self.record(resource, "#include", 0)
    }

    /// Returns the documents in insertion order.
    #[must_use]
    pub fn build(self) -> Vec<Document> {
        self.documents
    }

    /// Adds the documents to `table` in `pool`.
    pub fn seed_into(self, pool: &InMemoryPool, table: &str) {
        pool.seed(DATABASE, table, self.build());
    }

    fn record(mut self, name: &str, value: &str, commented: i32) -> Self {
        self.var_metric += 1;
        self.documents.push(doc! {
            "filename": self.filename.as_str(),
            "category": self.category.as_str(),
            "cat_metric": self.cat_metric,
            "var_metric": self.var_metric,
            "var_name": name,
            "var_val": value,
            "commented": commented,
        });
        self
    }
}
