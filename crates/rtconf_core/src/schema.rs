//! Per-table field type registry.

use parking_lot::Mutex;
use rtconf_codec::{infer, FieldType};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Column types the realtime framework uses when it requires fields.
///
/// The document store keeps every numeric width as a double and every
/// date or character column as a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequireType {
    /// Signed 8-bit integer.
    Integer1,
    /// Unsigned 8-bit integer.
    UInteger1,
    /// Signed 16-bit integer.
    Integer2,
    /// Unsigned 16-bit integer.
    UInteger2,
    /// Signed 24-bit integer.
    Integer3,
    /// Unsigned 24-bit integer.
    UInteger3,
    /// Signed 32-bit integer.
    Integer4,
    /// Unsigned 32-bit integer.
    UInteger4,
    /// Signed 64-bit integer.
    Integer8,
    /// Unsigned 64-bit integer.
    UInteger8,
    /// Floating point.
    Float,
    /// Calendar date.
    Date,
    /// Date and time.
    DateTime,
    /// Character data.
    Char,
    /// A type the bridge does not know.
    Unknown,
}

impl RequireType {
    /// Returns the stored field type, or `None` for [`RequireType::Unknown`].
    #[must_use]
    pub const fn field_type(self) -> Option<FieldType> {
        match self {
            Self::Integer1
            | Self::UInteger1
            | Self::Integer2
            | Self::UInteger2
            | Self::Integer3
            | Self::UInteger3
            | Self::Integer4
            | Self::UInteger4
            | Self::Integer8
            | Self::UInteger8
            | Self::Float => Some(FieldType::Double),
            Self::Date | Self::DateTime | Self::Char => Some(FieldType::String),
            Self::Unknown => None,
        }
    }
}

/// Remembers the declared type of each (table, field) pair.
///
/// Entries are permanent: the first declaration of a pair wins and later
/// declarations of the same pair are ignored. A single mutex guards the
/// whole registry; declarations are rare and lookups are short.
///
/// # Example
///
/// ```rust
/// use rtconf_codec::FieldType;
/// use rtconf_core::SchemaRegistry;
///
/// let schema = SchemaRegistry::new();
/// schema.declare("ps_aors", "max_contacts", FieldType::Int32);
/// schema.declare("ps_aors", "max_contacts", FieldType::Double);
///
/// assert_eq!(schema.lookup_type("ps_aors", "max_contacts", "5"), FieldType::Int32);
/// assert_eq!(schema.lookup_type("ps_aors", "qualify", "yes"), FieldType::String);
/// ```
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    tables: Mutex<HashMap<String, BTreeMap<String, FieldType>>>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `field` of `table` as `field_type` unless already declared.
    ///
    /// Returns `true` if the declaration took effect.
    pub fn declare(&self, table: &str, field: &str, field_type: FieldType) -> bool {
        let mut tables = self.tables.lock();
        let fields = tables.entry(table.to_string()).or_default();
        if let Some(existing) = fields.get(field) {
            if *existing != field_type {
                debug!(table, field, %existing, ignored = %field_type, "field already declared");
            }
            return false;
        }
        fields.insert(field.to_string(), field_type);
        true
    }

    /// Declares several fields of one table at once.
    ///
    /// Returns the number of declarations that took effect.
    pub fn declare_all<S: AsRef<str>>(
        &self,
        table: &str,
        fields: impl IntoIterator<Item = (S, FieldType)>,
    ) -> usize {
        let mut tables = self.tables.lock();
        let declared = tables.entry(table.to_string()).or_default();
        let mut added = 0;
        for (field, field_type) in fields {
            let field = field.as_ref();
            if !declared.contains_key(field) {
                declared.insert(field.to_string(), field_type);
                added += 1;
            }
        }
        added
    }

    /// Registers a whole table from the framework's require call.
    ///
    /// A table that is already registered is left untouched. Fields of
    /// unknown type are logged and skipped.
    pub fn require<S: AsRef<str>>(
        &self,
        table: &str,
        fields: impl IntoIterator<Item = (S, RequireType)>,
    ) -> bool {
        let mut model = BTreeMap::new();
        for (field, require) in fields {
            match require.field_type() {
                Some(field_type) => {
                    model.insert(field.as_ref().to_string(), field_type);
                }
                None => warn!(table, field = field.as_ref(), "unexpected require type"),
            }
        }

        let mut tables = self.tables.lock();
        if tables.contains_key(table) {
            debug!(table, "already registered");
            return false;
        }
        debug!(table, fields = model.len(), "model registered");
        tables.insert(table.to_string(), model);
        true
    }

    /// Returns the declared type of a field, if any.
    #[must_use]
    pub fn declared_type(&self, table: &str, field: &str) -> Option<FieldType> {
        self.tables
            .lock()
            .get(table)
            .and_then(|fields| fields.get(field))
            .copied()
    }

    /// Returns the declared type, or the type inferred from `sample`.
    #[must_use]
    pub fn lookup_type(&self, table: &str, field: &str, sample: &str) -> FieldType {
        self.declared_type(table, field)
            .unwrap_or_else(|| infer(sample))
    }

    /// Returns whether anything has been declared for `table`.
    #[must_use]
    pub fn exists(&self, table: &str) -> bool {
        self.tables.lock().contains_key(table)
    }

    /// Returns the declared fields of `table` sorted by name.
    #[must_use]
    pub fn fields(&self, table: &str) -> Vec<(String, FieldType)> {
        self.tables
            .lock()
            .get(table)
            .map(|fields| fields.iter().map(|(k, v)| (k.clone(), *v)).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn first_declaration_wins() {
        let schema = SchemaRegistry::new();
        assert!(schema.declare("t", "f", FieldType::Int32));
        assert!(!schema.declare("t", "f", FieldType::Double));
        assert_eq!(schema.declared_type("t", "f"), Some(FieldType::Int32));
        assert_eq!(schema.lookup_type("t", "f", "1.5"), FieldType::Int32);
    }

    #[test]
    fn undeclared_fields_are_inferred() {
        let schema = SchemaRegistry::new();
        assert!(!schema.exists("t"));
        assert_eq!(schema.lookup_type("t", "f", "true"), FieldType::Bool);
        assert_eq!(schema.lookup_type("t", "f", "42"), FieldType::Double);
        assert_eq!(schema.lookup_type("t", "f", "sip"), FieldType::String);
    }

    #[test]
    fn declare_all_counts_new_fields() {
        let schema = SchemaRegistry::new();
        let added = schema.declare_all(
            "ps_endpoints",
            [("context", FieldType::String), ("rtp_timeout", FieldType::Int32)],
        );
        assert_eq!(added, 2);
        let added = schema.declare_all(
            "ps_endpoints",
            [("context", FieldType::Bool), ("direct_media", FieldType::Bool)],
        );
        assert_eq!(added, 1);
        assert_eq!(
            schema.fields("ps_endpoints"),
            vec![
                ("context".to_string(), FieldType::String),
                ("direct_media".to_string(), FieldType::Bool),
                ("rtp_timeout".to_string(), FieldType::Int32),
            ]
        );
    }

    #[test]
    fn require_maps_column_types() {
        let schema = SchemaRegistry::new();
        assert!(schema.require(
            "sippeers",
            [
                ("port", RequireType::UInteger2),
                ("regseconds", RequireType::Integer8),
                ("lastms", RequireType::Float),
                ("regserver", RequireType::Char),
                ("fullcontact", RequireType::DateTime),
                ("weird", RequireType::Unknown),
            ],
        ));
        assert_eq!(schema.declared_type("sippeers", "port"), Some(FieldType::Double));
        assert_eq!(schema.declared_type("sippeers", "regseconds"), Some(FieldType::Double));
        assert_eq!(schema.declared_type("sippeers", "regserver"), Some(FieldType::String));
        assert_eq!(schema.declared_type("sippeers", "fullcontact"), Some(FieldType::String));
        assert_eq!(schema.declared_type("sippeers", "weird"), None);

        assert!(!schema.require("sippeers", [("port", RequireType::Char)]));
        assert_eq!(schema.declared_type("sippeers", "port"), Some(FieldType::Double));
    }

    #[test]
    fn concurrent_declarations_keep_one_winner() {
        let schema = Arc::new(SchemaRegistry::new());
        let handles: Vec<_> = [FieldType::Int32, FieldType::Double, FieldType::Bool]
            .into_iter()
            .map(|field_type| {
                let schema = Arc::clone(&schema);
                thread::spawn(move || {
                    for _ in 0..100 {
                        schema.declare("t", "f", field_type);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let winner = schema.declared_type("t", "f").unwrap();
        assert!(!schema.declare("t", "f", winner));
        assert_eq!(schema.fields("t").len(), 1);
    }
}
