//! Document and row conversion.

use crate::error::CoreResult;
use crate::row::Row;
use crate::schema::SchemaRegistry;
use crate::translate::{row_key, store_key, PARTITION_FIELD, STORE_IDENTITY};
use bson::{Bson, Document};
use rtconf_codec::{decode, encode, parse_identity, FieldType};
use tracing::warn;

/// Converts a stored document into a row.
///
/// Fields keep their stored order. The partition field is hidden, `_id`
/// becomes `id`, and values of a runtime type the codec cannot render are
/// skipped with a warning.
#[must_use]
pub fn to_row(document: &Document) -> Row {
    let mut row = Row::new();
    for (key, value) in document {
        if key == PARTITION_FIELD {
            continue;
        }
        match decode(value) {
            Ok(text) => row.set(row_key(key), text),
            Err(err) => warn!(field = %key, error = %err, "field skipped"),
        }
    }
    row
}

/// Converts a row into a new document using the declared types of `table`.
///
/// # Errors
///
/// Returns a codec error if a value does not parse as its declared type.
pub fn to_document(schema: &SchemaRegistry, table: &str, row: &Row) -> CoreResult<Document> {
    let mut document = Document::new();
    append_fields(schema, table, row, &mut document)?;
    Ok(document)
}

/// Appends the encoded fields of `row` to `document`.
///
/// Empty values and the partition field are never written; the partition
/// is owned by the bridge. An `id` holding a valid identity
/// literal is written as a native identity; any other `id` is a string.
/// Other fields take their declared type, or the inferred one when
/// undeclared.
///
/// # Errors
///
/// Returns a codec error if a value does not parse as its declared type.
pub fn append_fields(
    schema: &SchemaRegistry,
    table: &str,
    row: &Row,
    document: &mut Document,
) -> CoreResult<()> {
    for (name, value) in row.iter() {
        if value.is_empty() {
            continue;
        }
        let key = store_key(name);
        if key == PARTITION_FIELD {
            continue;
        }
        let encoded = if key == STORE_IDENTITY {
            parse_identity(value)
                .map_or_else(|| Bson::String(value.to_string()), Bson::ObjectId)
        } else {
            encode(schema.lookup_type(table, key, value), value)?
        };
        document.insert(key, encoded);
    }
    Ok(())
}

/// Declared or inferred types a row would be written with.
#[must_use]
pub fn write_types(schema: &SchemaRegistry, table: &str, row: &Row) -> Vec<(String, FieldType)> {
    row.iter()
        .filter(|(name, value)| !value.is_empty() && *name != PARTITION_FIELD)
        .map(|(name, value)| {
            let key = store_key(name);
            (key.to_string(), schema.lookup_type(table, key, value))
        })
        .collect()
}
