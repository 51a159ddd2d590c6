//! Filter, sort, projection and update evaluation for the in-memory backend.
//!
//! Covers the operator subset the bridge emits plus a few neighbours
//! (`$gte`, `$lt`, `$in`). Comparison follows document-store type
//! bracketing: range operators only match values of the same class as
//! their argument (numbers with numbers, strings with strings).

use crate::error::{StoreError, StoreResult};
use bson::{Bson, Document};
use regex::RegexBuilder;
use std::cmp::Ordering;

/// Returns whether `document` satisfies every clause of `filter`.
pub(crate) fn matches(document: &Document, filter: &Document) -> StoreResult<bool> {
    for (field, condition) in filter {
        if !field_matches(document.get(field), condition)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn field_matches(value: Option<&Bson>, condition: &Bson) -> StoreResult<bool> {
    match condition {
        Bson::Document(ops) if is_operator_document(ops) => operators_match(value, ops),
        Bson::RegularExpression(re) => regex_match(value, &re.pattern, &re.options),
        other => Ok(value.is_some_and(|v| values_equal(v, other))),
    }
}

fn is_operator_document(document: &Document) -> bool {
    document.keys().next().is_some_and(|k| k.starts_with('$'))
}

fn operators_match(value: Option<&Bson>, ops: &Document) -> StoreResult<bool> {
    for (op, arg) in ops {
        let ok = match op.as_str() {
            "$eq" => value.is_some_and(|v| values_equal(v, arg)),
            "$ne" => !value.is_some_and(|v| values_equal(v, arg)),
            "$gt" => compare_with(value, arg, Ordering::is_gt),
            "$gte" => compare_with(value, arg, Ordering::is_ge),
            "$lt" => compare_with(value, arg, Ordering::is_lt),
            "$lte" => compare_with(value, arg, Ordering::is_le),
            "$exists" => value.is_some() == truthy(arg),
            "$in" => match arg {
                Bson::Array(candidates) => {
                    value.is_some_and(|v| candidates.iter().any(|c| values_equal(v, c)))
                }
                _ => return Err(StoreError::InvalidQuery("$in needs an array".into())),
            },
            "$size" => match (value, as_i64(arg)) {
                (Some(Bson::Array(items)), Some(n)) => i64::try_from(items.len()) == Ok(n),
                (_, None) => return Err(StoreError::InvalidQuery("$size needs a number".into())),
                _ => false,
            },
            "$not" => !field_matches(value, arg)?,
            "$regex" => {
                let pattern = arg
                    .as_str()
                    .ok_or_else(|| StoreError::InvalidQuery("$regex needs a string".into()))?;
                let options = ops.get_str("$options").unwrap_or("");
                regex_match(value, pattern, options)?
            }
            "$options" => true,
            other => return Err(StoreError::UnsupportedOperator(other.to_string())),
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn regex_match(value: Option<&Bson>, pattern: &str, options: &str) -> StoreResult<bool> {
    let Some(Bson::String(text)) = value else {
        return Ok(false);
    };
    let re = RegexBuilder::new(pattern)
        .case_insensitive(options.contains('i'))
        .multi_line(options.contains('m'))
        .build()
        .map_err(|e| StoreError::InvalidQuery(e.to_string()))?;
    Ok(re.is_match(text))
}

fn compare_with(value: Option<&Bson>, arg: &Bson, accept: fn(Ordering) -> bool) -> bool {
    value
        .and_then(|v| compare_same_class(v, arg))
        .is_some_and(accept)
}

fn truthy(value: &Bson) -> bool {
    match value {
        Bson::Boolean(b) => *b,
        Bson::Null => false,
        other => as_f64(other).map_or(true, |n| n != 0.0),
    }
}

fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Double(d) => Some(*d),
        #[allow(clippy::cast_precision_loss)]
        Bson::Int64(n) => Some(*n as f64),
        Bson::Int32(n) => Some(f64::from(*n)),
        _ => None,
    }
}

fn as_i64(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(n) => Some(i64::from(*n)),
        Bson::Int64(n) => Some(*n),
        #[allow(clippy::cast_possible_truncation)]
        Bson::Double(d) if d.fract() == 0.0 => Some(*d as i64),
        _ => None,
    }
}

/// Equality with numeric values compared across integer and double widths.
pub(crate) fn values_equal(a: &Bson, b: &Bson) -> bool {
    match (as_f64(a), as_f64(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn compare_same_class(a: &Bson, b: &Bson) -> Option<Ordering> {
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => Some(x.cmp(y)),
        (Bson::Boolean(x), Bson::Boolean(y)) => Some(x.cmp(y)),
        (Bson::ObjectId(x), Bson::ObjectId(y)) => Some(x.bytes().cmp(&y.bytes())),
        _ => as_f64(a).zip(as_f64(b)).and_then(|(x, y)| x.partial_cmp(&y)),
    }
}

/// Rank of a value's type in the store's cross-type sort order.
fn type_rank(value: Option<&Bson>) -> u8 {
    match value {
        None | Some(Bson::Null) => 0,
        Some(Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_)) => 1,
        Some(Bson::String(_)) => 2,
        Some(Bson::Document(_)) => 3,
        Some(Bson::Array(_)) => 4,
        Some(Bson::ObjectId(_)) => 5,
        Some(Bson::Boolean(_)) => 6,
        Some(Bson::DateTime(_)) => 7,
        Some(_) => 8,
    }
}

fn compare_for_sort(a: Option<&Bson>, b: Option<&Bson>) -> Ordering {
    let rank = type_rank(a).cmp(&type_rank(b));
    if rank != Ordering::Equal {
        return rank;
    }
    match (a, b) {
        (Some(Bson::DateTime(x)), Some(Bson::DateTime(y))) => x.cmp(y),
        (Some(x), Some(y)) => compare_same_class(x, y).unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    }
}

/// Sorts `documents` in place by `sort`; ties keep insertion order.
pub(crate) fn sort_documents(documents: &mut [Document], sort: &Document) {
    if sort.is_empty() {
        return;
    }
    documents.sort_by(|a, b| {
        for (field, direction) in sort {
            let ord = compare_for_sort(a.get(field), b.get(field));
            let descending = as_f64(direction).is_some_and(|d| d < 0.0);
            let ord = if descending { ord.reverse() } else { ord };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
}

/// Applies an inclusion projection; `_id` is always kept.
pub(crate) fn project(document: Document, projection: &Document) -> Document {
    document
        .into_iter()
        .filter(|(key, _)| {
            key == "_id" || projection.get(key).is_some_and(truthy)
        })
        .collect()
}

/// Applies a `$set` update. Returns whether the document changed.
pub(crate) fn apply_update(document: &mut Document, update: &Document) -> StoreResult<bool> {
    let mut changed = false;
    for (op, arg) in update {
        if op != "$set" {
            return Err(StoreError::UnsupportedOperator(op.clone()));
        }
        let fields = arg
            .as_document()
            .ok_or_else(|| StoreError::InvalidQuery("$set needs a document".into()))?;
        for (key, value) in fields {
            if document.get(key) != Some(value) {
                document.insert(key.clone(), value.clone());
                changed = true;
            }
        }
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use proptest::prelude::*;

    fn endpoint() -> Document {
        doc! {
            "_id": "6001",
            "context": "default",
            "max_contacts": 10.0,
            "allow": "ulaw",
            "direct_media": false,
        }
    }

    #[test]
    fn implicit_equality() {
        assert!(matches(&endpoint(), &doc! { "_id": "6001" }).unwrap());
        assert!(!matches(&endpoint(), &doc! { "_id": "6002" }).unwrap());
        assert!(matches(&endpoint(), &doc! { "max_contacts": 10 }).unwrap());
    }

    #[test]
    fn range_operators_bracket_types() {
        assert!(matches(&endpoint(), &doc! { "max_contacts": { "$gt": 5_i64 } }).unwrap());
        assert!(matches(&endpoint(), &doc! { "max_contacts": { "$lte": 10_i64 } }).unwrap());
        assert!(!matches(&endpoint(), &doc! { "max_contacts": { "$gt": "5" } }).unwrap());
        assert!(matches(&endpoint(), &doc! { "context": { "$gt": "abc" } }).unwrap());
    }

    #[test]
    fn exists_and_not_equal() {
        let filter = doc! { "allow": { "$exists": true, "$ne": "alaw" } };
        assert!(matches(&endpoint(), &filter).unwrap());
        let filter = doc! { "missing": { "$exists": true, "$ne": "alaw" } };
        assert!(!matches(&endpoint(), &filter).unwrap());
    }

    #[test]
    fn regex_and_not_size() {
        assert!(matches(&endpoint(), &doc! { "context": { "$regex": "^def" } }).unwrap());
        assert!(matches(&endpoint(), &doc! { "context": { "$regex": "ult$" } }).unwrap());
        assert!(!matches(&endpoint(), &doc! { "context": { "$regex": "^ult" } }).unwrap());
        let nonempty = doc! { "allow": { "$exists": true, "$not": { "$size": 0 } } };
        assert!(matches(&endpoint(), &nonempty).unwrap());
    }

    #[test]
    fn unknown_operator_is_rejected() {
        let err = matches(&endpoint(), &doc! { "allow": { "$where": "1" } }).unwrap_err();
        assert_eq!(err, StoreError::UnsupportedOperator("$where".into()));
    }

    #[test]
    fn sort_descending_then_ascending() {
        let mut docs = vec![
            doc! { "cat_metric": 0.0, "var_name": "b" },
            doc! { "cat_metric": 1.0, "var_name": "z" },
            doc! { "cat_metric": 1.0, "var_name": "a" },
        ];
        sort_documents(&mut docs, &doc! { "cat_metric": -1.0, "var_name": 1.0 });
        let names: Vec<_> = docs.iter().map(|d| d.get_str("var_name").unwrap()).collect();
        assert_eq!(names, ["a", "z", "b"]);
    }

    #[test]
    fn projection_keeps_id() {
        let projected = project(endpoint(), &doc! { "context": 1.0 });
        assert_eq!(projected, doc! { "_id": "6001", "context": "default" });
    }

    #[test]
    fn set_reports_change() {
        let mut document = endpoint();
        assert!(!apply_update(&mut document, &doc! { "$set": { "allow": "ulaw" } }).unwrap());
        assert!(apply_update(&mut document, &doc! { "$set": { "allow": "alaw" } }).unwrap());
        assert_eq!(document.get_str("allow").unwrap(), "alaw");
        assert!(apply_update(&mut document, &doc! { "$inc": { "n": 1 } }).is_err());
    }

    proptest! {
        #[test]
        fn numeric_equality_ignores_width(n in -1_000_000_i32..1_000_000) {
            let stored = doc! { "port": f64::from(n) };
            let narrow = matches(&stored, &doc! { "port": n }).unwrap();
            let wide = matches(&stored, &doc! { "port": i64::from(n) }).unwrap();
            let text = matches(&stored, &doc! { "port": n.to_string() }).unwrap();
            prop_assert!(narrow);
            prop_assert!(wide);
            prop_assert!(!text);
        }

        #[test]
        fn sort_orders_any_metrics(metrics in prop::collection::vec(-50_i32..50, 0..20)) {
            let mut docs: Vec<Document> = metrics.iter().map(|m| doc! { "cat_metric": *m }).collect();
            sort_documents(&mut docs, &doc! { "cat_metric": -1.0 });
            let sorted: Vec<i32> = docs.iter().map(|d| d.get_i32("cat_metric").unwrap()).collect();
            prop_assert!(sorted.windows(2).all(|w| w[0] >= w[1]));
        }
    }
}
