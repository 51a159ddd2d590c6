//! Lookup term to native query translation.
//!
//! A term's field token is split on spaces into a name and an optional
//! operator. Equality terms become plain `field: value` clauses; the other
//! operators become operator documents:
//!
//! | Term                | Clause                                           |
//! |---------------------|--------------------------------------------------|
//! | `name LIKE` = `%`   | `{ $exists: true, $not: { $size: 0 } }`          |
//! | `name LIKE` = `%x%` | `{ $regex: "x" }`                                |
//! | `name LIKE` = `%x`  | `{ $regex: "x$" }`                               |
//! | `name LIKE` = `x%`  | `{ $regex: "^x" }`                               |
//! | `name !=` = `x`     | `{ $exists: true, $ne: "x" }`                    |
//! | `name >` = `5`      | `{ $gt: 5 }` (64-bit int, or string if not one)  |
//! | `name <=` = `5`     | `{ $lte: 5 }` (64-bit int, or string if not one) |
//!
//! Every filter starts with the partition clause when a partition
//! identifier is configured.

use crate::error::{CoreError, CoreResult};
use crate::row::{LookupTerm, Operator};
use bson::oid::ObjectId;
use bson::{doc, Bson, Document};
use rtconf_codec::{parse_identity, parse_integer};
use rtconf_store::Query;
use tracing::{debug, warn};

/// Reserved field holding the partition identifier.
pub const PARTITION_FIELD: &str = "serverid";

/// Identity field name inside the store.
pub const STORE_IDENTITY: &str = "_id";

/// Identity column name inside rows.
pub const ROW_IDENTITY: &str = "id";

/// Longest field token accepted in a lookup term.
pub const MAX_FIELD_TOKEN: usize = 1022;

const MAX_TOKENS: usize = 3;

/// Maps a row field name to its store name.
#[must_use]
pub fn store_key(name: &str) -> &str {
    if name == ROW_IDENTITY {
        STORE_IDENTITY
    } else {
        name
    }
}

/// Maps a store field name to its row name.
#[must_use]
pub fn row_key(name: &str) -> &str {
    if name == STORE_IDENTITY {
        ROW_IDENTITY
    } else {
        name
    }
}

/// Builds the clause for a `LIKE` pattern.
///
/// Only `%` alone, or `%` at the start, end or both ends, is supported.
/// Anything else yields `None`. A backslash escapes the next character,
/// so `\%` stands for a literal percent sign; the literal text is
/// regex-escaped before it goes into the clause.
///
/// # Example
///
/// ```rust
/// use bson::doc;
/// use rtconf_core::make_condition;
///
/// assert_eq!(make_condition("abc%"), Some(doc! { "$regex": "^abc" }));
/// assert_eq!(make_condition("ab%cd"), None);
/// ```
#[must_use]
pub fn make_condition(pattern: &str) -> Option<Document> {
    if pattern == "%" {
        return Some(doc! { "$exists": true, "$not": { "$size": 0 } });
    }
    let leading = pattern.starts_with('%');
    let trailing = pattern.ends_with('%');
    let condition = match (leading, trailing) {
        (true, true) => doc! { "$regex": literal_prefix(&pattern[1..]) },
        (true, false) => doc! { "$regex": format!("{}$", literal_prefix(&pattern[1..])) },
        (false, true) => doc! { "$regex": format!("^{}", literal_prefix(pattern)) },
        (false, false) => {
            warn!(pattern, "not supported condition");
            return None;
        }
    };
    Some(condition)
}

/// Takes text up to the first unescaped `%`, dropping escape backslashes.
fn literal_prefix(text: &str) -> String {
    let mut literal = String::with_capacity(text.len());
    let mut escaping = false;
    for c in text.chars() {
        if escaping {
            literal.push(c);
            escaping = false;
        } else if c == '%' {
            break;
        } else if c == '\\' {
            escaping = true;
        } else {
            literal.push(c);
        }
    }
    regex::escape(&literal)
}

/// How a term whose field token has the wrong number of parts is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TermPolicy {
    /// The whole translation fails.
    Strict,
    /// The term is logged and left out.
    SkipMalformed,
}

/// Converts lookup terms into store queries.
///
/// # Example
///
/// ```rust
/// use bson::doc;
/// use rtconf_core::{LookupTerm, Operator, QueryTranslator};
///
/// let translator = QueryTranslator::new(None);
/// let query = translator
///     .translate(
///         &[
///             LookupTerm::equals("context", "default"),
///             LookupTerm::with_operator("id", Operator::Like, "60%"),
///         ],
///         Some("id"),
///     )
///     .unwrap();
///
/// assert_eq!(
///     query.filter,
///     doc! { "context": "default", "_id": { "$regex": "^60" } }
/// );
/// assert_eq!(query.sort, doc! { "_id": 1.0 });
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryTranslator {
    partition: Option<ObjectId>,
}

impl QueryTranslator {
    /// Creates a translator, optionally scoped to one partition.
    #[must_use]
    pub const fn new(partition: Option<ObjectId>) -> Self {
        Self { partition }
    }

    /// The configured partition identifier.
    #[must_use]
    pub const fn partition(&self) -> Option<ObjectId> {
        self.partition
    }

    /// A fresh document holding only the partition clause, if any.
    #[must_use]
    pub fn seed(&self) -> Document {
        let mut document = Document::new();
        if let Some(partition) = self.partition {
            document.insert(PARTITION_FIELD, partition);
        }
        document
    }

    /// Translates `terms` into a filter, with an ascending sort on
    /// `order_by` when given.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Translation`] if any term has an unsupported
    /// operator, too many parts, or an oversized field token.
    pub fn translate(&self, terms: &[LookupTerm], order_by: Option<&str>) -> CoreResult<Query> {
        let filter = self.filter(terms, TermPolicy::Strict)?;
        let sort = match order_by {
            Some(field) => doc! { store_key(field): 1.0 },
            None => Document::new(),
        };
        let query = Query { filter, sort };
        debug!(query = %query.to_modifiers(), "generated query");
        Ok(query)
    }

    /// Translates the lookup half of a multi-document update.
    ///
    /// Unlike [`QueryTranslator::translate`], a term whose field token does
    /// not split into one or two parts is logged and skipped rather than
    /// failing the whole selector.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Translation`] for unsupported operators and
    /// oversized field tokens.
    pub fn translate_selector(&self, terms: &[LookupTerm]) -> CoreResult<Document> {
        self.filter(terms, TermPolicy::SkipMalformed)
    }

    /// Filter matching `field == value` within the partition.
    ///
    /// The identity field matches a native identity when `value` is a
    /// valid identity literal, the same way rows are written; any other
    /// field or value matches as a plain string.
    #[must_use]
    pub fn key_selector(&self, field: &str, value: &str) -> Document {
        let mut selector = self.seed();
        let key = store_key(field);
        match parse_identity(value) {
            Some(oid) if key == STORE_IDENTITY => selector.insert(key, oid),
            _ => selector.insert(key, value),
        };
        selector
    }

    fn filter(&self, terms: &[LookupTerm], policy: TermPolicy) -> CoreResult<Document> {
        let mut filter = self.seed();
        for term in terms {
            if term.field().len() > MAX_FIELD_TOKEN {
                return Err(CoreError::translation(
                    truncated(term.field()),
                    "field name too long",
                ));
            }
            let tokens: Vec<&str> = term
                .field()
                .split(' ')
                .filter(|t| !t.is_empty())
                .take(MAX_TOKENS)
                .collect();
            match tokens.as_slice() {
                [name] => self.equality(&mut filter, name, term.value()),
                [name, operator] => {
                    let operator = operator
                        .parse::<Operator>()
                        .map_err(|e| CoreError::translation(term.to_string(), e.to_string()))?;
                    if let Some(condition) = condition(operator, term.value()) {
                        add_clause(&mut filter, store_key(name), condition);
                    }
                }
                _ => match policy {
                    TermPolicy::Strict => {
                        return Err(CoreError::translation(term.to_string(), "not handled"));
                    }
                    TermPolicy::SkipMalformed => {
                        warn!(term = %term, "not handled, term skipped");
                    }
                },
            }
        }
        Ok(filter)
    }

    fn equality(&self, filter: &mut Document, name: &str, value: &str) {
        if name == ROW_IDENTITY {
            if let Some(oid) = parse_identity(value) {
                filter.insert(STORE_IDENTITY, oid);
                return;
            }
        }
        add_clause(filter, store_key(name), Bson::String(value.to_string()));
    }
}

/// Clause for an explicit operator; `None` when a `LIKE` pattern is
/// unsupported and the term is dropped.
fn condition(operator: Operator, value: &str) -> Option<Bson> {
    let clause = match operator {
        Operator::Eq => return Some(Bson::String(value.to_string())),
        Operator::Like => return make_condition(value).map(Bson::Document),
        Operator::Ne => doc! { "$exists": true, "$ne": value },
        Operator::Gt => doc! { "$gt": numeric_or_text(value) },
        Operator::Le => doc! { "$lte": numeric_or_text(value) },
    };
    Some(Bson::Document(clause))
}

fn numeric_or_text(value: &str) -> Bson {
    parse_integer(value).map_or_else(|| Bson::String(value.to_string()), Bson::Int64)
}

/// Adds a clause for `key`. Two operator documents on the same key are
/// merged so that range pairs such as `>` and `<=` both apply.
fn add_clause(filter: &mut Document, key: &str, clause: Bson) {
    if let (Some(Bson::Document(existing)), Bson::Document(incoming)) = (filter.get_mut(key), &clause) {
        let both_operators = existing.keys().all(|k| k.starts_with('$'))
            && incoming.keys().all(|k| k.starts_with('$'));
        if both_operators {
            existing.extend(incoming.clone());
            return;
        }
    }
    filter.insert(key, clause);
}

fn truncated(text: &str) -> String {
    text.chars().take(32).chain("...".chars()).collect()
}
