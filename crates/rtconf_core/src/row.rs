//! Rows and lookup terms as the realtime framework passes them.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// An ordered list of field/value pairs with unique field names.
///
/// The identity column is always called `id` here, whatever the store
/// calls it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    fields: Vec<(String, String)>,
}

impl Row {
    /// Creates an empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field, builder style.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Sets a field. An existing field of the same name keeps its
    /// position and takes the new value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Returns the value of a field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Iterates fields in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Iterates field names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the row has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (name, value) in iter {
            row.set(name, value);
        }
        row
    }
}

impl IntoIterator for Row {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

/// Comparison operator of a lookup term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Equality; implied when the term names no operator.
    Eq,
    /// SQL `LIKE` pattern with `%` wildcards at either end.
    Like,
    /// Field exists and differs.
    Ne,
    /// Greater than.
    Gt,
    /// Less than or equal.
    Le,
}

impl Operator {
    /// Returns the token used for this operator in a field name.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Like => "LIKE",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Le => "<=",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Error returned when an operator token is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unexpected operator {0:?}")]
pub struct UnknownOperator(pub String);

impl FromStr for Operator {
    type Err = UnknownOperator;

    /// Parses an explicit operator token, ignoring case.
    ///
    /// Equality is never written out, so `=` is not accepted.
    fn from_str(token: &str) -> Result<Self, Self::Err> {
        if token.eq_ignore_ascii_case("like") {
            Ok(Self::Like)
        } else {
            match token {
                "!=" => Ok(Self::Ne),
                ">" => Ok(Self::Gt),
                "<=" => Ok(Self::Le),
                other => Err(UnknownOperator(other.to_string())),
            }
        }
    }
}

/// One `field [operator] = value` condition.
///
/// The field token is kept as the caller wrote it (`"name"` or
/// `"name LIKE"`); the translator splits it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTerm {
    field: String,
    value: String,
}

impl LookupTerm {
    /// Creates a term from a raw field token and a value.
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Creates an equality term.
    pub fn equals(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, value)
    }

    /// Creates a term with an explicit operator.
    pub fn with_operator(name: &str, operator: Operator, value: impl Into<String>) -> Self {
        match operator {
            Operator::Eq => Self::new(name, value),
            other => Self::new(format!("{name} {}", other.token()), value),
        }
    }

    /// The raw field token.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// The value to compare against.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The field name without any operator token.
    #[must_use]
    pub fn name(&self) -> &str {
        self.field.split(' ').find(|t| !t.is_empty()).unwrap_or("")
    }
}

impl fmt::Display for LookupTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.field, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_names_stay_unique() {
        let row = Row::new()
            .with("id", "6001")
            .with("context", "default")
            .with("id", "6002");
        assert_eq!(row.len(), 2);
        assert_eq!(row.get("id"), Some("6002"));
        assert_eq!(row.names().collect::<Vec<_>>(), ["id", "context"]);
    }

    #[test]
    fn row_from_pairs() {
        let row: Row = [("a", "1"), ("b", "2")].into_iter().collect();
        assert_eq!(row.iter().collect::<Vec<_>>(), [("a", "1"), ("b", "2")]);
    }

    #[test]
    fn operator_tokens() {
        assert_eq!("LIKE".parse::<Operator>(), Ok(Operator::Like));
        assert_eq!("like".parse::<Operator>(), Ok(Operator::Like));
        assert_eq!("!=".parse::<Operator>(), Ok(Operator::Ne));
        assert_eq!(">".parse::<Operator>(), Ok(Operator::Gt));
        assert_eq!("<=".parse::<Operator>(), Ok(Operator::Le));
        assert!("<".parse::<Operator>().is_err());
        assert!("=".parse::<Operator>().is_err());
    }

    #[test]
    fn term_construction() {
        let term = LookupTerm::with_operator("name", Operator::Like, "%abc");
        assert_eq!(term.field(), "name LIKE");
        assert_eq!(term.name(), "name");
        assert_eq!(LookupTerm::with_operator("id", Operator::Eq, "x").field(), "id");
        assert_eq!(term.to_string(), "name LIKE=%abc");
    }
}
