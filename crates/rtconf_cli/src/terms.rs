//! Lookup term arguments.

use rtconf_core::{LookupTerm, Operator, UnknownOperator};
use thiserror::Error;

/// A lookup term argument that could not be parsed.
#[derive(Debug, Error)]
pub enum TermError {
    /// Neither `name=value` nor `name OP value`.
    #[error("malformed term {0:?}, expected name=value or \"name OP value\"")]
    Malformed(String),

    /// The operator is not one the bridge translates.
    #[error(transparent)]
    Operator(#[from] UnknownOperator),
}

/// Parses `name=value` or `"name OP value"`.
///
/// The value of the operator form is everything after the second space
/// and may itself contain spaces or `=`.
pub fn parse_term(text: &str) -> Result<LookupTerm, TermError> {
    if let Some((name, value)) = text.split_once('=') {
        if !name.is_empty() && !name.contains(char::is_whitespace) {
            return Ok(LookupTerm::equals(name, value));
        }
    }
    let mut parts = text.trim_start().splitn(3, ' ');
    match (parts.next(), parts.next()) {
        (Some(name), Some(operator)) if !name.is_empty() && !operator.is_empty() => {
            let operator: Operator = operator.parse()?;
            Ok(LookupTerm::with_operator(
                name,
                operator,
                parts.next().unwrap_or_default(),
            ))
        }
        _ => Err(TermError::Malformed(text.to_string())),
    }
}

/// Parses every argument, stopping at the first bad one.
pub fn parse_terms(texts: &[String]) -> Result<Vec<LookupTerm>, TermError> {
    texts.iter().map(|text| parse_term(text)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_terms() {
        let term = parse_term("context=default").unwrap();
        assert_eq!(term, LookupTerm::equals("context", "default"));

        let term = parse_term("callerid=\"Alice\" <6001>").unwrap();
        assert_eq!(term.value(), "\"Alice\" <6001>");
    }

    #[test]
    fn operator_terms() {
        let term = parse_term("id LIKE 60%").unwrap();
        assert_eq!(term, LookupTerm::with_operator("id", Operator::Like, "60%"));

        let term = parse_term("id != 6001").unwrap();
        assert_eq!(term.field(), "id !=");

        let term = parse_term("fullname like %a b%").unwrap();
        assert_eq!(term.value(), "%a b%");
    }

    #[test]
    fn rejects_bad_terms() {
        assert!(matches!(parse_term("context"), Err(TermError::Malformed(_))));
        assert!(matches!(parse_term("=x"), Err(TermError::Malformed(_))));
        assert!(matches!(parse_term("port >= 5"), Err(TermError::Operator(_))));
    }
}
