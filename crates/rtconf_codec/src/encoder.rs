//! Text to typed value conversion.

use crate::error::{CodecError, CodecResult};
use crate::value::FieldType;
use bson::oid::ObjectId;
use bson::Bson;

/// Encode `text` as a value of `field_type`.
///
/// Parsing is locale-independent and must consume the whole input:
/// `"12abc"` is a failure for the integer types, never a truncation to 12.
///
/// # Errors
///
/// Returns [`CodecError::ParseFailed`] if the text does not parse as the
/// requested type.
pub fn encode(field_type: FieldType, text: &str) -> CodecResult<Bson> {
    let fail = || CodecError::parse_failed(field_type, text);
    match field_type {
        FieldType::String => Ok(Bson::String(text.to_string())),
        FieldType::Bool => parse_bool(text).map(Bson::Boolean).ok_or_else(fail),
        FieldType::Int32 => text.parse::<i32>().map(Bson::Int32).map_err(|_| fail()),
        FieldType::Int64 => text.parse::<i64>().map(Bson::Int64).map_err(|_| fail()),
        FieldType::Double => parse_real(text).map(Bson::Double).ok_or_else(fail),
    }
}

/// Classify `text` when no declared type is known.
///
/// Integers are deliberately not inferred: an untyped `"5"` is a double.
/// Anything [`parse_real`] accepts counts as a number, so the words `inf`,
/// `infinity` and `nan` (any case, optionally signed) also infer as
/// [`FieldType::Double`] and are stored as non-finite doubles.
#[must_use]
pub fn infer(text: &str) -> FieldType {
    if parse_bool(text).is_some() {
        FieldType::Bool
    } else if parse_real(text).is_some() {
        FieldType::Double
    } else {
        FieldType::String
    }
}

/// Encode `text` using the type [`infer`] picks for it.
#[must_use]
pub fn encode_inferred(text: &str) -> Bson {
    match infer(text) {
        FieldType::Bool => Bson::Boolean(text == "true"),
        FieldType::Double => parse_real(text).map_or_else(|| Bson::String(text.to_string()), Bson::Double),
        _ => Bson::String(text.to_string()),
    }
}

/// Parse exactly `"true"` or `"false"`.
#[must_use]
pub fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Parse a fully consumed integer.
#[must_use]
pub fn parse_integer(text: &str) -> Option<i64> {
    text.parse().ok()
}

/// Parse a fully consumed real number.
#[must_use]
pub fn parse_real(text: &str) -> Option<f64> {
    text.parse().ok()
}

/// Parse a 24-digit hexadecimal identity literal.
#[must_use]
pub fn parse_identity(text: &str) -> Option<ObjectId> {
    if text.len() != 24 {
        return None;
    }
    ObjectId::parse_str(text).ok()
}

/// Parse an identity literal, failing with a codec error.
///
/// # Errors
///
/// Returns [`CodecError::InvalidIdentity`] when `text` is not 24 hex digits.
pub fn encode_identity(text: &str) -> CodecResult<ObjectId> {
    parse_identity(text).ok_or_else(|| CodecError::InvalidIdentity {
        text: text.to_string(),
    })
}
