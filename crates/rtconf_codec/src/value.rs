//! Field types and the typed view over stored values.

use crate::error::CodecError;
use bson::oid::ObjectId;
use bson::spec::ElementType;
use bson::Bson;
use std::fmt;
use std::str::FromStr;

/// A declared value type for a table field.
///
/// This is the closed set of types a schema declaration can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// UTF-8 text.
    String,
    /// The literals `true` / `false`.
    Bool,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// IEEE-754 double.
    Double,
}

impl FieldType {
    /// Returns the lowercase name used in logs and settings.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Bool => "bool",
            FieldType::Int32 => "int32",
            FieldType::Int64 => "int64",
            FieldType::Double => "double",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FieldType {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "string" | "utf8" | "char" => Ok(FieldType::String),
            "bool" | "boolean" => Ok(FieldType::Bool),
            "int32" | "int" => Ok(FieldType::Int32),
            "int64" | "long" => Ok(FieldType::Int64),
            "double" | "float" => Ok(FieldType::Double),
            _ => Err(CodecError::UnknownTypeName {
                name: s.to_string(),
            }),
        }
    }
}

/// A stored value classified by its runtime type tag.
///
/// Decoding dispatches on this tag rather than on any declared schema,
/// since a stored value already carries a concrete type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypedValue<'a> {
    /// Text value.
    String(&'a str),
    /// Boolean value.
    Bool(bool),
    /// 32-bit integer.
    Int32(i32),
    /// 64-bit integer.
    Int64(i64),
    /// Double.
    Double(f64),
    /// Native document identity.
    Identity(ObjectId),
    /// Any runtime type the codec does not render.
    Unrecognized(ElementType),
}

impl<'a> From<&'a Bson> for TypedValue<'a> {
    fn from(value: &'a Bson) -> Self {
        match value {
            Bson::String(s) => TypedValue::String(s),
            Bson::Boolean(b) => TypedValue::Bool(*b),
            Bson::Int32(n) => TypedValue::Int32(*n),
            Bson::Int64(n) => TypedValue::Int64(*n),
            Bson::Double(d) => TypedValue::Double(*d),
            Bson::ObjectId(oid) => TypedValue::Identity(*oid),
            other => TypedValue::Unrecognized(other.element_type()),
        }
    }
}

impl TypedValue<'_> {
    /// Returns the declared type this value corresponds to, if any.
    #[must_use]
    pub fn field_type(&self) -> Option<FieldType> {
        match self {
            TypedValue::String(_) => Some(FieldType::String),
            TypedValue::Bool(_) => Some(FieldType::Bool),
            TypedValue::Int32(_) => Some(FieldType::Int32),
            TypedValue::Int64(_) => Some(FieldType::Int64),
            TypedValue::Double(_) => Some(FieldType::Double),
            TypedValue::Identity(_) | TypedValue::Unrecognized(_) => None,
        }
    }
}
