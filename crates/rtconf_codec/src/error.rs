//! Error types for the codec crate.

use crate::value::FieldType;
use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while converting between text and typed values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The text could not be fully consumed as the requested type.
    #[error("cannot parse {text:?} as {field_type}")]
    ParseFailed {
        /// The type the text was supposed to hold.
        field_type: FieldType,
        /// The offending text.
        text: String,
    },

    /// The text is not a valid identity literal.
    #[error("invalid identity literal {text:?}")]
    InvalidIdentity {
        /// The offending text.
        text: String,
    },

    /// A stored value has a runtime type the codec does not render.
    #[error("unrecognized value type: {type_name}")]
    UnrecognizedType {
        /// Name of the runtime type.
        type_name: String,
    },

    /// A type name could not be resolved to a [`FieldType`].
    #[error("unknown field type name: {name}")]
    UnknownTypeName {
        /// The name that was given.
        name: String,
    },
}

impl CodecError {
    /// Create a parse failed error.
    pub fn parse_failed(field_type: FieldType, text: impl Into<String>) -> Self {
        Self::ParseFailed {
            field_type,
            text: text.into(),
        }
    }

    /// Create an unrecognized type error.
    pub fn unrecognized_type(type_name: impl Into<String>) -> Self {
        Self::UnrecognizedType {
            type_name: type_name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_failed_display() {
        let err = CodecError::parse_failed(FieldType::Int32, "12abc");
        assert_eq!(err.to_string(), "cannot parse \"12abc\" as int32");
    }
}
