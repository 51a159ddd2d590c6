//! # rtconf Codec
//!
//! Conversion between configuration text and typed document values.
//!
//! The realtime framework exchanges every value as text, while the
//! document store keeps typed values. This crate owns both directions:
//!
//! - [`encode`] turns text into a value of a declared [`FieldType`]
//! - [`infer`] picks a type for text when no declaration exists
//! - [`decode`] renders a stored value back to text, keyed by its runtime tag
//!
//! ## Usage
//!
//! ```
//! use rtconf_codec::{decode, encode, infer, FieldType};
//!
//! let text = "3.14";
//! let value = encode(infer(text), text).unwrap();
//! assert_eq!(decode(&value).unwrap(), text);
//!
//! assert!(encode(FieldType::Int32, "12abc").is_err());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;
mod value;

pub use decoder::{decode, format_general, DOUBLE_PRECISION};
pub use encoder::{
    encode, encode_identity, encode_inferred, infer, parse_bool, parse_identity, parse_integer,
    parse_real,
};
pub use error::{CodecError, CodecResult};
pub use value::{FieldType, TypedValue};

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn inferred_roundtrip_is_identity() {
        for text in ["true", "false", "3.14", "hello"] {
            let value = encode(infer(text), text).unwrap();
            assert_eq!(decode(&value).unwrap(), text);
        }
    }

    #[test]
    fn declared_roundtrip() {
        assert_eq!(decode(&encode(FieldType::Int32, "5060").unwrap()).unwrap(), "5060");
        assert_eq!(decode(&encode(FieldType::Int64, "-1").unwrap()).unwrap(), "-1");
        assert_eq!(decode(&encode(FieldType::String, "5").unwrap()).unwrap(), "5");
    }

    proptest! {
        #[test]
        fn strings_roundtrip(text in "[a-zA-Z/_-][a-zA-Z0-9/_ -]{0,31}") {
            let value = encode(FieldType::String, &text).unwrap();
            prop_assert_eq!(decode(&value).unwrap(), text);
        }

        #[test]
        fn int64_roundtrip(n in any::<i64>()) {
            let text = n.to_string();
            let value = encode(FieldType::Int64, &text).unwrap();
            prop_assert_eq!(decode(&value).unwrap(), text);
        }

        #[test]
        fn int32_text_infers_double_and_renders_same(n in -99_999i32..99_999) {
            let text = n.to_string();
            prop_assert_eq!(infer(&text), FieldType::Double);
            prop_assert_eq!(decode(&encode_inferred(&text)).unwrap(), text);
        }
    }
}
