//! Typed value to text conversion.

use crate::error::{CodecError, CodecResult};
use crate::value::TypedValue;
use bson::Bson;

/// Significant digits used when rendering doubles.
pub const DOUBLE_PRECISION: usize = 10;

/// Render a stored value as configuration text.
///
/// Identities render as 24 lowercase hex digits, booleans as
/// `true`/`false`, integers as plain decimal and doubles in general
/// format with [`DOUBLE_PRECISION`] significant digits.
///
/// # Errors
///
/// Returns [`CodecError::UnrecognizedType`] for runtime types outside
/// the supported set.
pub fn decode(value: &Bson) -> CodecResult<String> {
    match TypedValue::from(value) {
        TypedValue::String(s) => Ok(s.to_string()),
        TypedValue::Bool(b) => Ok(if b { "true" } else { "false" }.to_string()),
        TypedValue::Int32(n) => Ok(n.to_string()),
        TypedValue::Int64(n) => Ok(n.to_string()),
        TypedValue::Double(d) => Ok(format_general(d, DOUBLE_PRECISION)),
        TypedValue::Identity(oid) => Ok(oid.to_hex()),
        TypedValue::Unrecognized(element_type) => {
            Err(CodecError::unrecognized_type(format!("{element_type:?}")))
        }
    }
}

/// Format a double like C's `%.<precision>g`.
///
/// Uses scientific notation when the decimal exponent is below -4 or not
/// less than `precision`, and strips trailing zeros in both forms.
#[must_use]
pub fn format_general(value: f64, precision: usize) -> String {
    let precision = precision.max(1);
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let scientific = format!("{:.*e}", precision - 1, value);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };

    #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
    let precision_exp = precision as i32;
    if exponent < -4 || exponent >= precision_exp {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{}{:02}",
            trim_fraction(mantissa),
            sign,
            exponent.unsigned_abs()
        )
    } else {
        #[allow(clippy::cast_sign_loss)]
        let decimals = (precision_exp - 1 - exponent).max(0) as usize;
        trim_fraction(&format!("{value:.decimals$}")).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
