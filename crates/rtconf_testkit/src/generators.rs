//! Property-based test generators using proptest.
//!
//! Values are plain strings and tuples so that any crate can turn them into
//! its own row and record types.

use proptest::prelude::*;
use rtconf_codec::{infer, FieldType};

/// Strategy for generating field names.
///
/// Never yields `id` or `serverid`, which the bridge renames or hides.
pub fn field_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,15}")
        .expect("Invalid regex")
        .prop_filter("Field name must not be reserved", |name| {
            name != "id" && name != "serverid"
        })
}

/// Strategy for non-empty values that infer as plain strings.
pub fn text_value_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z][a-zA-Z0-9 ._,/-]{0,23}")
        .expect("Invalid regex")
        .prop_filter("Value must infer as a string", |value| {
            infer(value) == FieldType::String
        })
}

/// Strategy for values of any inferred type, including the empty string.
pub fn any_value_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => text_value_strategy(),
        2 => any::<i32>().prop_map(|n| n.to_string()),
        1 => (-1.0e6..1.0e6_f64).prop_map(|x| x.to_string()),
        1 => any::<bool>().prop_map(|b| b.to_string()),
        1 => Just(String::new()),
    ]
}

/// Strategy for rows with unique field names and string-typed values.
pub fn row_strategy() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::btree_map(field_name_strategy(), text_value_strategy(), 1..8)
        .prop_map(|fields| fields.into_iter().collect())
}

/// Strategy for rows whose values may be empty or of any inferred type.
pub fn mixed_row_strategy() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::btree_map(field_name_strategy(), any_value_strategy(), 1..8)
        .prop_map(|fields| fields.into_iter().collect())
}

/// Where the wildcards of a generated `LIKE` pattern sit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternShape {
    /// `literal%`
    Prefix,
    /// `%literal`
    Suffix,
    /// `%literal%`
    Contains,
}

impl PatternShape {
    /// Wraps `literal` in wildcards.
    #[must_use]
    pub fn apply(self, literal: &str) -> String {
        match self {
            PatternShape::Prefix => format!("{literal}%"),
            PatternShape::Suffix => format!("%{literal}"),
            PatternShape::Contains => format!("%{literal}%"),
        }
    }
}

/// Strategy for supported `LIKE` patterns.
///
/// Yields the shape, the literal text, and the pattern.
pub fn like_pattern_strategy() -> impl Strategy<Value = (PatternShape, String, String)> {
    let shape = prop_oneof![
        Just(PatternShape::Prefix),
        Just(PatternShape::Suffix),
        Just(PatternShape::Contains),
    ];
    let literal = prop::string::string_regex("[a-zA-Z0-9_.+]{1,12}").expect("Invalid regex");
    (shape, literal).prop_map(|(shape, literal)| {
        let pattern = shape.apply(&literal);
        (shape, literal, pattern)
    })
}

/// Strategy for patterns with a wildcard only in the middle.
pub fn unsupported_pattern_strategy() -> impl Strategy<Value = String> {
    let part = || prop::string::string_regex("[a-zA-Z0-9]{1,8}").expect("Invalid regex");
    (part(), part()).prop_map(|(head, tail)| format!("{head}%{tail}"))
}

/// A section as generated: category name and its variables in order.
pub type GeneratedSection = (String, Vec<(String, String)>);

/// Strategy for static configuration files with distinct section names.
pub fn sections_strategy() -> impl Strategy<Value = Vec<GeneratedSection>> {
    let name = || prop::string::string_regex("[a-z][a-z0-9_-]{0,11}").expect("Invalid regex");
    let variables = prop::collection::vec((name(), text_value_strategy()), 1..5);
    prop::collection::btree_map(name(), variables, 1..6)
        .prop_map(|sections| sections.into_iter().collect())
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 64,
            max_shrink_iters: 200,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
