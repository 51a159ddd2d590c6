//! Benchmark utilities.

use bson::{doc, Document};
use rtconf_core::{LookupTerm, Operator, Row};

/// Builds `count` endpoint documents with ids starting at 6000.
pub fn endpoint_documents(count: usize) -> Vec<Document> {
    (0..count)
        .map(|i| {
            let id = (6000 + i).to_string();
            let mut document = rtconf_testkit::endpoint(&id, if i % 2 == 0 { "default" } else { "office" });
            document.insert("max_contacts", 1.0);
            document.insert("rtp_timeout", 30.0);
            document
        })
        .collect()
}

/// A row with `width` string fields, one numeric and one boolean.
pub fn sample_row(width: usize) -> Row {
    let mut row = Row::new().with("id", "6001").with("max_contacts", "5").with("webrtc", "false");
    for i in 0..width {
        row.set(format!("field_{i}"), format!("value {i}"));
    }
    row
}

/// A mix of equality, pattern and range terms, `count` long.
pub fn sample_terms(count: usize) -> Vec<LookupTerm> {
    (0..count)
        .map(|i| match i % 4 {
            0 => LookupTerm::equals(format!("field_{i}"), "default"),
            1 => LookupTerm::with_operator(&format!("field_{i}"), Operator::Like, "60%"),
            2 => LookupTerm::with_operator(&format!("field_{i}"), Operator::Gt, "5000"),
            _ => LookupTerm::with_operator(&format!("field_{i}"), Operator::Ne, "off"),
        })
        .collect()
}

/// A stored document of the same shape as [`sample_row`].
pub fn sample_document(width: usize) -> Document {
    let mut document = doc! { "_id": "6001", "max_contacts": 5.0, "webrtc": false };
    for i in 0..width {
        document.insert(format!("field_{i}"), format!("value {i}"));
    }
    document
}
