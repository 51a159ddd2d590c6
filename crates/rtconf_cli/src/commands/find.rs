//! Find command implementation.

use super::open_bridge;
use crate::fixture;
use crate::terms::parse_terms;
use rtconf_core::{ConfFile, Row};
use serde::Serialize;
use std::path::Path;

/// Where and how to look.
#[derive(Debug)]
pub struct FindRequest<'a> {
    /// Database name.
    pub database: &'a str,
    /// Table to search.
    pub table: &'a str,
    /// Return every match instead of the first.
    pub many: bool,
    /// Sort field for many rows.
    pub order_by: Option<&'a str>,
    /// Output format (text, json, conf).
    pub format: &'a str,
}

/// One row as printed in JSON output.
#[derive(Debug, Serialize)]
pub struct FoundRow {
    /// Fields in document order.
    pub fields: Vec<FoundField>,
}

/// One field of a found row.
#[derive(Debug, Serialize)]
pub struct FoundField {
    /// Field name.
    pub name: String,
    /// Rendered value.
    pub value: String,
}

impl From<&Row> for FoundRow {
    fn from(row: &Row) -> Self {
        Self {
            fields: row
                .iter()
                .map(|(name, value)| FoundField {
                    name: name.to_string(),
                    value: value.to_string(),
                })
                .collect(),
        }
    }
}

/// Runs the find command.
pub fn run(
    settings: Option<&ConfFile>,
    fixture_path: &Path,
    request: &FindRequest<'_>,
    terms: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let terms = parse_terms(terms)?;
    let pool = fixture::load(fixture_path, request.database)?;
    let bridge = open_bridge(settings, pool)?;

    if request.format == "conf" {
        let tree = bridge.find_many_as_config(request.database, request.table, &terms)?;
        print!("{tree}");
        return Ok(());
    }

    let rows = if request.many {
        bridge.find_many(request.database, request.table, &terms, request.order_by)?
    } else {
        bridge
            .find_one(request.database, request.table, &terms)?
            .into_iter()
            .collect()
    };

    match request.format {
        "json" => {
            let rows: Vec<FoundRow> = rows.iter().map(FoundRow::from).collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        _ => print_rows(&rows),
    }
    Ok(())
}

fn print_rows(rows: &[Row]) {
    if rows.is_empty() {
        println!("No rows found");
        return;
    }
    for (index, row) in rows.iter().enumerate() {
        if index > 0 {
            println!();
        }
        let width = row.names().map(str::len).max().unwrap_or(0);
        for (name, value) in row.iter() {
            println!("{name:<width$} : {value}");
        }
    }
}
