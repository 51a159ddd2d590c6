//! Load command implementation.

use super::open_bridge;
use crate::fixture;
use rtconf_core::{ConfFile, TableIncludes};
use std::path::Path;

/// Runs the load command.
///
/// Includes are resolved from the same table.
pub fn run(
    settings: Option<&ConfFile>,
    fixture_path: &Path,
    database: &str,
    table: &str,
    file: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let pool = fixture::load(fixture_path, database)?;
    let bridge = open_bridge(settings, pool)?;

    let mut includes = TableIncludes::new(&bridge, database, table);
    match bridge.load_static(database, table, file, &mut includes)? {
        Some(tree) if tree.is_empty() => println!("; {file}: no records"),
        Some(tree) => print!("{tree}"),
        None => return Err(format!("{file} cannot be loaded from the store").into()),
    }
    Ok(())
}
