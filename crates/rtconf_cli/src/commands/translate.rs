//! Translate command implementation.

use crate::terms::parse_terms;
use bson::Bson;
use rtconf_core::{BridgeSettings, ConfFile, QueryTranslator};

/// Runs the translate command.
pub fn run(
    settings: Option<&ConfFile>,
    terms: &[String],
    order_by: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let partition = match settings {
        Some(source) => BridgeSettings::from_source(source)?.partition,
        None => None,
    };
    let terms = parse_terms(terms)?;
    let query = QueryTranslator::new(partition).translate(&terms, order_by)?;

    let envelope = Bson::Document(query.to_modifiers()).into_relaxed_extjson();
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}
