//! Check-config command implementation.

use rtconf_core::{BridgeSettings, ConfFile, LogSettings, RecordSinkSettings};
use serde::Serialize;
use std::path::Path;

/// Settings check result.
#[derive(Debug, Serialize)]
pub struct ConfigReport {
    /// Settings file path.
    pub path: String,
    /// Store connection URI.
    pub uri: String,
    /// Command monitoring requested for the bridge.
    pub apm: bool,
    /// Partition identifier, if configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serverid: Option<String>,
    /// Client log level, if enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<u8>,
    /// Command monitoring in the client log.
    pub command_monitoring: bool,
    /// Discovery monitoring in the client log.
    pub sdam_monitoring: bool,
    /// Record logger target, if checked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<RecordTarget>,
}

/// Where a record logger writes.
#[derive(Debug, Serialize)]
pub struct RecordTarget {
    /// Target database.
    pub database: String,
    /// Target collection.
    pub collection: String,
}

/// Runs the check-config command.
pub fn run(
    path: &Path,
    records: Option<&str>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let source = ConfFile::load(path)?;
    let bridge = BridgeSettings::from_source(&source)?;
    let log = LogSettings::from_source(&source);
    let records = records
        .map(|category| RecordSinkSettings::from_source(&source, category))
        .transpose()?;

    let report = ConfigReport {
        path: path.display().to_string(),
        uri: bridge.uri,
        apm: bridge.apm,
        serverid: bridge.partition.map(|p| p.to_hex()),
        log_level: log.level,
        command_monitoring: log.command_monitoring,
        sdam_monitoring: log.sdam_monitoring,
        records: records.map(|sink| RecordTarget {
            database: sink.database,
            collection: sink.collection,
        }),
    };

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => print_report(&report),
    }
    Ok(())
}

fn print_report(report: &ConfigReport) {
    println!("Settings: {}", report.path);
    println!("  URI:        {}", report.uri);
    println!("  APM:        {}", report.apm);
    if let Some(serverid) = &report.serverid {
        println!("  Server ID:  {serverid}");
    }
    match report.log_level {
        Some(level) => println!("  Log level:  {level}"),
        None => println!("  Log level:  off"),
    }
    println!(
        "  Monitoring: command={} sdam={}",
        report.command_monitoring, report.sdam_monitoring
    );
    if let Some(records) = &report.records {
        println!("  Records:    {}.{}", records.database, records.collection);
    }
    println!();
    println!("Settings OK");
}
