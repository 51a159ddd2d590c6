//! Connection settings and the key-value sources they are read from.

use crate::error::{CoreError, CoreResult};
use bson::oid::ObjectId;
use rtconf_codec::parse_identity;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::warn;

/// Settings file the bridge reads its own parameters from.
///
/// A static configuration load for this file is refused.
pub const SETTINGS_FILE: &str = "ast_mongo.conf";

/// Category holding the bridge connection parameters.
pub const BRIDGE_CATEGORY: &str = "config";

/// Category holding client logging parameters.
pub const LOG_CATEGORY: &str = "common";

/// Category holding record logger parameters.
pub const RECORD_CATEGORY: &str = "mongodb";

/// Read-only `category`/`key` lookup.
pub trait ConfigSource {
    /// Returns the value of `key` in `category`.
    fn get(&self, category: &str, key: &str) -> Option<String>;

    /// Returns true if `category` exists, even if empty.
    fn has_category(&self, category: &str) -> bool;
}

/// A parsed `.conf` file.
///
/// Supports `[category]` headers (a trailing template suffix such as
/// `(!)` is ignored), `key = value` and `key => value` lines, `;`
/// comments and blank lines. When a key repeats within a category the
/// first value is returned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfFile {
    categories: Vec<(String, Vec<(String, String)>)>,
}

impl ConfFile {
    /// Reads and parses a file.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] if the file cannot be read or
    /// parsed.
    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            CoreError::configuration(format!("unable to load {}: {e}", path.display()))
        })?;
        text.parse()
    }

    /// Category names in file order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|(name, _)| name.as_str())
    }

    /// Variables of the first category with the given name.
    pub fn variables(&self, category: &str) -> impl Iterator<Item = (&str, &str)> {
        self.categories
            .iter()
            .find(|(name, _)| name == category)
            .into_iter()
            .flat_map(|(_, vars)| vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }
}

impl FromStr for ConfFile {
    type Err = CoreError;

    fn from_str(text: &str) -> CoreResult<Self> {
        let mut categories: Vec<(String, Vec<(String, String)>)> = Vec::new();
        for (number, raw) in text.lines().enumerate() {
            let line = strip_comment(raw).trim();
            if line.is_empty() {
                continue;
            }
            if let Some(rest) = line.strip_prefix('[') {
                let Some((name, _template)) = rest.split_once(']') else {
                    return Err(parse_error(number, "unterminated category header"));
                };
                categories.push((name.trim().to_string(), Vec::new()));
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(parse_error(number, "expected key = value"));
            };
            let value = value.strip_prefix('>').unwrap_or(value);
            let Some((_, variables)) = categories.last_mut() else {
                return Err(parse_error(number, "variable outside of any category"));
            };
            variables.push((key.trim().to_string(), value.trim().to_string()));
        }
        Ok(Self { categories })
    }
}

fn strip_comment(line: &str) -> &str {
    line.split_once(';').map_or(line, |(before, _)| before)
}

fn parse_error(index: usize, reason: &str) -> CoreError {
    CoreError::configuration(format!("line {}: {reason}", index + 1))
}

impl ConfigSource for ConfFile {
    fn get(&self, category: &str, key: &str) -> Option<String> {
        self.variables(category)
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
    }

    fn has_category(&self, category: &str) -> bool {
        self.categories().any(|name| name == category)
    }
}

/// An in-memory source, mostly for tests and embedding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticSource {
    values: HashMap<(String, String), String>,
}

impl StaticSource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a value, builder style.
    #[must_use]
    pub fn with(mut self, category: &str, key: &str, value: impl Into<String>) -> Self {
        self.set(category, key, value);
        self
    }

    /// Sets a value.
    pub fn set(&mut self, category: &str, key: &str, value: impl Into<String>) {
        self.values
            .insert((category.to_string(), key.to_string()), value.into());
    }
}

impl ConfigSource for StaticSource {
    fn get(&self, category: &str, key: &str) -> Option<String> {
        self.values
            .get(&(category.to_string(), key.to_string()))
            .cloned()
    }

    fn has_category(&self, category: &str) -> bool {
        self.values.keys().any(|(c, _)| c == category)
    }
}

fn required(source: &dyn ConfigSource, category: &str, key: &str) -> CoreResult<String> {
    source
        .get(category, key)
        .ok_or_else(|| CoreError::configuration(format!("no {key} specified in [{category}]")))
}

fn require_category(source: &dyn ConfigSource, category: &str) -> CoreResult<()> {
    if source.has_category(category) {
        Ok(())
    } else {
        Err(CoreError::configuration(format!("no category {category} specified")))
    }
}

fn connection_uri(text: String) -> CoreResult<String> {
    if text.starts_with("mongodb://") || text.starts_with("mongodb+srv://") {
        Ok(text)
    } else {
        Err(CoreError::configuration(format!("invalid uri {text:?}")))
    }
}

fn partition(source: &dyn ConfigSource, category: &str) -> CoreResult<Option<ObjectId>> {
    source
        .get(category, "serverid")
        .map(|text| {
            parse_identity(&text)
                .ok_or_else(|| CoreError::configuration(format!("invalid serverid {text:?}")))
        })
        .transpose()
}

/// Reads a `0`/`1` flag; anything else warns and counts as off.
fn flag(source: &dyn ConfigSource, category: &str, key: &str) -> bool {
    match source.get(category, key).as_deref() {
        None | Some("0") => false,
        Some("1") => true,
        Some(other) => {
            warn!(category, key, value = other, "invalid flag, using 0");
            false
        }
    }
}

/// Parameters for the realtime bridge connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeSettings {
    /// Store connection URI.
    pub uri: String,
    /// Whether command monitoring is requested.
    pub apm: bool,
    /// Partition identifier scoping every query and write.
    pub partition: Option<ObjectId>,
}

impl BridgeSettings {
    /// Creates settings for `uri` with no partition.
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            apm: false,
            partition: None,
        }
    }

    /// Sets the partition identifier.
    #[must_use]
    pub fn with_partition(mut self, partition: ObjectId) -> Self {
        self.partition = Some(partition);
        self
    }

    /// Enables command monitoring.
    #[must_use]
    pub fn with_apm(mut self, apm: bool) -> Self {
        self.apm = apm;
        self
    }

    /// Reads the `[config]` category.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] if the category or `uri` is
    /// missing, the URI scheme is not a store scheme, or `serverid` is not
    /// a valid identity literal.
    pub fn from_source(source: &dyn ConfigSource) -> CoreResult<Self> {
        require_category(source, BRIDGE_CATEGORY)?;
        let uri = connection_uri(required(source, BRIDGE_CATEGORY, "uri")?)?;
        Ok(Self {
            uri,
            apm: flag(source, BRIDGE_CATEGORY, "apm"),
            partition: partition(source, BRIDGE_CATEGORY)?,
        })
    }
}

/// Client library logging parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogSettings {
    /// Client log level 0 (error) to 6 (trace); `None` disables it.
    pub level: Option<u8>,
    /// Log every command sent to the store.
    pub command_monitoring: bool,
    /// Log server discovery and monitoring events.
    pub sdam_monitoring: bool,
}

/// Highest client log level.
pub const MAX_LOG_LEVEL: u8 = 6;

impl LogSettings {
    /// Reads the `[common]` category. Missing values leave logging off.
    #[must_use]
    pub fn from_source(source: &dyn ConfigSource) -> Self {
        let level = source.get(LOG_CATEGORY, "mongoc_log_level").map(|text| {
            match text.parse::<u8>() {
                Ok(level) if level <= MAX_LOG_LEVEL => level,
                _ => {
                    warn!(value = %text, "invalid mongoc_log_level, using 0");
                    0
                }
            }
        });
        Self {
            level,
            command_monitoring: flag(source, LOG_CATEGORY, "apm_command_monitoring"),
            sdam_monitoring: flag(source, LOG_CATEGORY, "apm_sdam_monitoring"),
        }
    }

    /// Level name for a log filter directive.
    #[must_use]
    pub fn filter_level(&self) -> Option<&'static str> {
        self.level.map(|level| match level {
            0 | 1 => "error",
            2 => "warn",
            3 | 4 => "info",
            5 => "debug",
            _ => "trace",
        })
    }
}

/// Parameters for a record logger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSinkSettings {
    /// Store connection URI.
    pub uri: String,
    /// Target database.
    pub database: String,
    /// Target collection.
    pub collection: String,
    /// Partition identifier appended to every record.
    pub partition: Option<ObjectId>,
}

impl RecordSinkSettings {
    /// Reads `uri`, `database`, `collection` and `serverid` from `category`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] if the category or any
    /// required key is missing, or `serverid` is invalid.
    pub fn from_source(source: &dyn ConfigSource, category: &str) -> CoreResult<Self> {
        require_category(source, category)?;
        Ok(Self {
            uri: connection_uri(required(source, category, "uri")?)?,
            database: required(source, category, "database")?,
            collection: required(source, category, "collection")?,
            partition: partition(source, category)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "\
; ast_mongo.conf
[common]
mongoc_log_level = 3   ; message
apm_command_monitoring = 1
apm_sdam_monitoring = yes

[config]
uri => mongodb://localhost:27017/asterisk
serverid = 5a1b2c3d4e5f60718293a4b5

[mongodb](!)
uri = mongodb+srv://cluster.example.net
database = asterisk
collection = cdr
";

    #[test]
    fn parses_conf_text() {
        let conf: ConfFile = SAMPLE.parse().unwrap();
        assert_eq!(conf.categories().collect::<Vec<_>>(), ["common", "config", "mongodb"]);
        assert_eq!(conf.get("common", "mongoc_log_level").as_deref(), Some("3"));
        assert_eq!(
            conf.get("config", "uri").as_deref(),
            Some("mongodb://localhost:27017/asterisk")
        );
        assert!(conf.has_category("mongodb"));
        assert!(conf.get("config", "missing").is_none());
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!("key = value".parse::<ConfFile>().is_err());
        assert!("[config\nuri = x".parse::<ConfFile>().is_err());
        let err = "[config]\njunk".parse::<ConfFile>().unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn bridge_settings() {
        let conf: ConfFile = SAMPLE.parse().unwrap();
        let settings = BridgeSettings::from_source(&conf).unwrap();
        assert_eq!(settings.uri, "mongodb://localhost:27017/asterisk");
        assert!(!settings.apm);
        assert_eq!(
            settings.partition.map(|p| p.to_hex()).as_deref(),
            Some("5a1b2c3d4e5f60718293a4b5")
        );
    }

    #[test]
    fn bridge_settings_errors() {
        let source = StaticSource::new();
        assert!(matches!(
            BridgeSettings::from_source(&source),
            Err(CoreError::Configuration { .. })
        ));

        let source = StaticSource::new().with("config", "apm", "1");
        let err = BridgeSettings::from_source(&source).unwrap_err();
        assert!(err.to_string().contains("no uri"));

        let source = StaticSource::new().with("config", "uri", "http://localhost");
        assert!(BridgeSettings::from_source(&source).is_err());

        let source = StaticSource::new()
            .with("config", "uri", "mongodb://localhost")
            .with("config", "serverid", "not-an-oid");
        let err = BridgeSettings::from_source(&source).unwrap_err();
        assert!(err.to_string().contains("serverid"));
    }

    #[test]
    fn log_settings() {
        let conf: ConfFile = SAMPLE.parse().unwrap();
        let log = LogSettings::from_source(&conf);
        assert_eq!(log.level, Some(3));
        assert_eq!(log.filter_level(), Some("info"));
        assert!(log.command_monitoring);
        assert!(!log.sdam_monitoring);

        let source = StaticSource::new().with("common", "mongoc_log_level", "9");
        assert_eq!(LogSettings::from_source(&source).level, Some(0));
        assert_eq!(LogSettings::from_source(&StaticSource::new()), LogSettings::default());
    }

    #[test]
    fn record_sink_settings() {
        let conf: ConfFile = SAMPLE.parse().unwrap();
        let sink = RecordSinkSettings::from_source(&conf, RECORD_CATEGORY).unwrap();
        assert_eq!(sink.database, "asterisk");
        assert_eq!(sink.collection, "cdr");
        assert!(sink.partition.is_none());

        let source = StaticSource::new()
            .with("mongodb", "uri", "mongodb://localhost")
            .with("mongodb", "database", "asterisk");
        let err = RecordSinkSettings::from_source(&source, RECORD_CATEGORY).unwrap_err();
        assert!(err.to_string().contains("collection"));
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let conf = ConfFile::load(file.path()).unwrap();
        assert!(conf.has_category("config"));
        assert!(ConfFile::load("/nonexistent/ast_mongo.conf").is_err());
    }
}
