//! Configuration file
//!
//! A JSON object; every field is optional. A missing file means all
//! defaults.

use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::generator::GeneratorConfig;
use crate::observability::{log_event_with_fields, Event};

use super::errors::{CliError, CliResult};

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "./motfacet.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Root directory of all databases
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Database read by mot-facets
    #[serde(default = "default_database")]
    pub database: String,

    /// Collection read by mot-facets
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Database written by random-inserts
    #[serde(default = "default_insert_database")]
    pub insert_database: String,

    /// Collection written by random-inserts
    #[serde(default = "default_insert_collection")]
    pub insert_collection: String,

    /// Pause between inserts
    #[serde(default = "default_insert_interval_ms")]
    pub insert_interval_ms: u64,

    /// Extra attempts per failed insert (0 = stop on first failure)
    #[serde(default)]
    pub write_retries: u32,

    /// Aggregation deadline; none if absent
    #[serde(default)]
    pub deadline_secs: Option<u64>,

    /// Add the per-bucket `Makes` list to the unique-models facet
    #[serde(default)]
    pub include_makes: bool,
}

fn default_data_dir() -> String {
    "./motfacet-data".to_string()
}
fn default_database() -> String {
    "mot".to_string()
}
fn default_collection() -> String {
    "testresults".to_string()
}
fn default_insert_database() -> String {
    "testdb".to_string()
}
fn default_insert_collection() -> String {
    "records".to_string()
}
fn default_insert_interval_ms() -> u64 {
    100
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            database: default_database(),
            collection: default_collection(),
            insert_database: default_insert_database(),
            insert_collection: default_insert_collection(),
            insert_interval_ms: default_insert_interval_ms(),
            write_retries: 0,
            deadline_secs: None,
            include_makes: false,
        }
    }
}

impl Config {
    /// Load configuration from file, or defaults if the file does not exist
    pub fn load(path: &Path) -> CliResult<Self> {
        let config = match fs::read_to_string(path) {
            Ok(content) => Self::parse(&content)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                return Err(CliError::config_error(format!(
                    "Failed to read config {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        log_event_with_fields(
            Event::ConfigLoaded,
            &[("path", &path.display().to_string())],
        );
        Ok(config)
    }

    /// Parse and validate configuration JSON
    pub fn parse(content: &str) -> CliResult<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.data_dir.is_empty() {
            return Err(CliError::config_error("data_dir must not be empty"));
        }

        for (field, value) in [
            ("database", &self.database),
            ("collection", &self.collection),
            ("insert_database", &self.insert_database),
            ("insert_collection", &self.insert_collection),
        ] {
            if value.is_empty() || value.contains(|c: char| matches!(c, '/' | '\\' | '\0')) {
                return Err(CliError::config_error(format!(
                    "Invalid {}: '{}'. Must be non-empty without path separators.",
                    field, value
                )));
            }
        }

        if self.insert_interval_ms == 0 {
            return Err(CliError::config_error("insert_interval_ms must be > 0"));
        }

        if self.deadline_secs == Some(0) {
            return Err(CliError::config_error("deadline_secs must be > 0"));
        }

        Ok(())
    }

    /// Get data directory as Path
    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_dir)
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }

    pub fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            interval: Duration::from_millis(self.insert_interval_ms),
            write_retries: self.write_retries,
        }
    }
}
