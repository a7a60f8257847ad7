//! Pipeline settings (TOML) and the dataset load config (CSV).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::api::http::{HttpApiOptions, DEFAULT_BASE_URL};
use crate::domain::{DatasetKind, LoadStrategy, UnknownDataset, UnknownLoadStrategy};
use crate::events::EventSink;
use crate::storage::{ObjectStore, StorageError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse settings TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("read dataset config: {0}")]
    Storage(#[from] StorageError),

    #[error("parse dataset config: {0}")]
    Csv(#[from] csv::Error),
}

/// Warehouse coordinates used when rendering layer DDL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarehouseSettings {
    pub project: String,
    pub bucket: String,
}

impl Default for WarehouseSettings {
    fn default() -> Self {
        Self {
            project: "fpl-project".to_string(),
            bucket: "fpl-data-lake".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub base_url: String,
    pub api_delay_ms: u64,
    pub timeout_secs: u64,
    /// Only config rows with this `datasource` are processed.
    pub data_source: String,
    /// Root directory of the local object store.
    pub storage_root: PathBuf,
    pub config_key: String,
    /// Path of the JSONL audit ledger, relative to `storage_root`.
    pub audit_ledger: PathBuf,
    pub log_prefix: String,
    pub warehouse: WarehouseSettings,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_delay_ms: 1000,
            timeout_secs: 30,
            data_source: "fpl-api".to_string(),
            storage_root: PathBuf::from("data"),
            config_key: "configs/load_config.csv".to_string(),
            audit_ledger: PathBuf::from("warehouse/audit_log.jsonl"),
            log_prefix: "logs/fpl_pipeline".to_string(),
            warehouse: WarehouseSettings::default(),
        }
    }
}

impl PipelineSettings {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Settings from `path`, or defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn http_options(&self) -> HttpApiOptions {
        HttpApiOptions {
            base_url: self.base_url.clone(),
            delay: Duration::from_millis(self.api_delay_ms),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.storage_root.join(&self.audit_ledger)
    }
}

/// One row of `load_config.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetConfigRow {
    pub datasource: String,
    pub table_name: String,
    pub load_type: String,
    pub is_active: String,
}

impl DatasetConfigRow {
    pub fn is_selected(&self, data_source: &str) -> bool {
        self.datasource == data_source && self.is_active == "1"
    }

    pub fn dataset(&self) -> Result<DatasetKind, UnknownDataset> {
        self.table_name.parse()
    }

    pub fn strategy(&self) -> Result<LoadStrategy, UnknownLoadStrategy> {
        self.load_type.parse()
    }
}

pub fn parse_dataset_config(content: &str) -> Result<Vec<DatasetConfigRow>, ConfigError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

/// Read the dataset config from the object store.
///
/// Any failure is logged and yields an empty config, so the run goes on to
/// process nothing.
pub fn read_dataset_config(
    store: &dyn ObjectStore,
    key: &str,
    sink: &dyn EventSink,
) -> Vec<DatasetConfigRow> {
    let loaded = store
        .get_text(key)
        .map_err(ConfigError::from)
        .and_then(|content| parse_dataset_config(&content));
    match loaded {
        Ok(rows) => {
            sink.info(&format!("Config file loaded: {} entries", rows.len()));
            rows
        }
        Err(e) => {
            sink.error(&format!("Error reading config file {key}: {e}"));
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::events::{Level, RunLog};
    use crate::storage::memory::MemoryObjectStore;

    const CONFIG: &str = "\
datasource,table_name,load_type,is_active
fpl-api,players,full,1
fpl-api,gameweek_live,incremental,1
fpl-api,fixtures,full,0
other-api,teams,full,1
";

    #[test]
    fn defaults_fill_missing_fields() {
        let settings = PipelineSettings::from_toml(
            r#"
data_source = "fpl-test"

[warehouse]
project = "p1"
"#,
        )
        .unwrap();
        assert_eq!(settings.data_source, "fpl-test");
        assert_eq!(settings.api_delay_ms, 1000);
        assert_eq!(settings.config_key, "configs/load_config.csv");
        assert_eq!(settings.warehouse.project, "p1");
        assert_eq!(settings.warehouse.bucket, "fpl-data-lake");
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(
            PipelineSettings::from_toml("").unwrap(),
            PipelineSettings::default()
        );
    }

    #[test]
    fn missing_settings_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = PipelineSettings::load_or_default(&dir.path().join("fpl.toml")).unwrap();
        assert_eq!(settings, PipelineSettings::default());
    }

    #[test]
    fn bad_toml_is_an_error() {
        assert!(matches!(
            PipelineSettings::from_toml("api_delay_ms = \"soon\""),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn http_options_from_settings() {
        let settings = PipelineSettings {
            api_delay_ms: 250,
            timeout_secs: 5,
            ..PipelineSettings::default()
        };
        let options = settings.http_options();
        assert_eq!(options.delay, Duration::from_millis(250));
        assert_eq!(options.timeout, Duration::from_secs(5));
    }

    #[test]
    fn rows_keep_file_order_and_filter_by_source_and_flag() {
        let rows = parse_dataset_config(CONFIG).unwrap();
        assert_eq!(rows.len(), 4);
        let selected: Vec<&str> = rows
            .iter()
            .filter(|r| r.is_selected("fpl-api"))
            .map(|r| r.table_name.as_str())
            .collect();
        assert_eq!(selected, vec!["players", "gameweek_live"]);
    }

    #[test]
    fn rows_parse_to_domain_types() {
        let rows = parse_dataset_config(CONFIG).unwrap();
        assert_eq!(rows[1].dataset().unwrap(), DatasetKind::GameweekLive);
        assert_eq!(rows[1].strategy().unwrap(), LoadStrategy::Incremental);
    }

    #[test]
    fn whitespace_is_trimmed() {
        let csv = "datasource, table_name, load_type, is_active\nfpl-api, teams, FULL, 1\n";
        let rows = parse_dataset_config(csv).unwrap();
        assert!(rows[0].is_selected("fpl-api"));
        assert_eq!(rows[0].strategy().unwrap(), LoadStrategy::Full);
    }

    #[test]
    fn unreadable_config_is_empty_and_logged() {
        let clock = FixedClock::on(2025, 1, 1);
        let log = RunLog::new(&clock);
        let store = MemoryObjectStore::new();

        let rows = read_dataset_config(&store, "configs/load_config.csv", &log);
        assert!(rows.is_empty());
        assert_eq!(log.entries()[0].event_type, Level::Error);
    }

    #[test]
    fn loaded_config_is_counted_in_the_log() {
        let clock = FixedClock::on(2025, 1, 1);
        let log = RunLog::new(&clock);
        let store = MemoryObjectStore::new();
        store.put("configs/load_config.csv", CONFIG.as_bytes()).unwrap();

        let rows = read_dataset_config(&store, "configs/load_config.csv", &log);
        assert_eq!(rows.len(), 4);
        assert_eq!(log.entries()[0].message, "Config file loaded: 4 entries");
    }
}
