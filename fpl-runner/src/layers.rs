//! Warehouse layer refresh.
//!
//! Bronze tables are external tables over the landing objects; silver tables
//! are rebuilt from bronze by SQL read from a directory. Each statement runs
//! on its own: one failing table does not stop the others.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

use fpl_core::domain::DatasetKind;

/// Executes one SQL statement against the warehouse.
pub trait StatementRunner {
    fn execute(&self, sql: &str) -> Result<(), String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshStatus {
    Success,
    PartialFailure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshReport {
    pub status: RefreshStatus,
    /// `"success"` or `"error: ..."` per table.
    pub tables: BTreeMap<String, String>,
}

impl RefreshReport {
    pub fn http_status(&self) -> u16 {
        match self.status {
            RefreshStatus::Success => 200,
            RefreshStatus::PartialFailure => 207,
        }
    }
}

/// An ordered set of table statements for one layer.
#[derive(Debug, Clone, Default)]
pub struct LayerRefresh {
    pub layer: String,
    statements: Vec<(String, String)>,
}

impl LayerRefresh {
    pub fn new(layer: impl Into<String>, statements: Vec<(String, String)>) -> Self {
        Self {
            layer: layer.into(),
            statements,
        }
    }

    pub fn statements(&self) -> &[(String, String)] {
        &self.statements
    }

    pub fn refresh(&self, runner: &dyn StatementRunner) -> RefreshReport {
        let mut tables = BTreeMap::new();
        for (table, sql) in &self.statements {
            info!(layer = %self.layer, table = %table, "refreshing");
            let outcome = match runner.execute(sql) {
                Ok(()) => "success".to_string(),
                Err(e) => {
                    warn!(layer = %self.layer, table = %table, error = %e, "refresh failed");
                    format!("error: {e}")
                }
            };
            tables.insert(table.clone(), outcome);
        }

        let status = if tables.values().all(|v| v == "success") {
            RefreshStatus::Success
        } else {
            RefreshStatus::PartialFailure
        };
        RefreshReport { status, tables }
    }
}

/// `CREATE OR REPLACE EXTERNAL TABLE` over each dataset's landing objects.
pub fn bronze_statements(
    project: &str,
    bucket: &str,
    data_source: &str,
    datasets: &[DatasetKind],
) -> Vec<(String, String)> {
    datasets
        .iter()
        .map(|dataset| {
            let sql = format!(
                "CREATE OR REPLACE EXTERNAL TABLE `{project}.fpl_bronze.{dataset}`\n\
                 OPTIONS (\n    \
                 format = 'JSON',\n    \
                 uris = ['gs://{bucket}/landing/{data_source}/{dataset}/*.json']\n\
                 )"
            );
            (dataset.name().to_string(), sql)
        })
        .collect()
}

/// Statements from every `*.sql` file in `dir`, named by file stem, sorted.
pub fn load_sql_dir(dir: &Path) -> std::io::Result<Vec<(String, String)>> {
    let mut statements = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("sql") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        statements.push((stem.to_string(), std::fs::read_to_string(&path)?));
    }
    statements.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(statements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recording {
        executed: Mutex<Vec<String>>,
        fail_on: &'static str,
    }

    impl StatementRunner for Recording {
        fn execute(&self, sql: &str) -> Result<(), String> {
            self.executed.lock().unwrap().push(sql.to_string());
            if !self.fail_on.is_empty() && sql.contains(self.fail_on) {
                Err("table not found".into())
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn bronze_ddl_points_at_landing_namespace() {
        let statements = bronze_statements("proj", "bucket", "fpl-api", &[DatasetKind::Teams]);
        assert_eq!(statements[0].0, "teams");
        assert!(statements[0].1.contains("`proj.fpl_bronze.teams`"));
        assert!(statements[0]
            .1
            .contains("uris = ['gs://bucket/landing/fpl-api/teams/*.json']"));
    }

    #[test]
    fn all_success_is_200() {
        let refresh = LayerRefresh::new(
            "bronze",
            bronze_statements("p", "b", "fpl-api", &DatasetKind::ALL),
        );
        let runner = Recording {
            executed: Mutex::new(Vec::new()),
            fail_on: "",
        };
        let report = refresh.refresh(&runner);
        assert_eq!(report.status, RefreshStatus::Success);
        assert_eq!(report.http_status(), 200);
        assert_eq!(report.tables.len(), 6);
        assert_eq!(runner.executed.lock().unwrap().len(), 6);
    }

    #[test]
    fn one_failure_is_isolated_and_partial() {
        let refresh = LayerRefresh::new(
            "bronze",
            bronze_statements("p", "b", "fpl-api", &DatasetKind::ALL),
        );
        let runner = Recording {
            executed: Mutex::new(Vec::new()),
            fail_on: "fpl_bronze.fixtures",
        };
        let report = refresh.refresh(&runner);
        assert_eq!(report.status, RefreshStatus::PartialFailure);
        assert_eq!(report.http_status(), 207);
        assert_eq!(report.tables["fixtures"], "error: table not found");
        assert_eq!(report.tables["teams"], "success");
        assert_eq!(runner.executed.lock().unwrap().len(), 6);
    }

    #[test]
    fn report_serializes_like_the_trigger_response() {
        let report = RefreshReport {
            status: RefreshStatus::PartialFailure,
            tables: BTreeMap::from([("players".to_string(), "success".to_string())]),
        };
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            serde_json::json!({"status": "partial_failure", "tables": {"players": "success"}})
        );
    }

    #[test]
    fn sql_dir_is_read_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("teams.sql"), "SELECT 2").unwrap();
        std::fs::write(dir.path().join("players.sql"), "SELECT 1").unwrap();
        std::fs::write(dir.path().join("README.md"), "notes").unwrap();

        let statements = load_sql_dir(dir.path()).unwrap();
        assert_eq!(
            statements,
            vec![
                ("players".to_string(), "SELECT 1".to_string()),
                ("teams".to_string(), "SELECT 2".to_string()),
            ]
        );
    }
}
