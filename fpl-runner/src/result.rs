//! Outcome of one pipeline run.

use serde::{Deserialize, Serialize};

use fpl_core::domain::Sequence;
use fpl_core::planner::DatasetRun;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Error,
}

/// Serializes to `{status, gameweek, tables_processed}` on success and
/// `{status, message}` on error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gameweek: Option<Sequence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tables_processed: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Per-dataset outcomes, in config order.
    #[serde(skip)]
    pub datasets: Vec<DatasetRun>,
    /// Object store key the run log was flushed to.
    #[serde(skip)]
    pub log_key: Option<String>,
}

impl RunResult {
    pub fn success(gameweek: Sequence, datasets: Vec<DatasetRun>) -> Self {
        Self {
            status: RunStatus::Success,
            gameweek: Some(gameweek),
            tables_processed: Some(datasets.len()),
            message: None,
            datasets,
            log_key: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Error,
            gameweek: None,
            tables_processed: None,
            message: Some(message.into()),
            datasets: Vec::new(),
            log_key: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }

    /// Status code for an HTTP trigger.
    pub fn http_status(&self) -> u16 {
        match self.status {
            RunStatus::Success => 200,
            RunStatus::Error => 500,
        }
    }

    pub fn dataset(&self, table: &str) -> Option<&DatasetRun> {
        self.datasets.iter().find(|run| run.table == table)
    }

    pub fn failed_datasets(&self) -> impl Iterator<Item = &DatasetRun> {
        self.datasets.iter().filter(|run| run.is_failed())
    }
}
