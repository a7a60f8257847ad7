//! Run event log.
//!
//! Every pipeline event is recorded into an `EventSink`. `RunLog` keeps the
//! events of one run in memory, mirrors each one to `tracing`, and is flushed
//! as a single JSON document to the object store when the run ends.

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};

use crate::clock::Clock;
use crate::storage::{ObjectStore, StorageError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

/// One recorded event, in the shape written to the log file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub event_type: Level,
    pub message: String,
    pub table: Option<String>,
}

pub trait EventSink {
    fn record(&self, level: Level, message: &str, dataset: Option<&str>);

    fn info(&self, message: &str) {
        self.record(Level::Info, message, None);
    }

    fn error(&self, message: &str) {
        self.record(Level::Error, message, None);
    }
}

/// In-memory event buffer for a single run.
pub struct RunLog<'a> {
    clock: &'a dyn Clock,
    entries: Mutex<Vec<LogEntry>>,
}

impl<'a> RunLog<'a> {
    pub fn new(clock: &'a dyn Clock) -> Self {
        Self {
            clock,
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Object key for this run's log file: `{prefix}/pipeline_log_{YYYYMMDDHHMMSS}.json`.
    pub fn flush_key(&self, prefix: &str) -> String {
        let stamp = self.clock.now().format("%Y%m%d%H%M%S");
        format!("{}/pipeline_log_{stamp}.json", prefix.trim_end_matches('/'))
    }

    /// Write all recorded entries as a pretty-printed JSON array.
    ///
    /// Returns the key written. Entries stay in the buffer.
    pub fn flush(&self, store: &dyn ObjectStore, prefix: &str) -> Result<String, StorageError> {
        let key = self.flush_key(prefix);
        let body = serde_json::to_vec_pretty(&*self.lock())
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        store.put(&key, &body)?;
        tracing::info!(key = %key, "run log flushed");
        Ok(key)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LogEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventSink for RunLog<'_> {
    fn record(&self, level: Level, message: &str, dataset: Option<&str>) {
        let table = dataset.unwrap_or("-");
        match level {
            Level::Info => tracing::info!(table, "{message}"),
            Level::Success => tracing::info!(table, success = true, "{message}"),
            Level::Warning => tracing::warn!(table, "{message}"),
            Level::Error => tracing::error!(table, "{message}"),
        }
        self.lock().push(LogEntry {
            timestamp: self.clock.now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            event_type: level,
            message: message.to_string(),
            table: dataset.map(str::to_string),
        });
    }
}
