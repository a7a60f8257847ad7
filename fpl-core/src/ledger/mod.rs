//! Append-only audit ledger.
//!
//! One `AuditEntry` per successful dataset load. Entries are never updated or
//! deleted; the watermark of a dataset is derived from its history.

pub mod jsonl;
pub mod memory;
pub mod watermark;

pub use jsonl::JsonlLedger;
pub use memory::MemoryLedger;
pub use watermark::WatermarkStore;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Sequence;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("audit ledger I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("audit entry serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("audit ledger query failed: {0}")]
    Query(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditStatus {
    Success,
}

/// One row of the audit ledger, in warehouse column naming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub data_source: String,
    pub tablename: String,
    pub load_type: String,
    pub record_count: u64,
    /// Stored as a string; null when no watermark applies.
    pub load_watermark: Option<String>,
    /// ISO-8601 local time.
    pub load_timestamp: String,
    pub status: AuditStatus,
}

impl AuditEntry {
    pub fn watermark(&self) -> Option<Sequence> {
        self.load_watermark.as_deref()?.trim().parse().ok()
    }
}

pub trait AuditLedger: Send + Sync {
    fn append(&self, entry: &AuditEntry) -> Result<(), LedgerError>;

    /// Highest non-null watermark recorded for a table of a data source.
    fn max_watermark(
        &self,
        data_source: &str,
        table: &str,
    ) -> Result<Option<Sequence>, LedgerError>;

    fn entries(&self) -> Result<Vec<AuditEntry>, LedgerError>;
}

/// `MAX(load_watermark)` over entries matching source and table. Values that
/// are not integers do not count.
pub(crate) fn max_watermark_of<'e>(
    entries: impl IntoIterator<Item = &'e AuditEntry>,
    data_source: &str,
    table: &str,
) -> Option<Sequence> {
    entries
        .into_iter()
        .filter(|e| e.data_source == data_source && e.tablename == table)
        .filter_map(AuditEntry::watermark)
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(source: &str, table: &str, watermark: Option<&str>) -> AuditEntry {
        AuditEntry {
            data_source: source.into(),
            tablename: table.into(),
            load_type: "incremental".into(),
            record_count: 1,
            load_watermark: watermark.map(str::to_string),
            load_timestamp: "2025-01-01T00:00:00".into(),
            status: AuditStatus::Success,
        }
    }

    #[test]
    fn max_is_numeric_not_lexicographic() {
        let entries = [
            entry("fpl-api", "gameweek_live", Some("9")),
            entry("fpl-api", "gameweek_live", Some("10")),
            entry("fpl-api", "gameweek_live", None),
        ];
        assert_eq!(max_watermark_of(&entries, "fpl-api", "gameweek_live"), Some(10));
    }

    #[test]
    fn max_filters_by_source_and_table() {
        let entries = [
            entry("fpl-api", "fixtures", Some("30")),
            entry("other", "gameweek_live", Some("20")),
            entry("fpl-api", "gameweek_live", Some("3")),
            entry("fpl-api", "gameweek_live", Some("garbage")),
        ];
        assert_eq!(max_watermark_of(&entries, "fpl-api", "gameweek_live"), Some(3));
        assert_eq!(max_watermark_of(&entries, "fpl-api", "teams"), None);
    }

    #[test]
    fn entry_serializes_in_warehouse_shape() {
        let json = serde_json::to_value(entry("fpl-api", "teams", None)).unwrap();
        assert_eq!(json["status"], "SUCCESS");
        assert!(json["load_watermark"].is_null());
        assert_eq!(json["tablename"], "teams");
    }
}
