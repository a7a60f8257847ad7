//! JSONL audit ledger: one JSON object per line, append-only.
//!
//! Each line is independent, so a partial trailing write loses at most one
//! entry. Malformed lines are skipped on read.

use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use super::{max_watermark_of, AuditEntry, AuditLedger, LedgerError};
use crate::domain::Sequence;

pub struct JsonlLedger {
    path: PathBuf,
}

impl JsonlLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditLedger for JsonlLedger {
    fn append(&self, entry: &AuditEntry) -> Result<(), LedgerError> {
        let json = serde_json::to_string(entry)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{json}")?;
        file.flush()?;
        Ok(())
    }

    fn max_watermark(
        &self,
        data_source: &str,
        table: &str,
    ) -> Result<Option<Sequence>, LedgerError> {
        let entries = self.entries()?;
        Ok(max_watermark_of(&entries, data_source, table))
    }

    fn entries(&self) -> Result<Vec<AuditEntry>, LedgerError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let reader = io::BufReader::new(fs::File::open(&self.path)?);
        let mut entries = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            if let Ok(entry) = serde_json::from_str::<AuditEntry>(&line) {
                entries.push(entry);
            }
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::AuditStatus;

    fn entry(watermark: Option<&str>) -> AuditEntry {
        AuditEntry {
            data_source: "fpl-api".into(),
            tablename: "gameweek_live".into(),
            load_type: "incremental".into(),
            record_count: 600,
            load_watermark: watermark.map(str::to_string),
            load_timestamp: "2025-01-01T12:00:00".into(),
            status: AuditStatus::Success,
        }
    }

    #[test]
    fn appends_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = JsonlLedger::new(dir.path().join("warehouse/audit_log.jsonl"));

        ledger.append(&entry(Some("3"))).unwrap();
        ledger.append(&entry(Some("5"))).unwrap();

        let entries = ledger.entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].load_watermark.as_deref(), Some("5"));
        assert_eq!(ledger.max_watermark("fpl-api", "gameweek_live").unwrap(), Some(5));

        let raw = std::fs::read_to_string(ledger.path()).unwrap();
        assert_eq!(raw.lines().count(), 2);
    }

    #[test]
    fn missing_file_is_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = JsonlLedger::new(dir.path().join("none.jsonl"));
        assert!(ledger.entries().unwrap().is_empty());
        assert_eq!(ledger.max_watermark("fpl-api", "teams").unwrap(), None);
    }

    #[test]
    fn skips_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let good = serde_json::to_string(&entry(Some("2"))).unwrap();
        std::fs::write(&path, format!("{good}\n{{not json\n\n")).unwrap();

        let ledger = JsonlLedger::new(path);
        assert_eq!(ledger.entries().unwrap().len(), 1);
    }
}
