//! Watermark reads and audit writes for one data source.

use super::{AuditEntry, AuditLedger, AuditStatus, LedgerError};
use crate::clock::Clock;
use crate::domain::{DatasetKind, LoadStrategy, Sequence};
use crate::events::{EventSink, Level};

pub struct WatermarkStore<'a> {
    ledger: &'a dyn AuditLedger,
    data_source: &'a str,
    clock: &'a dyn Clock,
    sink: &'a dyn EventSink,
}

impl<'a> WatermarkStore<'a> {
    pub fn new(
        ledger: &'a dyn AuditLedger,
        data_source: &'a str,
        clock: &'a dyn Clock,
        sink: &'a dyn EventSink,
    ) -> Self {
        Self {
            ledger,
            data_source,
            clock,
            sink,
        }
    }

    /// Highest gameweek ingested for a dataset. 0 when there is no history
    /// or the ledger cannot be queried.
    pub fn get_watermark(&self, dataset: DatasetKind) -> Sequence {
        match self.ledger.max_watermark(self.data_source, dataset.name()) {
            Ok(watermark) => watermark.unwrap_or(0),
            Err(e) => {
                self.sink.record(
                    Level::Warning,
                    &format!("Watermark query failed for {dataset}, starting from 0: {e}"),
                    Some(dataset.name()),
                );
                0
            }
        }
    }

    /// Append one audit entry. A watermark of 0 is stored as null.
    ///
    /// Failure is logged and returned; the caller does not undo the landing
    /// write that preceded it.
    pub fn record(
        &self,
        dataset: DatasetKind,
        strategy: LoadStrategy,
        record_count: usize,
        watermark: Option<Sequence>,
    ) -> Result<AuditEntry, LedgerError> {
        let entry = AuditEntry {
            data_source: self.data_source.to_string(),
            tablename: dataset.name().to_string(),
            load_type: strategy.as_str().to_string(),
            record_count: record_count as u64,
            load_watermark: watermark.filter(|w| *w > 0).map(|w| w.to_string()),
            load_timestamp: self.clock.now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            status: AuditStatus::Success,
        };

        match self.ledger.append(&entry) {
            Ok(()) => {
                self.sink.record(
                    Level::Success,
                    &format!("Audit log updated for {dataset}"),
                    Some(dataset.name()),
                );
                Ok(entry)
            }
            Err(e) => {
                self.sink.record(
                    Level::Error,
                    &format!("Failed to write audit log for {dataset}: {e}"),
                    Some(dataset.name()),
                );
                Err(e)
            }
        }
    }
}
