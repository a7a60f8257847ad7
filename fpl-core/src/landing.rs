//! Landing zone writer.
//!
//! Layout:
//! - primary: `landing/{source}/{dataset}/{dataset}_{DDMMYYYY}.json`
//! - archive: `landing/{source}/archive/{dataset}/{YYYY}/{MM}/{DD}/{filename}`
//!
//! Each cycle archives whatever sits in the primary namespace, then writes one
//! new newline-delimited JSON object. A second write on the same day replaces
//! the first. Archival is copy-then-delete; a crash between the two leaves the
//! object in both places.

use chrono::{Datelike, NaiveDate};

use crate::clock::Clock;
use crate::domain::{DatasetKind, Record};
use crate::events::{EventSink, Level};
use crate::storage::{ObjectStore, StorageError};

/// A landing object written by [`LandingWriter::write`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LandingReceipt {
    pub key: String,
    pub record_count: usize,
    /// BLAKE3 of the object body.
    pub content_hash: String,
}

/// One relocation performed by [`LandingWriter::archive_existing`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedObject {
    pub from: String,
    pub to: String,
}

pub struct LandingWriter<'a> {
    store: &'a dyn ObjectStore,
    data_source: &'a str,
    clock: &'a dyn Clock,
    sink: &'a dyn EventSink,
}

impl<'a> LandingWriter<'a> {
    pub fn new(
        store: &'a dyn ObjectStore,
        data_source: &'a str,
        clock: &'a dyn Clock,
        sink: &'a dyn EventSink,
    ) -> Self {
        Self {
            store,
            data_source,
            clock,
            sink,
        }
    }

    /// `landing/{source}/{dataset}/`
    pub fn dataset_prefix(&self, dataset: DatasetKind) -> String {
        format!("landing/{}/{}/", self.data_source, dataset)
    }

    pub fn landing_key(&self, dataset: DatasetKind, date: NaiveDate) -> String {
        format!(
            "{}{dataset}_{}.json",
            self.dataset_prefix(dataset),
            date.format("%d%m%Y")
        )
    }

    pub fn archive_key(&self, dataset: DatasetKind, date: NaiveDate, filename: &str) -> String {
        format!(
            "landing/{}/archive/{dataset}/{:04}/{:02}/{:02}/{filename}",
            self.data_source,
            date.year(),
            date.month(),
            date.day()
        )
    }

    /// Move every live landing object of `dataset` into its dated archive path.
    pub fn archive_existing(
        &self,
        dataset: DatasetKind,
    ) -> Result<Vec<ArchivedObject>, StorageError> {
        let existing: Vec<String> = self
            .store
            .list(&self.dataset_prefix(dataset))?
            .into_iter()
            .filter(|key| key.ends_with(".json") && !key.contains("/archive/"))
            .collect();

        if existing.is_empty() {
            self.sink.record(
                Level::Info,
                &format!("No existing files to archive for {dataset}"),
                Some(dataset.name()),
            );
            return Ok(Vec::new());
        }

        let mut moved = Vec::with_capacity(existing.len());
        for key in existing {
            let filename = key.rsplit('/').next().unwrap_or(&key).to_string();
            let date = date_suffix(&filename).unwrap_or_else(|| self.clock.today());
            let target = self.archive_key(dataset, date, &filename);

            self.store.copy(&key, &target)?;
            self.store.delete(&key)?;

            self.sink.record(
                Level::Info,
                &format!("Archived {key} → {target}"),
                Some(dataset.name()),
            );
            moved.push(ArchivedObject { from: key, to: target });
        }
        Ok(moved)
    }

    /// Write `records` as today's landing object. Nothing is written for an
    /// empty batch.
    pub fn write(
        &self,
        dataset: DatasetKind,
        records: &[Record],
    ) -> Result<Option<LandingReceipt>, StorageError> {
        if records.is_empty() {
            self.sink.record(
                Level::Warning,
                &format!("No data to save for {dataset}"),
                Some(dataset.name()),
            );
            return Ok(None);
        }

        let body = to_ndjson(records)?;
        let key = self.landing_key(dataset, self.clock.today());
        self.store.put(&key, body.as_bytes())?;

        let receipt = LandingReceipt {
            key,
            record_count: records.len(),
            content_hash: blake3::hash(body.as_bytes()).to_hex().to_string(),
        };
        self.sink.record(
            Level::Success,
            &format!("{} records saved to {}", receipt.record_count, receipt.key),
            Some(dataset.name()),
        );
        Ok(Some(receipt))
    }
}

/// Records serialized one per line, joined with `\n`, no trailing newline.
pub fn to_ndjson(records: &[Record]) -> Result<String, StorageError> {
    let lines = records
        .iter()
        .map(serde_json::to_string)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    Ok(lines.join("\n"))
}

/// Date embedded in a landing filename: the `DDMMYYYY` between the last `_`
/// and the extension.
pub fn date_suffix(filename: &str) -> Option<NaiveDate> {
    let stem = filename.split('.').next()?;
    let (_, suffix) = stem.rsplit_once('_')?;
    if suffix.len() != 8 || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(suffix, "%d%m%Y").ok()
}
