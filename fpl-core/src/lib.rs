//! FPL Core: domain types, upstream API client, extractors, storage, audit
//! ledger and load planning for the extraction pipeline.
//!
//! This crate holds everything one dataset load needs:
//! - Dataset kinds and gameweek lifecycle
//! - `FplApi` seam with a blocking HTTP client and a stub for tests
//! - Extractor registry over `DatasetKind`
//! - Object store (local filesystem, in-memory) and the landing writer
//! - Append-only audit ledger and watermark reads
//! - Load planner and the per-dataset run state machine

pub mod api;
pub mod clock;
pub mod config;
pub mod context;
pub mod domain;
pub mod events;
pub mod extract;
pub mod landing;
pub mod ledger;
pub mod planner;
pub mod sequence;
pub mod storage;

pub use api::{ApiFailure, Endpoint, FplApi};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{
    parse_dataset_config, read_dataset_config, ConfigError, DatasetConfigRow, PipelineSettings,
    WarehouseSettings,
};
pub use context::RunContext;
pub use domain::{DatasetKind, GameweekStatus, LoadStrategy, Record, Sequence};
pub use events::{EventSink, Level, LogEntry, RunLog};
pub use landing::{LandingReceipt, LandingWriter};
pub use ledger::{AuditEntry, AuditLedger, LedgerError, WatermarkStore};
pub use planner::{DatasetRun, LoadPlan, RunEvent, RunState};
pub use sequence::{latest_finished_sequence, resolve_current_sequence, SequenceError};
pub use storage::{ObjectStore, StorageError};
