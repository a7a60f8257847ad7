//! Domain types for the extraction pipeline

pub mod dataset;
pub mod gameweek;

pub use dataset::{DatasetKind, LoadStrategy, UnknownDataset, UnknownLoadStrategy};
pub use gameweek::{GameweekStatus, Lifecycle};

/// One flat extracted record. Field order follows the upstream payload.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Gameweek id, the unit of incremental progress.
pub type Sequence = u32;
