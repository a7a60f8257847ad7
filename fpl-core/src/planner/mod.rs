//! Incremental load planning.
//!
//! Given a dataset's strategy, its stored watermark and the current gameweek,
//! a `LoadPlan` says which extraction requests to make and which watermark
//! the load may record afterwards.
//!
//! Invariants, for incremental datasets:
//! - no request is made for a gameweek at or below the watermark
//! - the recorded watermark is the latest *finalized* gameweek, never the
//!   current one, so an in-progress gameweek is fetched again on the next run
//!   until it finalizes
//! - a requested gameweek that returned nothing caps the recorded watermark
//!   below it, so the next run asks for it again

pub mod state;

pub use state::{DatasetRun, InvalidTransition, RunEvent, RunState};

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use crate::domain::{DatasetKind, LoadStrategy, Sequence};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadPlan {
    /// Snapshot taken at the current gameweek.
    Full { current: Sequence },
    /// Gameweeks `from..=to`; empty when `from > to`.
    Incremental {
        watermark: Sequence,
        from: Sequence,
        to: Sequence,
    },
}

impl LoadPlan {
    pub fn new(strategy: LoadStrategy, watermark: Sequence, current: Sequence) -> Self {
        match strategy {
            LoadStrategy::Full => LoadPlan::Full { current },
            LoadStrategy::Incremental => LoadPlan::Incremental {
                watermark,
                from: watermark.saturating_add(1),
                to: current,
            },
        }
    }

    pub fn strategy(&self) -> LoadStrategy {
        match self {
            LoadPlan::Full { .. } => LoadStrategy::Full,
            LoadPlan::Incremental { .. } => LoadStrategy::Incremental,
        }
    }

    /// Gameweeks covered by the plan, in fetch order.
    pub fn sequences(&self) -> RangeInclusive<Sequence> {
        match *self {
            LoadPlan::Full { current } => current..=current,
            LoadPlan::Incremental { from, to, .. } => from..=to,
        }
    }

    /// True when an incremental plan has nothing to fetch.
    pub fn is_empty(&self) -> bool {
        self.sequences().is_empty()
    }

    /// The extraction calls to make, one per entry, in order.
    ///
    /// A full load passes no gameweek unless the dataset cannot be extracted
    /// without one, in which case it is pinned to the current gameweek.
    pub fn requests(&self, dataset: DatasetKind) -> Vec<Option<Sequence>> {
        match *self {
            LoadPlan::Full { current } => {
                if dataset.requires_sequence() {
                    vec![Some(current)]
                } else {
                    vec![None]
                }
            }
            LoadPlan::Incremental { .. } => self.sequences().map(Some).collect(),
        }
    }

    /// Watermark to record after a successful load.
    ///
    /// Full loads record the current gameweek. Incremental loads record the
    /// latest finalized gameweek, capped at the end of the fetched range.
    pub fn next_watermark(&self, latest_finalized: Sequence) -> Sequence {
        match *self {
            LoadPlan::Full { current } => current,
            LoadPlan::Incremental { to, .. } => latest_finalized.min(to),
        }
    }

    /// [`LoadPlan::next_watermark`], held below `first_missing`: the first
    /// requested gameweek that came back with no records.
    ///
    /// Never lower than the plan's starting watermark, since `first_missing`
    /// is always inside the fetched range.
    pub fn watermark_after(
        &self,
        latest_finalized: Sequence,
        first_missing: Option<Sequence>,
    ) -> Sequence {
        let next = self.next_watermark(latest_finalized);
        match (*self, first_missing) {
            (LoadPlan::Incremental { watermark, .. }, Some(gap)) => {
                next.min(gap.saturating_sub(1)).max(watermark)
            }
            _ => next,
        }
    }
}
