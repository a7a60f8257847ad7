//! Per-dataset run state machine.
//!
//! ```text
//! Pending -> Extracting -> Empty ----------------------> Done
//!                       -> Written -> Audited ---------> Done
//!                                  -> (audit failed) --> Done
//! any non-terminal state -> Failed
//! ```
//!
//! `Written` means the landing step completed; for a full load with zero
//! records nothing was stored but the load is still audited.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Sequence;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    Pending,
    Extracting,
    /// Nothing to load. No landing write, no audit entry.
    Empty,
    Written { record_count: usize },
    Audited { record_count: usize, watermark: Sequence },
    Done { record_count: usize, watermark: Option<Sequence> },
    Failed { reason: String },
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Done { .. } | RunState::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    StartExtract,
    NothingToLoad,
    Landed { record_count: usize },
    Audited { watermark: Sequence },
    Finish,
    Fail(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition from {from:?} on {event:?}")]
pub struct InvalidTransition {
    pub from: RunState,
    pub event: RunEvent,
}

impl RunState {
    pub fn on(self, event: RunEvent) -> Result<RunState, InvalidTransition> {
        use RunState as S;
        let next = match (&self, &event) {
            (s, RunEvent::Fail(reason)) if !s.is_terminal() => S::Failed {
                reason: reason.clone(),
            },
            (S::Pending, RunEvent::StartExtract) => S::Extracting,
            (S::Extracting, RunEvent::NothingToLoad) => S::Empty,
            (S::Extracting, RunEvent::Landed { record_count }) => S::Written {
                record_count: *record_count,
            },
            (S::Written { record_count }, RunEvent::Audited { watermark }) => S::Audited {
                record_count: *record_count,
                watermark: *watermark,
            },
            (S::Empty, RunEvent::Finish) => S::Done {
                record_count: 0,
                watermark: None,
            },
            (S::Written { record_count }, RunEvent::Finish) => S::Done {
                record_count: *record_count,
                watermark: None,
            },
            (S::Audited { record_count, watermark }, RunEvent::Finish) => S::Done {
                record_count: *record_count,
                watermark: Some(*watermark),
            },
            _ => return Err(InvalidTransition { from: self, event }),
        };
        Ok(next)
    }
}

/// The state of one dataset within one run, with its transition history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRun {
    pub table: String,
    state: RunState,
    history: Vec<RunState>,
}

impl DatasetRun {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            state: RunState::Pending,
            history: vec![RunState::Pending],
        }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Every state visited, starting with `Pending`.
    pub fn history(&self) -> &[RunState] {
        &self.history
    }

    pub fn apply(&mut self, event: RunEvent) -> Result<&RunState, InvalidTransition> {
        let next = self.state.clone().on(event)?;
        self.history.push(next.clone());
        self.state = next;
        Ok(&self.state)
    }

    /// Move to `Failed` unless already terminal.
    pub fn fail(&mut self, reason: impl Into<String>) {
        if !self.state.is_terminal() {
            let _ = self.apply(RunEvent::Fail(reason.into()));
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, RunState::Failed { .. })
    }

    pub fn watermark(&self) -> Option<Sequence> {
        match self.state {
            RunState::Audited { watermark, .. } => Some(watermark),
            RunState::Done { watermark, .. } => watermark,
            _ => None,
        }
    }
}
