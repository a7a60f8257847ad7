//! Gameweek metadata and lifecycle.
//!
//! A gameweek moves `NotStarted -> InProgress -> Provisional -> Final`.
//! Only `Final` (finished and data checked) lets a watermark advance.

use serde::{Deserialize, Serialize};

use super::Sequence;

/// The subset of a bootstrap `events` entry the planner reads.
///
/// Decoding is strict: an event without one of these fields fails the
/// whole list. Every other upstream field is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameweekStatus {
    pub id: Sequence,
    pub is_current: bool,
    pub finished: bool,
    pub data_checked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifecycle {
    NotStarted,
    InProgress,
    /// Finished, but stats may still be corrected upstream.
    Provisional,
    /// Finished and data checked.
    Final,
}

impl GameweekStatus {
    pub fn lifecycle(&self) -> Lifecycle {
        match (self.finished, self.data_checked, self.is_current) {
            (true, true, _) => Lifecycle::Final,
            (true, false, _) => Lifecycle::Provisional,
            (false, _, true) => Lifecycle::InProgress,
            (false, _, false) => Lifecycle::NotStarted,
        }
    }

    pub fn is_final(&self) -> bool {
        self.lifecycle() == Lifecycle::Final
    }

    /// Decode the `events` array of a bootstrap payload.
    pub fn list_from_bootstrap(
        bootstrap: &serde_json::Value,
    ) -> Result<Vec<GameweekStatus>, serde_json::Error> {
        let events = bootstrap
            .get("events")
            .cloned()
            .unwrap_or(serde_json::Value::Null);
        serde_json::from_value(events)
    }
}

/// The active gameweek: first event flagged current, else the last finished
/// one, else gameweek 1.
pub fn current_sequence(events: &[GameweekStatus]) -> Sequence {
    if let Some(current) = events.iter().find(|e| e.is_current) {
        return current.id;
    }
    events.iter().rev().find(|e| e.finished).map_or(1, |e| e.id)
}

/// The last gameweek that is both finished and data checked, 0 if none.
pub fn latest_finalized(events: &[GameweekStatus]) -> Sequence {
    events.iter().rev().find(|e| e.is_final()).map_or(0, |e| e.id)
}
