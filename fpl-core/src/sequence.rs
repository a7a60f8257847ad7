//! Gameweek resolution against live upstream metadata.
//!
//! Both lookups fetch the bootstrap payload fresh, bypassing the run's
//! bootstrap cache, so the finalization check after a load sees the state at
//! that moment rather than at the start of the run.

use thiserror::Error;

use crate::api::{ApiFailure, Endpoint};
use crate::context::RunContext;
use crate::domain::gameweek::{self, GameweekStatus};
use crate::domain::Sequence;
use crate::events::Level;

/// The current gameweek could not be determined. Fatal to the run.
#[derive(Debug, Error)]
pub enum SequenceError {
    #[error(transparent)]
    Api(#[from] ApiFailure),

    #[error("malformed gameweek list: {0}")]
    Malformed(String),
}

fn fetch_gameweeks(ctx: &RunContext<'_>) -> Result<Vec<GameweekStatus>, SequenceError> {
    let payload = ctx.call(&Endpoint::Bootstrap)?;
    GameweekStatus::list_from_bootstrap(&payload)
        .map_err(|e| SequenceError::Malformed(e.to_string()))
}

/// The current gameweek, see [`gameweek::current_sequence`].
pub fn resolve_current_sequence(ctx: &RunContext<'_>) -> Result<Sequence, SequenceError> {
    let events = fetch_gameweeks(ctx)?;
    Ok(gameweek::current_sequence(&events))
}

/// The last finished and data-checked gameweek; 0 on any failure.
pub fn latest_finished_sequence(ctx: &RunContext<'_>) -> Sequence {
    match fetch_gameweeks(ctx) {
        Ok(events) => gameweek::latest_finalized(&events),
        Err(e) => {
            ctx.sink().record(
                Level::Error,
                &format!("Failed to get finished gameweek: {e}"),
                None,
            );
            0
        }
    }
}
