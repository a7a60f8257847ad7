//! Runner errors.

use thiserror::Error;

use fpl_core::domain::{UnknownDataset, UnknownLoadStrategy};
use fpl_core::planner::InvalidTransition;
use fpl_core::sequence::SequenceError;
use fpl_core::storage::StorageError;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The one fatal path: without a current gameweek nothing is processed.
    #[error("could not determine current gameweek: {0}")]
    SequenceResolution(#[from] SequenceError),

    #[error(transparent)]
    Dataset(#[from] UnknownDataset),

    #[error(transparent)]
    LoadStrategy(#[from] UnknownLoadStrategy),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Transition(#[from] InvalidTransition),
}
