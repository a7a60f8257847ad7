//! FPL Runner: pipeline orchestration and warehouse layer refresh.
//!
//! This crate builds on `fpl-core` to provide:
//! - `Pipeline::run`: one full extraction run over the configured datasets
//! - The run result returned to the CLI or an HTTP trigger
//! - Bronze/silver layer refresh through a `StatementRunner`

pub mod error;
pub mod layers;
pub mod pipeline;
pub mod result;

pub use error::PipelineError;
pub use layers::{
    bronze_statements, load_sql_dir, LayerRefresh, RefreshReport, RefreshStatus, StatementRunner,
};
pub use pipeline::{run_pipeline, Pipeline};
pub use result::{RunResult, RunStatus};
