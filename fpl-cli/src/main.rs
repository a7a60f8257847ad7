//! FPL CLI: pipeline run and maintenance commands.
//!
//! Commands:
//! - `run`: one extraction run against the local object store and ledger
//! - `watermark`: print a dataset's stored watermark
//! - `archive`: move a dataset's landing objects into the archive
//! - `bronze-ddl`: print the bronze external table statements
//! - `refresh`: dry-run a bronze or silver layer refresh

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use fpl_core::api::HttpApi;
use fpl_core::clock::SystemClock;
use fpl_core::config::PipelineSettings;
use fpl_core::domain::DatasetKind;
use fpl_core::events::RunLog;
use fpl_core::landing::LandingWriter;
use fpl_core::ledger::{JsonlLedger, WatermarkStore};
use fpl_core::storage::LocalObjectStore;
use fpl_runner::{
    bronze_statements, load_sql_dir, run_pipeline, LayerRefresh, RefreshStatus, StatementRunner,
};

#[derive(Parser)]
#[command(name = "fpl", about = "FPL CLI: incremental extraction pipeline")]
struct Cli {
    /// Path to the TOML settings file. Defaults apply when it does not exist.
    #[arg(long, global = true, default_value = "fpl.toml")]
    settings: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline once and print the run result as JSON.
    Run,
    /// Print the stored watermark for a dataset.
    Watermark {
        /// Dataset name, e.g. gameweek_live.
        dataset: String,
    },
    /// Archive the existing landing objects of a dataset.
    Archive {
        dataset: String,
    },
    /// Print the bronze layer DDL for every dataset.
    BronzeDdl,
    /// Walk a layer refresh, printing each statement instead of executing it.
    Refresh {
        #[arg(value_enum)]
        layer: Layer,
        /// Directory of `*.sql` files for the silver layer.
        #[arg(long, default_value = "sql/silver")]
        sql_dir: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Layer {
    Bronze,
    Silver,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = load_settings(&cli.settings)?;

    match cli.command {
        Commands::Run => run_cmd(&settings),
        Commands::Watermark { dataset } => watermark_cmd(&settings, &dataset),
        Commands::Archive { dataset } => archive_cmd(&settings, &dataset),
        Commands::BronzeDdl => bronze_ddl_cmd(&settings),
        Commands::Refresh { layer, sql_dir } => refresh_cmd(&settings, layer, &sql_dir),
    }
}

fn load_settings(path: &Path) -> Result<PipelineSettings> {
    let settings = PipelineSettings::load_or_default(path)
        .with_context(|| format!("loading settings from {}", path.display()))?;
    info!(
        settings = %path.display(),
        storage_root = %settings.storage_root.display(),
        data_source = %settings.data_source,
        "settings loaded"
    );
    Ok(settings)
}

fn parse_dataset(name: &str) -> Result<DatasetKind> {
    name.parse::<DatasetKind>()
        .with_context(|| format!("expected one of: {}", dataset_names()))
}

fn dataset_names() -> String {
    DatasetKind::ALL
        .iter()
        .map(|d| d.name())
        .collect::<Vec<_>>()
        .join(", ")
}

fn run_cmd(settings: &PipelineSettings) -> Result<()> {
    let api = HttpApi::new(settings.http_options()).context("building HTTP client")?;
    let store = LocalObjectStore::new(&settings.storage_root);
    let ledger = JsonlLedger::new(settings.ledger_path());
    let clock = SystemClock;

    let result = run_pipeline(settings, &api, &store, &ledger, &clock);
    println!("{}", serde_json::to_string_pretty(&result)?);

    if !result.is_success() {
        bail!(
            "pipeline failed: {}",
            result.message.as_deref().unwrap_or("unknown error")
        );
    }
    if let Some(key) = &result.log_key {
        info!(log = %key, "run log written");
    }
    Ok(())
}

fn watermark_cmd(settings: &PipelineSettings, dataset: &str) -> Result<()> {
    let dataset = parse_dataset(dataset)?;
    let ledger = JsonlLedger::new(settings.ledger_path());
    let clock = SystemClock;
    let log = RunLog::new(&clock);
    let store = WatermarkStore::new(&ledger, &settings.data_source, &clock, &log);

    println!("{}", store.get_watermark(dataset));
    Ok(())
}

fn archive_cmd(settings: &PipelineSettings, dataset: &str) -> Result<()> {
    let dataset = parse_dataset(dataset)?;
    let store = LocalObjectStore::new(&settings.storage_root);
    let clock = SystemClock;
    let log = RunLog::new(&clock);
    let writer = LandingWriter::new(&store, &settings.data_source, &clock, &log);

    let moved = writer
        .archive_existing(dataset)
        .with_context(|| format!("archiving {dataset}"))?;
    for object in &moved {
        println!("{} -> {}", object.from, object.to);
    }
    println!("{} object(s) archived", moved.len());
    Ok(())
}

fn bronze_ddl_cmd(settings: &PipelineSettings) -> Result<()> {
    let statements = bronze_statements(
        &settings.warehouse.project,
        &settings.warehouse.bucket,
        &settings.data_source,
        &DatasetKind::ALL,
    );
    for (_, sql) in statements {
        println!("{sql};\n");
    }
    Ok(())
}

/// Prints statements to stdout; no warehouse connection is made.
struct DryRun;

impl StatementRunner for DryRun {
    fn execute(&self, sql: &str) -> Result<(), String> {
        println!("{sql};\n");
        Ok(())
    }
}

fn layer_refresh(
    settings: &PipelineSettings,
    layer: Layer,
    sql_dir: &Path,
) -> Result<LayerRefresh> {
    let name = match layer {
        Layer::Bronze => "bronze",
        Layer::Silver => "silver",
    };
    let statements = match layer {
        Layer::Bronze => bronze_statements(
            &settings.warehouse.project,
            &settings.warehouse.bucket,
            &settings.data_source,
            &DatasetKind::ALL,
        ),
        Layer::Silver => load_sql_dir(sql_dir)
            .with_context(|| format!("reading silver SQL from {}", sql_dir.display()))?,
    };
    if statements.is_empty() {
        bail!("no statements for the {name} layer");
    }
    Ok(LayerRefresh::new(name, statements))
}

fn refresh_cmd(settings: &PipelineSettings, layer: Layer, sql_dir: &Path) -> Result<()> {
    let refresh = layer_refresh(settings, layer, sql_dir)?;
    let report = refresh.refresh(&DryRun);
    println!("{}", serde_json::to_string_pretty(&report)?);
    if report.status != RefreshStatus::Success {
        bail!("{} refresh returned {}", refresh.layer, report.http_status());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_refresh_with_sql_dir() {
        let cli = Cli::parse_from(["fpl", "refresh", "silver", "--sql-dir", "queries"]);
        match cli.command {
            Commands::Refresh { layer, sql_dir } => {
                assert_eq!(layer, Layer::Silver);
                assert_eq!(sql_dir, PathBuf::from("queries"));
            }
            _ => panic!("expected refresh"),
        }
    }

    #[test]
    fn bronze_refresh_covers_every_dataset() {
        let settings = PipelineSettings::default();
        let refresh = layer_refresh(&settings, Layer::Bronze, Path::new("unused")).unwrap();
        assert_eq!(refresh.layer, "bronze");
        assert_eq!(refresh.statements().len(), DatasetKind::ALL.len());

        let report = refresh.refresh(&DryRun);
        assert_eq!(report.status, RefreshStatus::Success);
        assert_eq!(report.tables.len(), DatasetKind::ALL.len());
    }

    #[test]
    fn silver_refresh_reads_the_sql_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("players.sql"), "SELECT 1").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "skip me").unwrap();

        let settings = PipelineSettings::default();
        let refresh = layer_refresh(&settings, Layer::Silver, dir.path()).unwrap();
        assert_eq!(refresh.layer, "silver");
        assert_eq!(
            refresh.statements(),
            &[("players".to_string(), "SELECT 1".to_string())]
        );
    }

    #[test]
    fn silver_refresh_without_sql_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(layer_refresh(&PipelineSettings::default(), Layer::Silver, dir.path()).is_err());
        let missing = dir.path().join("missing");
        assert!(layer_refresh(&PipelineSettings::default(), Layer::Silver, &missing).is_err());
    }
}
