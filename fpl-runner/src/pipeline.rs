//! Pipeline orchestration.
//!
//! One run resolves the current gameweek, reads the dataset config and then
//! loads every selected dataset in config order:
//!
//! 1. archive the dataset's existing landing objects
//! 2. plan the load from the strategy and the stored watermark
//! 3. extract each planned request and land the batch as one object
//! 4. append an audit entry carrying the new watermark
//!
//! A failure inside one dataset is logged and isolated; only a failure to
//! resolve the current gameweek aborts the run. The run log is flushed to the
//! object store on every exit path.

use tracing::{debug, error};

use fpl_core::api::FplApi;
use fpl_core::clock::Clock;
use fpl_core::config::{read_dataset_config, DatasetConfigRow, PipelineSettings};
use fpl_core::context::RunContext;
use fpl_core::domain::{LoadStrategy, Sequence};
use fpl_core::events::{EventSink, Level, RunLog};
use fpl_core::landing::LandingWriter;
use fpl_core::ledger::{AuditLedger, WatermarkStore};
use fpl_core::planner::{DatasetRun, LoadPlan, RunEvent};
use fpl_core::sequence::{latest_finished_sequence, resolve_current_sequence};
use fpl_core::storage::ObjectStore;

use crate::error::PipelineError;
use crate::result::RunResult;

/// Everything a run reads from or writes to.
pub struct Pipeline<'a> {
    pub settings: &'a PipelineSettings,
    pub api: &'a dyn FplApi,
    pub store: &'a dyn ObjectStore,
    pub ledger: &'a dyn AuditLedger,
    pub clock: &'a dyn Clock,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        settings: &'a PipelineSettings,
        api: &'a dyn FplApi,
        store: &'a dyn ObjectStore,
        ledger: &'a dyn AuditLedger,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            settings,
            api,
            store,
            ledger,
            clock,
        }
    }

    pub fn run(&self) -> RunResult {
        let log = RunLog::new(self.clock);
        let flush = LogFlush::new(&log, self.store, &self.settings.log_prefix);
        let mut ctx = RunContext::new(self.api, &log);
        ctx.reset_bootstrap();

        log.info("========== FPL PIPELINE STARTED ==========");
        let mut result = self.execute(&mut ctx, &log);
        if result.is_success() {
            log.info("========== FPL PIPELINE COMPLETED ==========");
        }
        ctx.reset_bootstrap();

        result.log_key = flush.finish();
        result
    }

    fn execute(&self, ctx: &mut RunContext<'_>, log: &RunLog<'_>) -> RunResult {
        let current = match resolve_current_sequence(ctx) {
            Ok(current) => current,
            Err(e) => {
                let e = PipelineError::from(e);
                log.error("Could not determine current gameweek. Exiting.");
                return RunResult::error(e.to_string());
            }
        };
        log.info(&format!("Current gameweek: {current}"));

        let rows = read_dataset_config(self.store, &self.settings.config_key, log);
        let datasets = rows
            .iter()
            .filter(|row| row.is_selected(&self.settings.data_source))
            .map(|row| {
                log.info(&format!("Processing: {} ({})", row.table_name, row.load_type));
                self.process(ctx, log, row, current)
            })
            .collect();

        RunResult::success(current, datasets)
    }

    /// Load one dataset. Never fails: errors end up in the returned run.
    fn process(
        &self,
        ctx: &mut RunContext<'_>,
        log: &RunLog<'_>,
        row: &DatasetConfigRow,
        current: Sequence,
    ) -> DatasetRun {
        let mut run = DatasetRun::new(&row.table_name);
        if let Err(e) = self.load(ctx, log, row, current, &mut run) {
            log.record(
                Level::Error,
                &format!("Error processing {}: {e}", row.table_name),
                Some(&row.table_name),
            );
            run.fail(e.to_string());
        }
        debug!(table = %run.table, state = ?run.state(), "dataset finished");
        run
    }

    fn load(
        &self,
        ctx: &mut RunContext<'_>,
        log: &RunLog<'_>,
        row: &DatasetConfigRow,
        current: Sequence,
        run: &mut DatasetRun,
    ) -> Result<(), PipelineError> {
        let dataset = row.dataset()?;
        let strategy = row.strategy()?;
        let source = self.settings.data_source.as_str();
        let landing = LandingWriter::new(self.store, source, self.clock, log);
        let watermarks = WatermarkStore::new(self.ledger, source, self.clock, log);
        let table = Some(dataset.name());

        landing.archive_existing(dataset)?;

        run.apply(RunEvent::StartExtract)?;
        log.record(
            Level::Info,
            &format!("Starting extraction for: {dataset} ({strategy})"),
            table,
        );

        let watermark = match strategy {
            LoadStrategy::Incremental => {
                let watermark = watermarks.get_watermark(dataset);
                log.record(
                    Level::Info,
                    &format!("Last loaded gameweek for {dataset}: {watermark}"),
                    table,
                );
                watermark
            }
            LoadStrategy::Full => 0,
        };
        let plan = LoadPlan::new(strategy, watermark, current);

        let mut batch = Vec::new();
        let mut first_missing = None;
        for request in plan.requests(dataset) {
            if let (LoadStrategy::Incremental, Some(gameweek)) = (strategy, request) {
                log.record(
                    Level::Info,
                    &format!("Extracting {dataset} for gameweek {gameweek}"),
                    table,
                );
            }
            let records = dataset.extract(ctx, request);
            if records.is_empty() && first_missing.is_none() {
                first_missing = request;
            }
            batch.extend(records);
        }

        if strategy == LoadStrategy::Incremental && batch.is_empty() {
            log.record(
                Level::Info,
                &format!("No new data for {dataset} since gameweek {watermark}"),
                table,
            );
            run.apply(RunEvent::NothingToLoad)?;
            run.apply(RunEvent::Finish)?;
            return Ok(());
        }

        let record_count = match landing.write(dataset, &batch)? {
            Some(receipt) => {
                debug!(
                    key = %receipt.key,
                    records = receipt.record_count,
                    blake3 = %receipt.content_hash,
                    "landing object written"
                );
                receipt.record_count
            }
            None => 0,
        };
        run.apply(RunEvent::Landed { record_count })?;

        let next = match plan {
            LoadPlan::Full { .. } => plan.next_watermark(current),
            LoadPlan::Incremental { .. } => {
                let latest = latest_finished_sequence(ctx);
                let next = plan.watermark_after(latest, first_missing);
                if let Some(gap) = first_missing.filter(|_| next < plan.next_watermark(latest)) {
                    log.record(
                        Level::Warning,
                        &format!("No data for {dataset} gameweek {gap}, watermark held at {next}"),
                        table,
                    );
                }
                next
            }
        };
        // An audit failure is already logged and leaves the landing object in place.
        if watermarks
            .record(dataset, strategy, record_count, Some(next))
            .is_ok()
        {
            run.apply(RunEvent::Audited { watermark: next })?;
        }
        run.apply(RunEvent::Finish)?;

        log.record(
            Level::Success,
            &format!("Completed extraction for {dataset}"),
            table,
        );
        Ok(())
    }
}

/// Flushes the run log when dropped, unless [`LogFlush::finish`] already did.
struct LogFlush<'a> {
    log: &'a RunLog<'a>,
    store: &'a dyn ObjectStore,
    prefix: &'a str,
    done: bool,
}

impl<'a> LogFlush<'a> {
    fn new(log: &'a RunLog<'a>, store: &'a dyn ObjectStore, prefix: &'a str) -> Self {
        Self {
            log,
            store,
            prefix,
            done: false,
        }
    }

    fn finish(mut self) -> Option<String> {
        self.done = true;
        self.flush()
    }

    fn flush(&self) -> Option<String> {
        match self.log.flush(self.store, self.prefix) {
            Ok(key) => {
                debug!(key = %key, entries = self.log.len(), "run log flushed");
                Some(key)
            }
            Err(e) => {
                error!(error = %e, "failed to flush run log");
                None
            }
        }
    }
}

impl Drop for LogFlush<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.done = true;
            self.flush();
        }
    }
}

/// Convenience wrapper around [`Pipeline::run`].
pub fn run_pipeline(
    settings: &PipelineSettings,
    api: &dyn FplApi,
    store: &dyn ObjectStore,
    ledger: &dyn AuditLedger,
    clock: &dyn Clock,
) -> RunResult {
    Pipeline::new(settings, api, store, ledger, clock).run()
}
