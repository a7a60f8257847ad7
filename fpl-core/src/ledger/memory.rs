//! In-memory audit ledger.

use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{max_watermark_of, AuditEntry, AuditLedger, LedgerError};
use crate::domain::Sequence;

#[derive(Default)]
pub struct MemoryLedger {
    entries: Mutex<Vec<AuditEntry>>,
    fail_appends: Mutex<bool>,
    fail_queries: Mutex<bool>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent appends fail, to exercise audit-gap handling.
    pub fn fail_appends(&self, fail: bool) {
        *self.fail_appends.lock().unwrap_or_else(PoisonError::into_inner) = fail;
    }

    /// Make subsequent watermark queries fail.
    pub fn fail_queries(&self, fail: bool) {
        *self.fail_queries.lock().unwrap_or_else(PoisonError::into_inner) = fail;
    }

    fn lock(&self) -> MutexGuard<'_, Vec<AuditEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AuditLedger for MemoryLedger {
    fn append(&self, entry: &AuditEntry) -> Result<(), LedgerError> {
        if *self.fail_appends.lock().unwrap_or_else(PoisonError::into_inner) {
            return Err(LedgerError::Query("insert rejected".into()));
        }
        self.lock().push(entry.clone());
        Ok(())
    }

    fn max_watermark(
        &self,
        data_source: &str,
        table: &str,
    ) -> Result<Option<Sequence>, LedgerError> {
        if *self.fail_queries.lock().unwrap_or_else(PoisonError::into_inner) {
            return Err(LedgerError::Query("warehouse unavailable".into()));
        }
        Ok(max_watermark_of(self.lock().iter(), data_source, table))
    }

    fn entries(&self) -> Result<Vec<AuditEntry>, LedgerError> {
        Ok(self.lock().clone())
    }
}
