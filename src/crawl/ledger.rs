//! Bad URL ledger
//!
//! Same-host links that fell outside the crawl scope. These usually point at
//! a misconfigured root path, so they are kept for the operator instead of
//! being dropped.

use std::sync::{Mutex, PoisonError};

use tracing::warn;

use crate::core::BadUrlRecord;

/// Append-only list of out-of-scope links for one session
#[derive(Debug, Default)]
pub struct BadUrlLedger {
    records: Mutex<Vec<BadUrlRecord>>,
}

impl BadUrlLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a link. Duplicates are kept.
    pub fn record(&self, parent_url: impl Into<String>, bad_url: impl Into<String>) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(BadUrlRecord::new(parent_url, bad_url));
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of every record, in insertion order
    pub fn records(&self) -> Vec<BadUrlRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Log the collected links as a diagnostic list
    pub fn report(&self, session: &str) {
        let records = self.records();
        if records.is_empty() {
            return;
        }

        warn!(
            session,
            count = records.len(),
            "links outside the crawl scope were skipped, are these URLs bad?"
        );
        for record in &records {
            warn!(session, parent = %record.parent_url, "  {}", record.bad_url);
        }
    }
}
