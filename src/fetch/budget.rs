//! Run-wide failure budget for resource fetches.
//!
//! Every failed playlist fetch across the whole run counts against a single
//! budget. Exhausting it means the source has become systemically unreachable
//! (as opposed to isolated dead links), so the run is aborted rather than
//! burning time on further fetches. The budget is owned by the run and injected
//! into the downloader, keeping the circuit breaker testable in isolation.

use std::sync::atomic::{AtomicU32, Ordering};

use tracing::warn;

/// Default maximum number of failed fetch attempts per run.
pub const DEFAULT_FAIL_LIMIT: u32 = 50;

/// Shared counter of failed fetch attempts with a fixed limit.
#[derive(Debug)]
pub struct FailureBudget {
    limit: u32,
    failed: AtomicU32,
}

impl Default for FailureBudget {
    fn default() -> Self {
        Self::new(DEFAULT_FAIL_LIMIT)
    }
}

impl FailureBudget {
    /// Creates a budget allowing up to `limit` failed attempts.
    #[must_use]
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            failed: AtomicU32::new(0),
        }
    }

    /// Returns the configured limit.
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Returns the number of failures recorded so far.
    #[must_use]
    pub fn failed(&self) -> u32 {
        self.failed.load(Ordering::SeqCst)
    }

    /// Records one failed attempt.
    ///
    /// Returns `true` while the run is still within budget; `false` once the
    /// recorded failure pushed the count past the limit.
    pub fn record_failure(&self) -> bool {
        let count = self.failed.fetch_add(1, Ordering::SeqCst) + 1;
        if count > self.limit {
            warn!(count, limit = self.limit, "failure budget exhausted");
            return false;
        }
        true
    }
}
