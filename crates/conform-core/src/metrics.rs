//! Atomic counters for harness observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. at the end of a run).

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Lightweight atomic counters. No allocations, no locking.
///
/// One instance is shared by every task of a run.
#[derive(Debug)]
pub struct Metrics {
    invocations: AtomicU64,
    launch_failures: AtomicU64,
    timeouts: AtomicU64,
    skipped_invocations: AtomicU64,
    copies: AtomicU64,
    copy_failures: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            invocations: AtomicU64::new(0),
            launch_failures: AtomicU64::new(0),
            timeouts: AtomicU64::new(0),
            skipped_invocations: AtomicU64::new(0),
            copies: AtomicU64::new(0),
            copy_failures: AtomicU64::new(0),
        }
    }

    pub fn inc_invocations(&self) {
        self.invocations.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "invocations", "counter incremented");
    }

    pub fn inc_launch_failures(&self) {
        self.launch_failures.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "launch_failures", "counter incremented");
    }

    pub fn inc_timeouts(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "timeouts", "counter incremented");
    }

    /// Ignored entries classified without running the validator.
    pub fn inc_skipped_invocations(&self) {
        self.skipped_invocations.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "skipped_invocations", "counter incremented");
    }

    pub fn inc_copies(&self) {
        self.copies.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "copies", "counter incremented");
    }

    pub fn inc_copy_failures(&self) {
        self.copy_failures.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "copy_failures", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            invocations = self.invocations(),
            launch_failures = self.launch_failures(),
            timeouts = self.timeouts(),
            skipped_invocations = self.skipped_invocations(),
            copies = self.copies(),
            copy_failures = self.copy_failures(),
        );
    }

    pub fn invocations(&self) -> u64 {
        self.invocations.load(Ordering::Relaxed)
    }

    pub fn launch_failures(&self) -> u64 {
        self.launch_failures.load(Ordering::Relaxed)
    }

    pub fn timeouts(&self) -> u64 {
        self.timeouts.load(Ordering::Relaxed)
    }

    pub fn skipped_invocations(&self) -> u64 {
        self.skipped_invocations.load(Ordering::Relaxed)
    }

    pub fn copies(&self) -> u64 {
        self.copies.load(Ordering::Relaxed)
    }

    pub fn copy_failures(&self) -> u64 {
        self.copy_failures.load(Ordering::Relaxed)
    }

    /// Current values of every counter.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            invocations: self.invocations(),
            launch_failures: self.launch_failures(),
            timeouts: self.timeouts(),
            skipped_invocations: self.skipped_invocations(),
            copies: self.copies(),
            copy_failures: self.copy_failures(),
        }
    }
}

/// Counter values of one finished run, as carried in the run report.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub invocations: u64,
    pub launch_failures: u64,
    pub timeouts: u64,
    pub skipped_invocations: u64,
    pub copies: u64,
    pub copy_failures: u64,
}
