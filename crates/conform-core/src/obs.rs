//! Structured observability hooks for the harness run lifecycle.
//!
//! This module provides:
//! - A run-scoped tracing span to instrument the run future with
//! - Emission functions for key lifecycle events: start, dispatch, remediation, finish
//!
//! Events are emitted at `info!` level (filter with `RUST_LOG`).

use std::path::Path;

use tracing::info;

/// Span tagged with the run id. Attach it with
/// [`tracing::Instrument::instrument`] so it follows the run across awaits.
pub fn run_span(run_id: &str) -> tracing::Span {
    tracing::info_span!("conform.run", run_id = %run_id)
}

/// Emit event: run started against a corpus directory.
pub fn emit_run_started(run_id: &str, corpus_dir: &Path, validator: &Path) {
    info!(
        event = "run.started",
        run_id = %run_id,
        corpus_dir = %corpus_dir.display(),
        validator = %validator.display(),
    );
}

/// Emit event: every corpus entry has been classified.
pub fn emit_dispatch_finished(entries: usize, misclassified: usize, duration_ms: u64) {
    info!(
        event = "dispatch.finished",
        entries = entries,
        misclassified = misclassified,
        duration_ms = duration_ms,
    );
}

/// Emit event: one remediation directory has been populated.
pub fn emit_remediation_finished(target: &Path, copied: usize, failed: usize) {
    info!(
        event = "remediation.finished",
        target = %target.display(),
        copied = copied,
        failed = failed,
    );
}

/// Emit event: run finished.
pub fn emit_run_finished(run_id: &str, duration_ms: u64, entries: usize, misclassified: usize) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        entries = entries,
        misclassified = misclassified,
    );
}
