//! Remediation directories: reset at the start of a run, then filled with
//! copies of the misclassified inputs.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, instrument, warn};

use crate::error::{HarnessError, Result};
use crate::metrics::Metrics;
use crate::observer::{NoopObserver, RunObserver};

/// Delete `dir` if present and recreate it empty.
///
/// Any failure is fatal for the run: the directory's post-run contents would
/// not be trustworthy.
pub async fn reset_dir(dir: &Path) -> Result<()> {
    let reset_failed = |source: std::io::Error| HarnessError::ResetFailed {
        path: dir.to_path_buf(),
        source,
    };

    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => debug!(dir = %dir.display(), "removed remediation directory"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(reset_failed(e)),
    }
    tokio::fs::create_dir_all(dir).await.map_err(reset_failed)?;
    Ok(())
}

/// A single file that could not be copied.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CopyFailure {
    pub name: String,
    pub reason: String,
}

/// Result of populating one remediation directory.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RemediationOutcome {
    /// Directory the files were copied into.
    pub target: PathBuf,

    /// Successfully copied file names, sorted.
    pub copied: Vec<String>,

    /// Files that could not be copied, sorted by name.
    pub failures: Vec<CopyFailure>,
}

impl RemediationOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Bounded worker pool copying files into the remediation directories.
///
/// Every [`copy_all`](Remediator::copy_all) call on one remediator, and on
/// its clones, draws from the same permits, so concurrent calls for the two
/// incorrect buckets together never exceed `workers` copies in flight.
#[derive(Clone)]
pub struct Remediator {
    workers: usize,
    permits: Arc<Semaphore>,
    observer: Arc<dyn RunObserver>,
    metrics: Arc<Metrics>,
}

impl Remediator {
    /// A bound of zero is treated as one.
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            workers,
            permits: Arc::new(Semaphore::new(workers)),
            observer: Arc::new(NoopObserver),
            metrics: Arc::new(Metrics::new()),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Copy each of `names` from `source` into `target`, overwriting.
    ///
    /// `target` must already exist (see [`reset_dir`]). A failed copy is
    /// recorded in the outcome and never stops its siblings.
    #[instrument(skip_all, fields(target = %target.display(), files = names.len()))]
    pub async fn copy_all(
        &self,
        names: &[String],
        source: &Path,
        target: &Path,
    ) -> Result<RemediationOutcome> {
        let mut join_set = JoinSet::new();

        for name in names.iter().cloned() {
            let sem = Arc::clone(&self.permits);
            let observer = Arc::clone(&self.observer);
            let metrics = Arc::clone(&self.metrics);
            let src = source.join(&name);
            let target = target.to_path_buf();

            join_set.spawn(async move {
                let _permit = sem.acquire_owned().await.ok();
                let start = Instant::now();
                let dest = target.join(&name);

                match tokio::fs::copy(&src, &dest).await {
                    Ok(_) => {
                        metrics.inc_copies();
                        debug!("Copied {} to {}", name, target.display());
                        observer.entry_copied(&name, &target, start.elapsed());
                        Ok(name)
                    }
                    Err(e) => {
                        metrics.inc_copy_failures();
                        warn!(
                            file = %name,
                            source = %src.display(),
                            target = %target.display(),
                            error = %e,
                            "failed to copy misclassified input"
                        );
                        Err(CopyFailure {
                            name,
                            reason: e.to_string(),
                        })
                    }
                }
            });
        }

        let mut copied = Vec::new();
        let mut failures = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined.map_err(|e| HarnessError::TaskAborted {
                phase: "remediation",
                detail: e.to_string(),
            })? {
                Ok(name) => copied.push(name),
                Err(failure) => failures.push(failure),
            }
        }

        copied.sort();
        failures.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(RemediationOutcome {
            target: target.to_path_buf(),
            copied,
            failures,
        })
    }
}
