//! Run orchestration.
//!
//! A run proceeds strictly in this order:
//! 1. check that the corpus directory exists
//! 2. reset both remediation directories
//! 3. discover the corpus
//! 4. dispatch every entry to the validator and classify it
//! 5. copy the misclassified entries into their remediation directories
//! 6. build the [`RunReport`]

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{info, Instrument};
use uuid::Uuid;

use crate::classify::{Category, Classifier};
use crate::config::HarnessConfig;
use crate::corpus;
use crate::dispatch::Dispatcher;
use crate::error::{HarnessError, Result};
use crate::invoker::{ProcessVerifier, Verifier};
use crate::metrics::Metrics;
use crate::obs;
use crate::observer::{NoopObserver, RunObserver};
use crate::remediation::{reset_dir, Remediator};
use crate::report::RunReport;

/// Conformance-test harness for one corpus and one validator.
pub struct Harness {
    config: HarnessConfig,
    verifier: Arc<dyn Verifier>,
    observer: Arc<dyn RunObserver>,
}

impl Harness {
    /// Validate `config` and build a harness invoking the configured
    /// validator as a child process.
    pub fn new(config: HarnessConfig) -> Result<Self> {
        config.validate()?;
        let verifier =
            ProcessVerifier::new(&config.validator).with_timeout_secs(config.timeout_secs);
        Ok(Self {
            config,
            verifier: Arc::new(verifier),
            observer: Arc::new(NoopObserver),
        })
    }

    /// Replace the process-backed verifier.
    pub fn with_verifier(mut self, verifier: Arc<dyn Verifier>) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Execute one full run.
    ///
    /// Each run keeps its own counters and returns them in the report.
    /// Overlapping runs on the same corpus would still race on the shared
    /// remediation directories.
    ///
    /// Misclassifications are findings, not errors: the run succeeds however
    /// many entries land in the incorrect buckets. Errors are limited to a
    /// missing or unreadable corpus, a failed directory reset and aborted
    /// tasks.
    pub async fn run(&self) -> Result<RunReport> {
        let run_id = Uuid::new_v4().to_string();
        let span = obs::run_span(&run_id);
        self.run_inner(run_id).instrument(span).await
    }

    async fn run_inner(&self, run_id: String) -> Result<RunReport> {
        let started_at = Utc::now();
        let start = Instant::now();
        let corpus_dir = self.config.corpus_dir.clone();
        let metrics = Arc::new(Metrics::new());
        obs::emit_run_started(&run_id, &corpus_dir, &self.config.validator);

        // Resetting would otherwise create the corpus directory.
        match tokio::fs::metadata(&corpus_dir).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(HarnessError::CorpusUnreadable {
                    path: corpus_dir,
                    source: std::io::Error::new(std::io::ErrorKind::Other, "not a directory"),
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(HarnessError::CorpusMissing { path: corpus_dir })
            }
            Err(source) => {
                return Err(HarnessError::CorpusUnreadable {
                    path: corpus_dir,
                    source,
                })
            }
        }

        let passed_dir = self.config.passed_incorrectly_dir();
        let failed_dir = self.config.failed_incorrectly_dir();
        reset_dir(&passed_dir).await?;
        reset_dir(&failed_dir).await?;

        let discovery = corpus::discover(&corpus_dir, self.config.bare_extension())?;
        info!(
            entries = discovery.entries.len(),
            skipped = discovery.skipped.len(),
            "corpus discovered"
        );
        let skipped: Vec<String> = discovery
            .skipped
            .iter()
            .map(|path| {
                path.file_name()
                    .unwrap_or(path.as_os_str())
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();

        let dispatch_start = Instant::now();
        let results = Dispatcher::new(Arc::clone(&self.verifier), self.config.dispatch_workers)
            .with_classifier(Classifier::new(self.config.launch_failure))
            .invoke_ignored(self.config.invoke_ignored)
            .with_observer(Arc::clone(&self.observer))
            .with_metrics(Arc::clone(&metrics))
            .run(discovery.entries)
            .await?;
        obs::emit_dispatch_finished(
            results.total(),
            results.misclassified_count(),
            dispatch_start.elapsed().as_millis() as u64,
        );

        let remediator = Remediator::new(self.config.copy_workers)
            .with_observer(Arc::clone(&self.observer))
            .with_metrics(Arc::clone(&metrics));

        let (passed, failed) = tokio::join!(
            remediator.copy_all(
                results.names(Category::PassedIncorrectly),
                &corpus_dir,
                &passed_dir
            ),
            remediator.copy_all(
                results.names(Category::FailedIncorrectly),
                &corpus_dir,
                &failed_dir
            ),
        );
        let remediation = vec![passed?, failed?];
        for outcome in &remediation {
            obs::emit_remediation_finished(
                &outcome.target,
                outcome.copied.len(),
                outcome.failures.len(),
            );
        }

        metrics.flush();
        let duration_ms = start.elapsed().as_millis() as u64;
        obs::emit_run_finished(
            &run_id,
            duration_ms,
            results.total(),
            results.misclassified_count(),
        );

        Ok(RunReport {
            run_id,
            started_at,
            duration_ms,
            corpus_dir,
            validator: self.config.validator.clone(),
            results,
            skipped,
            remediation,
            metrics: metrics.snapshot(),
        })
    }
}
