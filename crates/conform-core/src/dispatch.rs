//! Concurrent verification and classification of a corpus.
//!
//! One task is spawned per corpus entry and a semaphore bounds how many of
//! them run the validator at once. Finished tasks are drained in completion
//! order by the dispatching task, which is the only writer of the
//! [`ResultSet`]; no lock guards the buckets.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, instrument};

use crate::classify::{Category, Classifier, Expectation};
use crate::corpus::CorpusEntry;
use crate::error::{HarnessError, Result};
use crate::invoker::{Verification, Verifier};
use crate::metrics::Metrics;
use crate::observer::{NoopObserver, RunObserver};
use crate::results::ResultSet;

/// Bounded worker pool running Invoker → Classifier over every entry.
#[derive(Clone)]
pub struct Dispatcher {
    verifier: Arc<dyn Verifier>,
    classifier: Classifier,
    workers: usize,
    invoke_ignored: bool,
    observer: Arc<dyn RunObserver>,
    metrics: Arc<Metrics>,
}

impl Dispatcher {
    /// Create a dispatcher running at most `workers` validators at once.
    ///
    /// A bound of zero is treated as one.
    pub fn new(verifier: Arc<dyn Verifier>, workers: usize) -> Self {
        Self {
            verifier,
            classifier: Classifier::default(),
            workers: workers.max(1),
            invoke_ignored: true,
            observer: Arc::new(NoopObserver),
            metrics: Arc::new(Metrics::new()),
        }
    }

    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// When `false`, `i`-prefixed entries are classified without running
    /// the validator.
    pub fn invoke_ignored(mut self, invoke: bool) -> Self {
        self.invoke_ignored = invoke;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Classify every entry exactly once.
    ///
    /// Returns [`HarnessError::TaskAborted`] only if a task panicked; the
    /// remaining tasks are then cancelled and no partial result is returned.
    #[instrument(skip_all, fields(entries = entries.len(), workers = self.workers))]
    pub async fn run(&self, entries: Vec<CorpusEntry>) -> Result<ResultSet> {
        let start = Instant::now();
        let sem = Arc::new(Semaphore::new(self.workers));
        let mut join_set = JoinSet::new();

        for entry in entries {
            let sem = Arc::clone(&sem);
            let this = self.clone();
            join_set.spawn(async move {
                let _permit = sem.acquire_owned().await.ok();
                this.process(entry).await
            });
        }

        let mut results = ResultSet::new();
        while let Some(joined) = join_set.join_next().await {
            let (category, name) = joined.map_err(|e| HarnessError::TaskAborted {
                phase: "dispatch",
                detail: e.to_string(),
            })?;
            results.insert(category, name);
        }

        self.observer.dispatch_finished(start.elapsed());
        Ok(results)
    }

    async fn process(&self, entry: CorpusEntry) -> (Category, String) {
        let start = Instant::now();
        let expectation = entry.expectation();

        match expectation {
            Expectation::Accept => debug!("Passing: {}", entry.name),
            Expectation::Reject => debug!("Failing: {}", entry.name),
            Expectation::Ignore => debug!("Ignoring: {}", entry.name),
            Expectation::Unknown => debug!("Unknown prefix: {}", entry.name),
        }

        let category = if expectation == Expectation::Ignore && !self.invoke_ignored {
            self.metrics.inc_skipped_invocations();
            Category::Ignored
        } else {
            self.metrics.inc_invocations();
            let verification = self.verifier.verify(&entry.path).await;
            match verification {
                Verification::LaunchFailed { .. } => self.metrics.inc_launch_failures(),
                Verification::TimedOut { .. } => self.metrics.inc_timeouts(),
                _ => {}
            }
            self.classifier.classify(&entry.name, &verification)
        };

        self.observer
            .entry_classified(&entry.name, category, start.elapsed());
        (category, entry.name)
    }
}
