//! In-memory verifier fake (testing only)
//!
//! `ScriptedVerifier` satisfies the [`Verifier`] contract without spawning
//! processes: outcomes are looked up by file name, with an optional per-file
//! delay, and every call is counted.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::invoker::{Verification, Verifier};

/// Verifier returning scripted outcomes keyed by file name.
#[derive(Debug)]
pub struct ScriptedVerifier {
    default: Verification,
    outcomes: HashMap<String, Verification>,
    delays: HashMap<String, Duration>,
    default_delay: Option<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl ScriptedVerifier {
    /// Return `default` for every file without a scripted outcome.
    pub fn always(default: Verification) -> Self {
        Self {
            default,
            outcomes: HashMap::new(),
            delays: HashMap::new(),
            default_delay: None,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_outcome(mut self, name: &str, outcome: Verification) -> Self {
        self.outcomes.insert(name.to_string(), outcome);
        self
    }

    /// Sleep for `delay` before answering for `name`.
    pub fn with_delay(mut self, name: &str, delay: Duration) -> Self {
        self.delays.insert(name.to_string(), delay);
        self
    }

    /// Apply `delay` to every file.
    pub fn with_default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = Some(delay);
        self
    }

    /// Number of `verify` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Largest number of `verify` calls observed running at the same time.
    pub fn peak_concurrency(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Verifier for ScriptedVerifier {
    async fn verify(&self, input: &Path) -> Verification {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let delay = self.delays.get(&name).copied().or(self.default_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.outcomes
            .get(&name)
            .cloned()
            .unwrap_or_else(|| self.default.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_outcomes() {
        let verifier = ScriptedVerifier::always(Verification::Accepted)
            .with_outcome("n1.json", Verification::Rejected { exit_code: Some(2) });

        assert_eq!(
            verifier.verify(Path::new("/c/y1.json")).await,
            Verification::Accepted
        );
        assert_eq!(
            verifier.verify(Path::new("/c/n1.json")).await,
            Verification::Rejected { exit_code: Some(2) }
        );
        assert_eq!(verifier.calls(), 2);
        assert_eq!(verifier.peak_concurrency(), 1);
    }
}
