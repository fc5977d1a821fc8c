//! Validator invocation.
//!
//! One external process per corpus entry. Only the exit status is observed;
//! the child's stdout and stderr go to the null device.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, warn};

/// Outcome of one validator invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Verification {
    /// Exit status 0.
    Accepted,

    /// Non-zero exit status. `exit_code` is `None` when killed by a signal.
    Rejected { exit_code: Option<i32> },

    /// The process outlived the configured timeout and was killed.
    TimedOut { limit_secs: u64 },

    /// The process could not be started (missing binary, permissions).
    LaunchFailed { reason: String },
}

impl Verification {
    /// Whether the validator reported success.
    pub fn accepted(&self) -> bool {
        matches!(self, Verification::Accepted)
    }
}

/// Runs the validator against one input.
///
/// Implementations never fail: every problem is folded into a
/// [`Verification`] so that one bad invocation cannot abort a run.
#[async_trait]
pub trait Verifier: Send + Sync {
    async fn verify(&self, input: &Path) -> Verification;
}

/// Verifier that spawns `<program> <input>` and waits for it to exit.
#[derive(Debug, Clone)]
pub struct ProcessVerifier {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl ProcessVerifier {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: None,
        }
    }

    /// Kill the validator if it runs longer than `secs` seconds.
    pub fn with_timeout_secs(mut self, secs: Option<u64>) -> Self {
        self.timeout = secs.map(Duration::from_secs);
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

#[async_trait]
impl Verifier for ProcessVerifier {
    async fn verify(&self, input: &Path) -> Verification {
        let child = Command::new(&self.program)
            .arg(input)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn();

        let mut child = match child {
            Ok(child) => child,
            Err(e) => {
                warn!(
                    validator = %self.program.display(),
                    input = %input.display(),
                    error = %e,
                    "validator could not be launched"
                );
                return Verification::LaunchFailed {
                    reason: e.to_string(),
                };
            }
        };

        let status = match self.timeout {
            Some(limit) => {
                let waited = tokio::time::timeout(limit, child.wait()).await;
                match waited {
                    Ok(status) => status,
                    Err(_) => {
                        warn!(
                            input = %input.display(),
                            limit_secs = limit.as_secs(),
                            "validator timed out"
                        );
                        // kill_on_drop reaps it if this fails
                        let _ = child.kill().await;
                        return Verification::TimedOut {
                            limit_secs: limit.as_secs(),
                        };
                    }
                }
            }
            None => child.wait().await,
        };

        match status {
            Ok(status) if status.success() => Verification::Accepted,
            Ok(status) => {
                debug!(input = %input.display(), exit_code = ?status.code(), "validator rejected input");
                Verification::Rejected {
                    exit_code: status.code(),
                }
            }
            Err(e) => {
                warn!(input = %input.display(), error = %e, "failed waiting for validator");
                Verification::LaunchFailed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_accepted_counts_as_success() {
        assert!(Verification::Accepted.accepted());
        assert!(!Verification::Rejected { exit_code: Some(1) }.accepted());
        assert!(!Verification::Rejected { exit_code: None }.accepted());
        assert!(!Verification::TimedOut { limit_secs: 1 }.accepted());
        assert!(!Verification::LaunchFailed {
            reason: "missing".to_string()
        }
        .accepted());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_zero_exit_is_accepted() {
        let verifier = ProcessVerifier::new("true");
        let outcome = verifier.verify(Path::new("y1.json")).await;
        assert_eq!(outcome, Verification::Accepted);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_rejected() {
        let verifier = ProcessVerifier::new("false");
        let outcome = verifier.verify(Path::new("y1.json")).await;
        assert_eq!(outcome, Verification::Rejected { exit_code: Some(1) });
    }

    #[tokio::test]
    async fn test_missing_binary_is_launch_failure() {
        let verifier = ProcessVerifier::new("/nonexistent/validator-binary");
        let outcome = verifier.verify(Path::new("y1.json")).await;
        assert!(matches!(outcome, Verification::LaunchFailed { .. }));
        assert!(!outcome.accepted());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_slow_validator() {
        // `sleep <input>` with input "5" sleeps for five seconds.
        let verifier = ProcessVerifier::new("sleep").with_timeout_secs(Some(1));
        let start = std::time::Instant::now();
        let outcome = verifier.verify(Path::new("5")).await;
        assert_eq!(outcome, Verification::TimedOut { limit_secs: 1 });
        assert!(start.elapsed() < Duration::from_secs(4));
    }
}
