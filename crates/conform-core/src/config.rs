//! Harness configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::classify::Category;
use crate::error::{HarnessError, Result};

/// What to do when the validator process cannot be launched at all.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LaunchFailurePolicy {
    /// Count the launch failure as a validator rejection.
    #[default]
    Collapse,

    /// Classify the entry as `invocation_error`, whatever its prefix.
    Separate,
}

/// Configuration for a harness run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HarnessConfig {
    /// Directory holding the corpus. Remediation directories are nested here.
    pub corpus_dir: PathBuf,

    /// Validator executable, invoked as `<validator> <input-path>`.
    pub validator: PathBuf,

    /// Input extension without the leading dot.
    pub extension: String,

    /// Maximum number of concurrent validator invocations.
    pub dispatch_workers: usize,

    /// Maximum number of concurrent remediation copies.
    pub copy_workers: usize,

    /// Per-invocation timeout. `None` waits indefinitely.
    pub timeout_secs: Option<u64>,

    /// Whether `i`-prefixed entries still run through the validator.
    pub invoke_ignored: bool,

    pub launch_failure: LaunchFailurePolicy,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            corpus_dir: PathBuf::from("test_parsing"),
            validator: PathBuf::from("./json"),
            extension: "json".to_string(),
            dispatch_workers: 12,
            copy_workers: 16,
            timeout_secs: None,
            invoke_ignored: true,
            launch_failure: LaunchFailurePolicy::Collapse,
        }
    }
}

impl HarnessConfig {
    /// Create a configuration for `corpus_dir` with every other field defaulted.
    pub fn new(corpus_dir: impl Into<PathBuf>) -> Self {
        Self {
            corpus_dir: corpus_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_validator(mut self, validator: impl Into<PathBuf>) -> Self {
        self.validator = validator.into();
        self
    }

    pub fn with_workers(mut self, dispatch_workers: usize, copy_workers: usize) -> Self {
        self.dispatch_workers = dispatch_workers;
        self.copy_workers = copy_workers;
        self
    }

    /// Check the configuration before any filesystem work happens.
    pub fn validate(&self) -> Result<()> {
        if self.dispatch_workers == 0 {
            return Err(HarnessError::InvalidConfig(
                "dispatch_workers must be at least 1".to_string(),
            ));
        }
        if self.copy_workers == 0 {
            return Err(HarnessError::InvalidConfig(
                "copy_workers must be at least 1".to_string(),
            ));
        }
        if self.validator.as_os_str().is_empty() {
            return Err(HarnessError::InvalidConfig(
                "validator path is empty".to_string(),
            ));
        }
        if self.extension.is_empty() {
            return Err(HarnessError::InvalidConfig("extension is empty".to_string()));
        }
        if self.extension.contains(['/', '\\']) {
            return Err(HarnessError::InvalidConfig(format!(
                "extension {:?} contains a path separator",
                self.extension
            )));
        }
        if self.timeout_secs == Some(0) {
            return Err(HarnessError::InvalidConfig(
                "timeout_secs must be positive when set".to_string(),
            ));
        }
        Ok(())
    }

    /// The extension normalised to start without a dot.
    pub fn bare_extension(&self) -> &str {
        self.extension.trim_start_matches('.')
    }

    pub fn passed_incorrectly_dir(&self) -> PathBuf {
        self.corpus_dir.join(Category::PassedIncorrectly.as_str())
    }

    pub fn failed_incorrectly_dir(&self) -> PathBuf {
        self.corpus_dir.join(Category::FailedIncorrectly.as_str())
    }

    pub fn corpus_dir(&self) -> &Path {
        &self.corpus_dir
    }
}
