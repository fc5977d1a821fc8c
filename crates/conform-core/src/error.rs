//! Error types for harness operations.
//!
//! Only directory-level and configuration problems surface here. Per-file
//! failures (validator launch errors, copy errors) are folded into results at
//! the task boundary and never become a `HarnessError`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("corpus directory not found: {}", path.display())]
    CorpusMissing { path: PathBuf },

    #[error("corpus directory unreadable: {}: {source}", path.display())]
    CorpusUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to reset remediation directory {}: {source}", path.display())]
    ResetFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid harness configuration: {0}")]
    InvalidConfig(String),

    #[error("{phase} task aborted: {detail}")]
    TaskAborted { phase: &'static str, detail: String },

    #[error("failed to write report {}: {source}", path.display())]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for harness operations
pub type Result<T> = std::result::Result<T, HarnessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_path() {
        let err = HarnessError::CorpusMissing {
            path: PathBuf::from("test_parsing"),
        };
        assert!(err.to_string().contains("test_parsing"));

        let err = HarnessError::ResetFailed {
            path: PathBuf::from("/corpus/passed_incorrectly"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(err.to_string().contains("/corpus/passed_incorrectly"));
    }
}
