//! Run report and human-readable summary.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::classify::Category;
use crate::error::{HarnessError, Result};
use crate::metrics::MetricsSnapshot;
use crate::remediation::{CopyFailure, RemediationOutcome};
use crate::results::ResultSet;

/// Everything a finished run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub corpus_dir: PathBuf,
    pub validator: PathBuf,
    pub results: ResultSet,
    /// Corpus files left out of dispatch because their names are not UTF-8,
    /// rendered lossily.
    pub skipped: Vec<String>,
    /// One outcome per misclassified category, in category order.
    pub remediation: Vec<RemediationOutcome>,
    pub metrics: MetricsSnapshot,
}

impl RunReport {
    pub fn count(&self, category: Category) -> usize {
        self.results.count(category)
    }

    pub fn total(&self) -> usize {
        self.results.total()
    }

    /// Remediation directory used for `category`, if it is remediated.
    pub fn remediation_dir(&self, category: Category) -> Option<&Path> {
        self.remediation
            .iter()
            .find(|outcome| outcome.target.ends_with(category.as_str()))
            .map(|outcome| outcome.target.as_path())
    }

    /// Every copy that failed, across both remediation directories.
    pub fn copy_failures(&self) -> impl Iterator<Item = &CopyFailure> {
        self.remediation
            .iter()
            .flat_map(|outcome| outcome.failures.iter())
    }

    /// Write the report as pretty JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| HarnessError::Report {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Summary:")?;
        for category in [
            Category::PassedCorrectly,
            Category::FailedCorrectly,
            Category::PassedIncorrectly,
            Category::FailedIncorrectly,
            Category::Ignored,
            Category::Unknown,
        ] {
            writeln!(f, "{}: {}", category.label(), self.count(category))?;
        }

        let invocation_errors = self.count(Category::InvocationError);
        if invocation_errors > 0 {
            writeln!(f, "{}: {}", Category::InvocationError.label(), invocation_errors)?;
            for name in self.results.names(Category::InvocationError) {
                writeln!(f, " - {}", name)?;
            }
        }

        if !self.skipped.is_empty() {
            writeln!(f, "Skipped (name not UTF-8): {}", self.skipped.len())?;
            for name in &self.skipped {
                writeln!(f, " - {}", name)?;
            }
        }

        writeln!(f)?;
        writeln!(f, "Copied incorrect files to:")?;
        for outcome in &self.remediation {
            writeln!(f, " - {}", outcome.target.display())?;
        }

        let failures: Vec<_> = self.copy_failures().collect();
        if !failures.is_empty() {
            writeln!(f)?;
            writeln!(f, "Copy failures: {}", failures.len())?;
            for failure in failures {
                writeln!(f, " - {}: {}", failure.name, failure.reason)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn report() -> RunReport {
        let mut results = ResultSet::new();
        results.insert(Category::PassedCorrectly, "y1.json");
        results.insert(Category::FailedIncorrectly, "y2.json");
        results.insert(Category::FailedCorrectly, "n1.json");
        results.insert(Category::PassedIncorrectly, "n2.json");
        results.insert(Category::Ignored, "i1.json");
        results.insert(Category::Unknown, "bogus.json");

        RunReport {
            run_id: "run-1".to_string(),
            started_at: Utc::now(),
            duration_ms: 12,
            corpus_dir: PathBuf::from("test_parsing"),
            validator: PathBuf::from("./json"),
            results,
            skipped: vec![],
            remediation: vec![
                RemediationOutcome {
                    target: PathBuf::from("test_parsing/passed_incorrectly"),
                    copied: vec!["n2.json".to_string()],
                    failures: vec![],
                },
                RemediationOutcome {
                    target: PathBuf::from("test_parsing/failed_incorrectly"),
                    copied: vec![],
                    failures: vec![CopyFailure {
                        name: "y2.json".to_string(),
                        reason: "No such file or directory".to_string(),
                    }],
                },
            ],
            metrics: MetricsSnapshot::default(),
        }
    }

    #[test]
    fn test_summary_lists_counts_and_dirs() {
        let summary = report().to_string();
        assert!(summary.starts_with("Summary:\n"));
        assert!(summary.contains("Passed Correctly: 1\n"));
        assert!(summary.contains("Failed Correctly: 1\n"));
        assert!(summary.contains("Passed Incorrectly: 1\n"));
        assert!(summary.contains("Failed Incorrectly: 1\n"));
        assert!(summary.contains("Ignored: 1\n"));
        assert!(summary.contains("Unknown: 1\n"));
        assert!(summary.contains(" - test_parsing/passed_incorrectly\n"));
        assert!(summary.contains(" - test_parsing/failed_incorrectly\n"));
        assert!(summary.contains(" - y2.json: No such file or directory"));
        assert!(!summary.contains("Invocation Errors"));
        assert!(!summary.contains("Skipped"));
    }

    #[test]
    fn test_summary_lists_skipped_files() {
        let mut report = report();
        report.skipped = vec!["n\u{FFFD}.json".to_string()];

        let summary = report.to_string();
        assert!(summary.contains("Skipped (name not UTF-8): 1\n - n\u{FFFD}.json\n"));
        assert_eq!(report.total(), 6);
    }

    #[test]
    fn test_remediation_dir_lookup() {
        let report = report();
        assert_eq!(
            report.remediation_dir(Category::FailedIncorrectly),
            Some(Path::new("test_parsing/failed_incorrectly"))
        );
        assert_eq!(report.remediation_dir(Category::Ignored), None);
        assert_eq!(report.copy_failures().count(), 1);
    }

    #[test]
    fn test_write_json() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("report.json");
        report().write_json(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["run_id"], "run-1");
        assert_eq!(
            value["results"]["buckets"]["passed_incorrectly"],
            serde_json::json!(["n2.json"])
        );
        assert_eq!(value["remediation"][1]["failures"][0]["name"], "y2.json");
    }

    #[test]
    fn test_write_json_to_missing_dir_fails() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("absent").join("report.json");
        assert!(matches!(
            report().write_json(&path),
            Err(HarnessError::Report { .. })
        ));
    }
}
