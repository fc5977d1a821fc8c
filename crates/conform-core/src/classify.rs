//! Filename-prefix classification of validator outcomes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::LaunchFailurePolicy;
use crate::invoker::Verification;

/// Verdict a corpus entry expects, encoded in the first character of its name.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Expectation {
    /// `y`: the validator must accept the input.
    Accept,

    /// `n`: the validator must reject the input.
    Reject,

    /// `i`: the outcome is not judged.
    Ignore,

    /// Any other first character, or an empty name.
    Unknown,
}

impl Expectation {
    /// Case-sensitive, first character only.
    pub fn from_filename(name: &str) -> Self {
        match name.chars().next() {
            Some('y') => Expectation::Accept,
            Some('n') => Expectation::Reject,
            Some('i') => Expectation::Ignore,
            _ => Expectation::Unknown,
        }
    }

    /// Whether the validator outcome matters for this entry.
    pub fn is_judged(&self) -> bool {
        matches!(self, Expectation::Accept | Expectation::Reject)
    }
}

/// Classification assigned to one corpus entry after one run.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    PassedCorrectly,
    FailedCorrectly,
    PassedIncorrectly,
    FailedIncorrectly,
    Ignored,
    Unknown,
    InvocationError,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::PassedCorrectly,
        Category::FailedCorrectly,
        Category::PassedIncorrectly,
        Category::FailedIncorrectly,
        Category::Ignored,
        Category::Unknown,
        Category::InvocationError,
    ];

    /// The two categories whose inputs are copied out for triage.
    pub const MISCLASSIFIED: [Category; 2] =
        [Category::PassedIncorrectly, Category::FailedIncorrectly];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::PassedCorrectly => "passed_correctly",
            Category::FailedCorrectly => "failed_correctly",
            Category::PassedIncorrectly => "passed_incorrectly",
            Category::FailedIncorrectly => "failed_incorrectly",
            Category::Ignored => "ignored",
            Category::Unknown => "unknown",
            Category::InvocationError => "invocation_error",
        }
    }

    /// Human-readable label used in the run summary.
    pub fn label(&self) -> &'static str {
        match self {
            Category::PassedCorrectly => "Passed Correctly",
            Category::FailedCorrectly => "Failed Correctly",
            Category::PassedIncorrectly => "Passed Incorrectly",
            Category::FailedIncorrectly => "Failed Incorrectly",
            Category::Ignored => "Ignored",
            Category::Unknown => "Unknown",
            Category::InvocationError => "Invocation Errors",
        }
    }

    pub fn is_misclassified(&self) -> bool {
        matches!(
            self,
            Category::PassedIncorrectly | Category::FailedIncorrectly
        )
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map an expectation and a boolean validator outcome to a category.
///
/// | prefix | accepted | rejected |
/// |---|---|---|
/// | `y` | passed_correctly | failed_incorrectly |
/// | `n` | passed_incorrectly | failed_correctly |
/// | `i` | ignored | ignored |
/// | other | unknown | unknown |
pub fn classify(expectation: Expectation, accepted: bool) -> Category {
    match (expectation, accepted) {
        (Expectation::Accept, true) => Category::PassedCorrectly,
        (Expectation::Accept, false) => Category::FailedIncorrectly,
        (Expectation::Reject, true) => Category::PassedIncorrectly,
        (Expectation::Reject, false) => Category::FailedCorrectly,
        (Expectation::Ignore, _) => Category::Ignored,
        (Expectation::Unknown, _) => Category::Unknown,
    }
}

/// Classifier applying the launch-failure policy on top of [`classify`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Classifier {
    policy: LaunchFailurePolicy,
}

impl Classifier {
    pub fn new(policy: LaunchFailurePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> LaunchFailurePolicy {
        self.policy
    }

    /// Classify a named entry given the validator's outcome.
    ///
    /// Under [`LaunchFailurePolicy::Separate`] a launch failure becomes
    /// `invocation_error` regardless of prefix; otherwise it is a rejection.
    pub fn classify(&self, name: &str, verification: &Verification) -> Category {
        if self.policy == LaunchFailurePolicy::Separate
            && matches!(verification, Verification::LaunchFailed { .. })
        {
            return Category::InvocationError;
        }
        classify(Expectation::from_filename(name), verification.accepted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expectation_prefixes() {
        assert_eq!(Expectation::from_filename("y_string.json"), Expectation::Accept);
        assert_eq!(Expectation::from_filename("n_trailing_comma.json"), Expectation::Reject);
        assert_eq!(Expectation::from_filename("i_number_huge.json"), Expectation::Ignore);
        assert_eq!(Expectation::from_filename("bogus.json"), Expectation::Unknown);
        assert_eq!(Expectation::from_filename(""), Expectation::Unknown);
    }

    #[test]
    fn test_prefix_is_case_sensitive() {
        assert_eq!(Expectation::from_filename("Y1.json"), Expectation::Unknown);
        assert_eq!(Expectation::from_filename("N1.json"), Expectation::Unknown);
        assert_eq!(Expectation::from_filename("I1.json"), Expectation::Unknown);
    }

    #[test]
    fn test_prefix_ignores_extension() {
        assert_eq!(Expectation::from_filename("y"), Expectation::Accept);
        assert_eq!(Expectation::from_filename("n.txt"), Expectation::Reject);
    }

    #[test]
    fn test_classification_table() {
        assert_eq!(classify(Expectation::Accept, true), Category::PassedCorrectly);
        assert_eq!(classify(Expectation::Accept, false), Category::FailedIncorrectly);
        assert_eq!(classify(Expectation::Reject, false), Category::FailedCorrectly);
        assert_eq!(classify(Expectation::Reject, true), Category::PassedIncorrectly);
        assert_eq!(classify(Expectation::Ignore, true), Category::Ignored);
        assert_eq!(classify(Expectation::Ignore, false), Category::Ignored);
        assert_eq!(classify(Expectation::Unknown, true), Category::Unknown);
        assert_eq!(classify(Expectation::Unknown, false), Category::Unknown);
    }

    #[test]
    fn test_launch_failure_collapses_by_default() {
        let classifier = Classifier::default();
        let launch = Verification::LaunchFailed {
            reason: "No such file or directory".to_string(),
        };
        assert_eq!(classifier.classify("y1.json", &launch), Category::FailedIncorrectly);
        assert_eq!(classifier.classify("n1.json", &launch), Category::FailedCorrectly);
    }

    #[test]
    fn test_launch_failure_separated() {
        let classifier = Classifier::new(LaunchFailurePolicy::Separate);
        let launch = Verification::LaunchFailed {
            reason: "permission denied".to_string(),
        };
        assert_eq!(classifier.classify("y1.json", &launch), Category::InvocationError);
        assert_eq!(classifier.classify("i1.json", &launch), Category::InvocationError);

        // A plain rejection is still judged.
        let rejected = Verification::Rejected { exit_code: Some(1) };
        assert_eq!(classifier.classify("y1.json", &rejected), Category::FailedIncorrectly);
    }

    #[test]
    fn test_timeout_is_a_rejection_under_both_policies() {
        let timed_out = Verification::TimedOut { limit_secs: 5 };
        for policy in [LaunchFailurePolicy::Collapse, LaunchFailurePolicy::Separate] {
            let classifier = Classifier::new(policy);
            assert_eq!(classifier.classify("n1.json", &timed_out), Category::FailedCorrectly);
        }
    }

    #[test]
    fn test_category_names() {
        assert_eq!(Category::PassedIncorrectly.to_string(), "passed_incorrectly");
        assert_eq!(
            serde_json::to_string(&Category::FailedIncorrectly).unwrap(),
            "\"failed_incorrectly\""
        );
        let misclassified: Vec<_> = Category::ALL
            .iter()
            .filter(|c| c.is_misclassified())
            .copied()
            .collect();
        assert_eq!(misclassified, Category::MISCLASSIFIED.to_vec());
    }
}
