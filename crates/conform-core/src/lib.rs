//! Conform Core - conformance-test harness engine
//!
//! Drives an external validator over a corpus of documents whose file names
//! encode the expected verdict, and triages the inputs it gets wrong:
//! - Discovers the corpus (`corpus`)
//! - Invokes the validator once per entry under a worker bound (`invoker`, `dispatch`)
//! - Classifies each outcome by filename prefix (`classify`)
//! - Copies misclassified inputs into per-category directories (`remediation`)
//! - Sequences a run and reports on it (`harness`, `report`)

pub mod classify;
pub mod config;
pub mod corpus;
pub mod dispatch;
pub mod error;
pub mod fakes;
pub mod harness;
pub mod invoker;
pub mod metrics;
pub mod obs;
pub mod observer;
pub mod remediation;
pub mod report;
pub mod results;
pub mod telemetry;

// Re-export key types
pub use classify::{classify, Category, Classifier, Expectation};
pub use config::{HarnessConfig, LaunchFailurePolicy};
pub use corpus::{discover, CorpusEntry, Discovery};
pub use dispatch::Dispatcher;
pub use error::{HarnessError, Result};
pub use harness::Harness;
pub use invoker::{ProcessVerifier, Verification, Verifier};
pub use metrics::{Metrics, MetricsSnapshot};
pub use observer::{NoopObserver, RunObserver, TimingLog};
pub use remediation::{reset_dir, CopyFailure, RemediationOutcome, Remediator};
pub use report::RunReport;
pub use results::ResultSet;
pub use telemetry::init_tracing;

/// Conform version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
