//! Conform - validator conformance-test harness
//!
//! Runs a validator against every `.<extension>` file of a corpus directory,
//! judges each result against the verdict encoded in the file name
//! (`y` = must accept, `n` = must reject, `i` = not judged), and copies
//! misjudged inputs into `passed_incorrectly/` and `failed_incorrectly/`
//! inside the corpus directory.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use conform_core::{Harness, HarnessConfig, LaunchFailurePolicy, RunObserver, TimingLog};
use tracing::{info, Level};

#[derive(Parser, Debug)]
#[command(name = "conform")]
#[command(author = "Conform Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Conformance-test harness for document validators", long_about = None)]
struct Cli {
    /// Corpus directory
    #[arg(default_value = "test_parsing")]
    corpus: PathBuf,

    /// Validator executable, invoked as `<validator> <file>`
    #[arg(long, env = "CONFORM_VALIDATOR", default_value = "./json")]
    validator: PathBuf,

    /// Extension of corpus files
    #[arg(long, default_value = "json")]
    extension: String,

    /// Maximum concurrent validator invocations
    #[arg(short, long, env = "CONFORM_JOBS", default_value_t = 12)]
    jobs: usize,

    /// Maximum concurrent remediation copies
    #[arg(long, env = "CONFORM_COPY_JOBS", default_value_t = 16)]
    copy_jobs: usize,

    /// Kill a validator invocation after this many seconds (counts as a rejection)
    #[arg(long, env = "CONFORM_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Classify `i`-prefixed files without running the validator
    #[arg(long)]
    skip_ignored: bool,

    /// How to classify inputs whose validator could not be launched
    #[arg(long, value_enum, default_value_t = LaunchFailureArg::Collapse)]
    launch_failure: LaunchFailureArg,

    /// Write per-file timings to this file
    #[arg(long)]
    timing_log: Option<PathBuf>,

    /// Write the full run report as JSON to this file
    #[arg(long)]
    report: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LaunchFailureArg {
    /// Count as a validator rejection
    Collapse,
    /// Report as a separate invocation_error category
    Separate,
}

impl From<LaunchFailureArg> for LaunchFailurePolicy {
    fn from(arg: LaunchFailureArg) -> Self {
        match arg {
            LaunchFailureArg::Collapse => LaunchFailurePolicy::Collapse,
            LaunchFailureArg::Separate => LaunchFailurePolicy::Separate,
        }
    }
}

impl Cli {
    fn harness_config(&self) -> HarnessConfig {
        HarnessConfig {
            corpus_dir: self.corpus.clone(),
            validator: self.validator.clone(),
            extension: self.extension.clone(),
            dispatch_workers: self.jobs,
            copy_workers: self.copy_jobs,
            timeout_secs: self.timeout_secs,
            invoke_ignored: !self.skip_ignored,
            launch_failure: self.launch_failure.into(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    conform_core::init_tracing(cli.json, level);

    let mut harness = Harness::new(cli.harness_config()).context("Invalid configuration")?;

    let timing = match &cli.timing_log {
        Some(path) => Some(Arc::new(
            TimingLog::create(path)
                .await
                .with_context(|| format!("Failed to create timing log {:?}", path))?,
        )),
        None => None,
    };
    if let Some(timing) = &timing {
        harness = harness.with_observer(Arc::clone(timing) as Arc<dyn RunObserver>);
    }

    let report = harness.run().await.with_context(|| {
        format!(
            "Conformance run over {:?} failed",
            harness.config().corpus_dir()
        )
    })?;

    if let Some(timing) = &timing {
        timing
            .flush()
            .await
            .with_context(|| format!("Failed to write timing log {:?}", timing.path()))?;
        info!(path = %timing.path().display(), "timing log written");
    }

    println!();
    print!("{}", report);

    if let Some(path) = &cli.report {
        report
            .write_json(path)
            .with_context(|| format!("Failed to write report {:?}", path))?;
        println!();
        println!("Report written to {:?}", path);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_mirror_core_config() {
        let cli = Cli::parse_from(["conform"]);
        assert_eq!(cli.harness_config(), HarnessConfig::default());
    }

    #[test]
    fn test_flags_map_onto_config() {
        let cli = Cli::parse_from([
            "conform",
            "corpus",
            "--validator",
            "/usr/local/bin/validate",
            "--extension",
            "toml",
            "-j",
            "3",
            "--copy-jobs",
            "5",
            "--timeout-secs",
            "30",
            "--skip-ignored",
            "--launch-failure",
            "separate",
        ]);
        let cfg = cli.harness_config();
        assert_eq!(cfg.corpus_dir, PathBuf::from("corpus"));
        assert_eq!(cfg.validator, PathBuf::from("/usr/local/bin/validate"));
        assert_eq!(cfg.extension, "toml");
        assert_eq!(cfg.dispatch_workers, 3);
        assert_eq!(cfg.copy_workers, 5);
        assert_eq!(cfg.timeout_secs, Some(30));
        assert!(!cfg.invoke_ignored);
        assert_eq!(cfg.launch_failure, LaunchFailurePolicy::Separate);
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
