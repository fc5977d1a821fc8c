//! Tracing subscriber setup for the `conform` binary.
//!
//! Log lines go to stderr so the run summary on stdout stays clean. The
//! filter is taken from `CONFORM_LOG`, then `RUST_LOG`, and otherwise
//! defaults to the requested level for the harness crates and `warn` for
//! everything else.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding a filter for harness logs.
pub const LOG_ENV: &str = "CONFORM_LOG";

/// Filter directives used when neither `CONFORM_LOG` nor `RUST_LOG` is set.
pub fn default_directives(level: Level) -> String {
    let level = level.as_str().to_ascii_lowercase();
    format!("warn,conform_core={level},conform={level}", level = level)
}

fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)))
}

/// Initialise the global tracing subscriber.
///
/// * `json`: emit newline-delimited JSON log lines.
/// * `level`: verbosity of the harness crates when no filter is set in the
///   environment.
///
/// Only the first call in a process takes effect.
pub fn init_tracing(json: bool, level: Level) {
    let registry = tracing_subscriber::registry().with(env_filter(level));
    let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let installed = if json {
        registry.with(layer.json()).try_init()
    } else {
        registry.with(layer).try_init()
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_scope_the_harness_crates() {
        assert_eq!(
            default_directives(Level::DEBUG),
            "warn,conform_core=debug,conform=debug"
        );
    }

    #[test]
    fn test_default_directives_parse() {
        for level in [Level::INFO, Level::DEBUG, Level::TRACE] {
            assert!(EnvFilter::try_new(default_directives(level)).is_ok());
        }
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_tracing(false, Level::INFO);
        init_tracing(true, Level::DEBUG);
    }
}
