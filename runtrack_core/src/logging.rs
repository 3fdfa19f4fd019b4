//! Logging infrastructure for runtrack.
//!
//! Logs go to stderr so replay progress and reports on stdout stay clean.
//! The filter comes from `RUNTRACK_LOG`, then `RUST_LOG`, then the level the
//! caller asks for.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable consulted before `RUST_LOG`
pub const LOG_ENV_VAR: &str = "RUNTRACK_LOG";

/// Initialize logging at WARN
pub fn init() {
    init_with_level("warn")
}

/// Initialize logging with a specific default level
///
/// # Arguments
/// * `default_level` - Level for runtrack's own crates (debug, info, warn, error)
///
/// Dependencies stay at WARN unless an environment filter says otherwise.
pub fn init_with_level(default_level: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directives(default_level)));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .try_init();
    if installed.is_err() {
        tracing::debug!("Logging already initialized");
    }
}

/// Filter directives raising only runtrack's crates to `level`
fn default_directives(level: &str) -> String {
    let level = level.trim().to_lowercase();
    if level == "warn" {
        return level;
    }
    format!("warn,runtrack_core={level},runtrack={level}")
}

/// Initialize logging for testing (captures logs for test output)
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives() {
        assert_eq!(default_directives("warn"), "warn");
        assert_eq!(
            default_directives("Debug"),
            "warn,runtrack_core=debug,runtrack=debug"
        );
    }

    #[test]
    fn test_directives_parse() {
        for level in ["error", "warn", "info", "debug", "trace"] {
            assert!(EnvFilter::try_new(default_directives(level)).is_ok());
        }
    }
}
