//! Error types for the runtrack_core library.

use crate::types::RunStatus;
use std::fmt;
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Failures reported by the sensor side of the system.
///
/// These never abort a run; the session records them as a loss of signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorError {
    Unavailable,
    PermissionDenied,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorError::Unavailable => write!(f, "position sensor unavailable"),
            SensorError::PermissionDenied => write!(f, "location permission denied"),
        }
    }
}

/// Core error type for runtrack_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A position fix failed validation at construction
    #[error("Invalid fix: {0}")]
    InvalidFix(String),

    /// A state-machine call that is not legal in the current state
    #[error("Cannot {action} while {from:?}")]
    InvalidTransition {
        from: RunStatus,
        action: &'static str,
    },

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A fix log row could not be parsed
    #[error("Fix log error at line {line}: {message}")]
    FixLog { line: usize, message: String },

    /// Generic error
    #[error("{0}")]
    Other(String),
}
