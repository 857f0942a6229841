//! Error types for the soak driver.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while preparing or running a soak.
///
/// Per-iteration failures (timeouts, non-zero exits) are not errors; they are
/// outcomes tallied by the driver. These variants cover the cases where an
/// iteration could not be run or its artifacts could not be handled.
#[derive(Debug, Error)]
pub enum SoakError {
    /// No command tokens were supplied.
    #[error("No command provided. Example: -- balances")]
    EmptyCommand,

    /// The target program could not be started.
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Writing a raw-output log file failed.
    #[error("Failed to write log {path}: {source}")]
    LogWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for soak operations.
pub type SoakResult<T> = Result<T, SoakError>;
