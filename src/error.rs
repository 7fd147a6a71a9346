use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;

/// Main error type for harness operations
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Combination index {index} out of range (valid: 0..{count})")]
    OutOfRange { index: i64, count: usize },

    #[error("Error mounting: ret {exit_code} cmd: {command}")]
    Mount { exit_code: i32, command: String },

    #[error("Error unmounting: ret {exit_code} cmd: {command}")]
    Unmount { exit_code: i32, command: String },

    #[error("Already mounted at {0:?}")]
    AlreadyMounted(PathBuf),

    #[error("Filesystem error on {path:?}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Torture test {name} failed: ret {exit_code} cmd: {command}")]
    TortureFailed {
        name: String,
        exit_code: i32,
        command: String,
        output: String,
    },

    #[error("Verification failed: {0}")]
    Verification(String),

    #[error("Operation interrupted")]
    Interrupted,
}

impl HarnessError {
    /// Wrap an I/O error with the path it happened on
    pub fn filesystem(path: impl Into<PathBuf>, source: io::Error) -> Self {
        HarnessError::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Exit code of the failing external command, if any
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            HarnessError::Mount { exit_code, .. }
            | HarnessError::Unmount { exit_code, .. }
            | HarnessError::TortureFailed { exit_code, .. } => Some(*exit_code),
            _ => None,
        }
    }
}

/// Result type alias for harness operations
pub type Result<T> = std::result::Result<T, HarnessError>;
