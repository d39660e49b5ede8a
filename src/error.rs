// ABOUTME: Application-wide error types for rwinrm.
// ABOUTME: Every variant is fatal to the invocation and maps to the local failure status.

use crate::certgen::GenerationError;
use crate::config::{ConfigError, DecodeError};
use crate::shell::{ConnectError, RunError};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Process status for any local failure, as opposed to a remote exit code.
pub const LOCAL_FAILURE_EXIT: i32 = 1;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid encoded password: {0}")]
    Decode(#[from] DecodeError),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("certificate generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("connection failed: {0}")]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Run(#[from] RunError),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Exit status reported for this error.
    pub fn exit_code(&self) -> i32 {
        LOCAL_FAILURE_EXIT
    }

    /// Whether the invocation ended because the operator interrupted it.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Run(RunError::Cancelled) | Error::Connect(ConnectError::Cancelled))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
