// ABOUTME: Configuration and argument validation errors.
// ABOUTME: Raised before any network connection or file output is attempted.

use crate::types::RemoteCommandError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Command(#[from] RemoteCommandError),

    #[error("invalid port {0}: must be between 1 and 65535")]
    InvalidPort(u16),

    #[error("invalid timeout '{value}': {reason}")]
    InvalidTimeout { value: String, reason: String },

    #[error("certificate and private key must go to different files, both were {}", .0.display())]
    SameArtifactPath(PathBuf),
}
