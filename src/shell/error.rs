// ABOUTME: Errors raised while opening a remote session and running a command in it.
// ABOUTME: RunError::kind() separates operator cancellation from genuine failures.

use std::time::Duration;
use thiserror::Error;

/// Failure to establish an authenticated session.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("timed out after {timeout:?} connecting to {url}")]
    Timeout { url: String, timeout: Duration },

    #[error("interrupted while connecting")]
    Cancelled,

    #[error("{url} refused the session: {reason}")]
    Rejected { url: String, reason: String },

    #[error("failed to launch remoting client '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to stage CA certificate: {0}")]
    CaTrust(#[source] std::io::Error),

    #[error("failed to encode session request: {0}")]
    Request(#[from] serde_json::Error),
}

/// Failure while the remote command runs.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("remote command cancelled by interrupt")]
    Cancelled,

    #[error("failed to start remote command: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("stream I/O failed: {0}")]
    Stream(#[source] std::io::Error),

    #[error("remote shell ended without reporting an exit status")]
    Terminated,

    #[error("remote command failed: {0}")]
    Remote(String),
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunErrorKind {
    /// The operator interrupted the run.
    Cancelled,
    /// Local plumbing failed (process, pipes).
    Local,
    /// The remote side failed or vanished.
    Remote,
}

impl RunError {
    pub fn kind(&self) -> RunErrorKind {
        match self {
            RunError::Cancelled => RunErrorKind::Cancelled,
            RunError::Spawn(_) | RunError::Stream(_) => RunErrorKind::Local,
            RunError::Terminated | RunError::Remote(_) => RunErrorKind::Remote,
        }
    }
}
