// ABOUTME: Session orchestration using the type state pattern.
// ABOUTME: Connects, runs one command with the right stdin mode, and reports its exit code.

mod run;
mod state;

pub use run::Run;
pub use state::{Completed, Configured, Connected};

use crate::config::ConnectionConfig;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::shell::{Connector, Credentials};
use crate::types::RemoteCommand;
use is_terminal::IsTerminal;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;

/// Whether local stdin is forwarded to the remote command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Stdin is a terminal; nothing is forwarded.
    Interactive,
    /// Stdin is a pipe, file or empty; every byte is forwarded.
    Piped,
}

impl InputMode {
    pub fn detect() -> Self {
        if std::io::stdin().is_terminal() {
            InputMode::Interactive
        } else {
            InputMode::Piped
        }
    }
}

/// Local ends of the remote command's standard streams.
pub struct Streams<'a> {
    pub stdout: Box<dyn AsyncWrite + Send + Unpin + 'a>,
    pub stderr: Box<dyn AsyncWrite + Send + Unpin + 'a>,
    /// `None` runs without forwarding input.
    pub stdin: Option<Box<dyn AsyncRead + Send + Unpin + 'a>>,
}

impl Streams<'static> {
    /// The process's own stdio, forwarding stdin only when it is redirected.
    pub fn process(mode: InputMode) -> Self {
        Self {
            stdout: Box::new(tokio::io::stdout()),
            stderr: Box::new(tokio::io::stderr()),
            stdin: match mode {
                InputMode::Interactive => None,
                InputMode::Piped => Some(Box::new(tokio::io::stdin())),
            },
        }
    }
}

/// Connect, run `command`, and return its exit code.
pub async fn run<C: Connector>(
    connector: &C,
    config: &ConnectionConfig,
    credentials: Credentials,
    command: &RemoteCommand,
    streams: Streams<'_>,
    cancel: &CancellationToken,
    diag: &mut Diagnostics,
) -> Result<i32> {
    let configured = Run::new(config, credentials, diag);
    let connected = configured.connect(connector, cancel).await?;
    let completed = connected.execute(command, streams, cancel, diag).await?;
    Ok(completed.exit_code())
}
