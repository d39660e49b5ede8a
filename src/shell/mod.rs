// ABOUTME: Remote shell collaborator boundary: connector, session, transport and endpoint.
// ABOUTME: The orchestrator talks only to these traits; the wire protocol lives behind them.

mod endpoint;
mod error;
mod powershell;
mod process;
mod sealed;
mod transport;

pub use endpoint::{Endpoint, TlsPolicy};
pub use error::{ConnectError, RunError, RunErrorKind};
pub use powershell::{PowerShellConnector, PowerShellSession};
pub use process::run_streaming;
pub use transport::{BasicTransport, NtlmTransport, Transporter, transporter_for};

use crate::types::RemoteCommand;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;

/// Username and password presented to the endpoint.
///
/// The password never appears in `Debug` output.
pub struct Credentials {
    username: String,
    password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &SecretString {
        &self.password
    }
}

impl Clone for Credentials {
    fn clone(&self) -> Self {
        Self {
            username: self.username.clone(),
            password: SecretString::from(self.password.expose_secret()),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Opens authenticated sessions against an endpoint.
#[async_trait]
pub trait Connector: Send + Sync {
    type Session: RemoteSession;

    async fn open_session(
        &self,
        endpoint: &Endpoint,
        credentials: &Credentials,
        transport: Arc<dyn Transporter>,
    ) -> Result<Self::Session, ConnectError>;
}

/// An open remote shell that runs one command at a time.
///
/// Both run methods stream output into the given sinks as it arrives and
/// return the remote exit code. Both must return promptly with
/// [`RunError::Cancelled`] once `cancel` fires.
#[async_trait]
pub trait RemoteSession: Send {
    /// Run without forwarding local input; the remote command sees empty stdin.
    async fn run_interactive(
        &mut self,
        cancel: &CancellationToken,
        command: &RemoteCommand,
        stdout: &mut (dyn AsyncWrite + Send + Unpin),
        stderr: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<i32, RunError>;

    /// Run while forwarding every byte of `stdin` to the remote command.
    async fn run_with_input(
        &mut self,
        cancel: &CancellationToken,
        command: &RemoteCommand,
        stdout: &mut (dyn AsyncWrite + Send + Unpin),
        stderr: &mut (dyn AsyncWrite + Send + Unpin),
        stdin: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<i32, RunError>;

    /// Release the remote shell.
    async fn close(&mut self) -> Result<(), RunError>;
}
