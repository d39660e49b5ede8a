// ABOUTME: State transitions for one remote command run.
// ABOUTME: Each method consumes self and returns the next state on success.

use super::Streams;
use super::state::{Completed, Configured, Connected};
use crate::config::ConnectionConfig;
use crate::diagnostics::{Diagnostics, Warning};
use crate::shell::{
    ConnectError, Connector, Credentials, Endpoint, RemoteSession, RunError, RunErrorKind,
    transporter_for,
};
use crate::types::RemoteCommand;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

/// A single remote command run in state `S`.
pub struct Run<S> {
    endpoint: Endpoint,
    state: S,
}

impl<S> Run<S> {
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

// =============================================================================
// Configured -> Connected
// =============================================================================

impl Run<Configured> {
    /// Describe the endpoint and pick the auth transport.
    pub fn new(config: &ConnectionConfig, credentials: Credentials, diag: &mut Diagnostics) -> Self {
        let endpoint = Endpoint::from_config(config);

        if endpoint.tls().is_insecure() {
            diag.warn(Warning::insecure_tls(format!(
                "server certificate verification is disabled for {}",
                endpoint.url()
            )));
        }

        let transport = transporter_for(config.auth_mode);
        transport.inspect(&endpoint, diag);

        Self {
            endpoint,
            state: Configured {
                credentials,
                transport,
            },
        }
    }

    /// Authenticate and open the session.
    ///
    /// Gives up with [`ConnectError::Timeout`] once the endpoint's connect
    /// timeout elapses, and with [`ConnectError::Cancelled`] on interrupt.
    pub async fn connect<C: Connector>(
        self,
        connector: &C,
        cancel: &CancellationToken,
    ) -> Result<Run<Connected<C::Session>>, ConnectError> {
        let Run { endpoint, state } = self;

        tracing::info!(
            url = %endpoint.url(),
            auth = state.transport.mode().as_str(),
            user = state.credentials.username(),
            "connecting"
        );

        let open = connector.open_session(&endpoint, &state.credentials, Arc::clone(&state.transport));
        let open = async {
            match endpoint.connect_timeout() {
                Some(limit) => tokio::time::timeout(limit, open)
                    .await
                    .map_err(|_| ConnectError::Timeout {
                        url: endpoint.url(),
                        timeout: limit,
                    })?,
                None => open.await,
            }
        };

        let session = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ConnectError::Cancelled),
            opened = open => opened?,
        };

        tracing::debug!(url = %endpoint.url(), "session open");
        Ok(Run {
            endpoint,
            state: Connected { session },
        })
    }
}

// =============================================================================
// Connected -> Completed
// =============================================================================

impl<R: RemoteSession> Run<Connected<R>> {
    /// Run the command, streaming through `streams`, then close the session.
    ///
    /// Input is forwarded only when `streams.stdin` is present. The session
    /// is closed on every path; a failed close is only a warning.
    pub async fn execute(
        self,
        command: &RemoteCommand,
        streams: Streams<'_>,
        cancel: &CancellationToken,
        diag: &mut Diagnostics,
    ) -> Result<Run<Completed>, RunError> {
        let Run {
            endpoint,
            state: Connected { mut session },
        } = self;
        let Streams {
            mut stdout,
            mut stderr,
            stdin,
        } = streams;

        let result = match stdin {
            None => {
                tracing::debug!("stdin is a terminal; not forwarding input");
                session
                    .run_interactive(cancel, command, &mut *stdout, &mut *stderr)
                    .await
            }
            Some(mut input) => {
                tracing::debug!("forwarding redirected stdin");
                session
                    .run_with_input(cancel, command, &mut *stdout, &mut *stderr, &mut *input)
                    .await
            }
        };

        let flushed = async {
            stdout.flush().await?;
            stderr.flush().await
        }
        .await;

        if let Err(e) = session.close().await {
            diag.warn(Warning::session_close(format!(
                "failed to close session on {}: {e}",
                endpoint.url()
            )));
        }

        let exit_code = match result {
            Ok(code) => code,
            Err(e) => {
                match e.kind() {
                    RunErrorKind::Cancelled => tracing::warn!("remote command cancelled"),
                    RunErrorKind::Local | RunErrorKind::Remote => {
                        tracing::error!(error = %e, "remote command failed")
                    }
                }
                return Err(e);
            }
        };
        flushed.map_err(RunError::Stream)?;

        tracing::debug!(exit_code, "remote command finished");
        Ok(Run {
            endpoint,
            state: Completed { exit_code },
        })
    }
}

impl Run<Completed> {
    pub fn exit_code(&self) -> i32 {
        self.state.exit_code
    }
}
