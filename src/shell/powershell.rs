// ABOUTME: Connector that drives PowerShell Remoting through a local pwsh process.
// ABOUTME: Secrets travel in a JSON line on stdin so they never appear in process arguments.

use super::endpoint::Endpoint;
use super::error::{ConnectError, RunError};
use super::process::run_streaming;
use super::transport::Transporter;
use super::{Connector, Credentials, RemoteSession};
use crate::types::RemoteCommand;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use secrecy::ExposeSecret;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

/// Reads the request line, opens a PSSession, and either stops there or runs the command.
///
/// Forwarded input is streamed line by line into a steppable pipeline around
/// the remote command, so the command starts before local input ends. Remote
/// native stderr comes back as error records and is written to the local
/// stderr; everything else goes to stdout. The script exits with the remote
/// `$LASTEXITCODE`. On SIGINT PowerShell stops the pipeline and the `finally`
/// block removes the remote session.
const REMOTING_SCRIPT: &str = r#"$ErrorActionPreference = 'Stop'
$session = $null
try {
    $raw = [Console]::In.ReadLine()
    if ([string]::IsNullOrWhiteSpace($raw)) { throw 'no session request received' }
    $req = $raw | ConvertFrom-Json

    $pwSecure = New-Object System.Security.SecureString
    ([string]$req.password).ToCharArray() | ForEach-Object { $pwSecure.AppendChar($_) }
    $cred = New-Object System.Management.Automation.PSCredential([string]$req.username, $pwSecure)

    $optArgs = @{}
    if ($req.skip_ca_check) { $optArgs.SkipCACheck = $true; $optArgs.SkipCNCheck = $true }
    if ($req.open_timeout_ms) { $optArgs.OpenTimeout = [int]$req.open_timeout_ms }
    $opt = New-PSSessionOption @optArgs

    $session = New-PSSession -ComputerName $req.server -Port $req.port -UseSSL:([bool]$req.use_ssl) `
        -Authentication $req.authentication -Credential $cred -SessionOption $opt

    if ($req.action -eq 'connect') { exit 0 }

    $commandText = [System.Text.Encoding]::UTF8.GetString([System.Convert]::FromBase64String([string]$req.command_b64))

    $emit = {
        if ($_ -is [System.Management.Automation.ErrorRecord]) {
            [Console]::Error.WriteLine($_.ToString())
        } else {
            [Console]::Out.WriteLine($_)
        }
    }

    if ($req.forward_input) {
        # Each local line is handed to the remote command as soon as it is read.
        & { while ($null -ne ($line = [Console]::In.ReadLine())) { $line } } |
            Invoke-Command -Session $session -ArgumentList $commandText -ScriptBlock {
                param($c)
                begin {
                    $ErrorActionPreference = 'Continue'
                    $OutputEncoding = New-Object System.Text.UTF8Encoding($false)
                    $pipe = { cmd.exe /c $c 2>&1 }.GetSteppablePipeline()
                    $pipe.Begin($true)
                }
                process { $pipe.Process($_) }
                end { $pipe.End() }
            } | ForEach-Object $emit
    } else {
        Invoke-Command -Session $session -ArgumentList $commandText -ScriptBlock {
            param($c)
            $ErrorActionPreference = 'Continue'
            cmd.exe /c $c 2>&1
        } | ForEach-Object $emit
    }

    $code = Invoke-Command -Session $session -ScriptBlock { $LASTEXITCODE }
    if ($null -eq $code) { $code = 0 }
    exit [int]$code
} catch {
    [Console]::Error.WriteLine($_.Exception.Message)
    exit 1
} finally {
    if ($session) { Remove-PSSession -Session $session -ErrorAction SilentlyContinue }
}"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum Action {
    Connect,
    Run,
}

#[derive(Serialize)]
struct Request<'a> {
    action: Action,
    server: &'a str,
    port: u16,
    use_ssl: bool,
    skip_ca_check: bool,
    authentication: &'static str,
    username: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    open_timeout_ms: Option<u128>,
    #[serde(skip_serializing_if = "Option::is_none")]
    command_b64: Option<String>,
    forward_input: bool,
}

/// Shared pieces of a connection check or a run.
struct Target<'a> {
    endpoint: &'a Endpoint,
    credentials: &'a Credentials,
    mechanism: &'static str,
}

impl Target<'_> {
    /// Serialize the request as a single newline-terminated JSON line.
    fn request_line(
        &self,
        action: Action,
        command: Option<&RemoteCommand>,
        forward_input: bool,
    ) -> Result<Vec<u8>, serde_json::Error> {
        let request = Request {
            action,
            server: self.endpoint.host(),
            port: self.endpoint.port(),
            use_ssl: self.endpoint.use_https(),
            skip_ca_check: self.endpoint.tls().is_insecure(),
            authentication: self.mechanism,
            username: self.credentials.username(),
            password: self.credentials.password().expose_secret(),
            open_timeout_ms: self.endpoint.connect_timeout().map(|t| t.as_millis()),
            command_b64: command.map(|c| STANDARD.encode(c.as_str().as_bytes())),
            forward_input,
        };
        let mut line = serde_json::to_vec(&request)?;
        line.push(b'\n');
        Ok(line)
    }
}

fn remoting_command(program: &Path, ca_file: Option<&Path>) -> Command {
    let mut cmd = Command::new(program);
    cmd.arg("-NoProfile")
        .arg("-NonInteractive")
        .arg("-Command")
        .arg(REMOTING_SCRIPT);
    if let Some(path) = ca_file {
        cmd.env("SSL_CERT_FILE", path);
    }
    cmd
}

fn stage_ca(endpoint: &Endpoint) -> Result<Option<NamedTempFile>, ConnectError> {
    let Some(pem) = endpoint.tls().ca_cert() else {
        return Ok(None);
    };
    let mut file = NamedTempFile::new().map_err(ConnectError::CaTrust)?;
    file.write_all(pem).map_err(ConnectError::CaTrust)?;
    file.flush().map_err(ConnectError::CaTrust)?;
    Ok(Some(file))
}

fn redact(text: &str, secret: &str) -> String {
    if secret.is_empty() {
        text.to_string()
    } else {
        text.replace(secret, "<redacted>")
    }
}

/// Opens sessions by running PowerShell Remoting in a local `pwsh`.
#[derive(Debug, Clone)]
pub struct PowerShellConnector {
    program: PathBuf,
}

impl PowerShellConnector {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    async fn check_connection(
        &self,
        target: &Target<'_>,
        ca_file: Option<&Path>,
    ) -> Result<(), ConnectError> {
        let line = target.request_line(Action::Connect, None, false)?;

        let mut cmd = remoting_command(&self.program, ca_file);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| ConnectError::Launch {
            program: self.program.display().to_string(),
            source,
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            // A client that exits early has already failed; its status says why.
            let _ = stdin.write_all(&line).await;
            let _ = stdin.shutdown().await;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|source| ConnectError::Launch {
                program: self.program.display().to_string(),
                source,
            })?;

        if output.status.success() {
            return Ok(());
        }

        let password = target.credentials.password().expose_secret();
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let reason = match (stderr.trim(), stdout.trim()) {
            ("", "") => format!("remoting client exited with {}", output.status),
            ("", out) => redact(out, password),
            (err, _) => redact(err, password),
        };

        Err(ConnectError::Rejected {
            url: target.endpoint.url(),
            reason,
        })
    }
}

#[async_trait]
impl Connector for PowerShellConnector {
    type Session = PowerShellSession;

    async fn open_session(
        &self,
        endpoint: &Endpoint,
        credentials: &Credentials,
        transport: Arc<dyn Transporter>,
    ) -> Result<PowerShellSession, ConnectError> {
        let ca_file = stage_ca(endpoint)?;
        let target = Target {
            endpoint,
            credentials,
            mechanism: transport.mechanism(),
        };

        tracing::debug!(
            url = %endpoint.url(),
            auth = transport.mechanism(),
            program = %self.program.display(),
            "opening remoting session"
        );

        self.check_connection(&target, ca_file.as_ref().map(NamedTempFile::path))
            .await?;

        Ok(PowerShellSession {
            program: self.program.clone(),
            endpoint: endpoint.clone(),
            credentials: credentials.clone(),
            mechanism: transport.mechanism(),
            ca_file,
            closed: false,
        })
    }
}

/// A verified remoting target. Each run opens and removes its own PSSession.
pub struct PowerShellSession {
    program: PathBuf,
    endpoint: Endpoint,
    credentials: Credentials,
    mechanism: &'static str,
    ca_file: Option<NamedTempFile>,
    closed: bool,
}

impl PowerShellSession {
    async fn run(
        &mut self,
        cancel: &CancellationToken,
        command: &RemoteCommand,
        stdout: &mut (dyn AsyncWrite + Send + Unpin),
        stderr: &mut (dyn AsyncWrite + Send + Unpin),
        stdin: Option<&mut (dyn AsyncRead + Send + Unpin)>,
    ) -> Result<i32, RunError> {
        if self.closed {
            return Err(RunError::Remote("session already closed".into()));
        }

        let target = Target {
            endpoint: &self.endpoint,
            credentials: &self.credentials,
            mechanism: self.mechanism,
        };
        let line = target
            .request_line(Action::Run, Some(command), stdin.is_some())
            .map_err(|e| RunError::Spawn(std::io::Error::other(e)))?;

        let cmd = remoting_command(
            &self.program,
            self.ca_file.as_ref().map(NamedTempFile::path),
        );
        run_streaming(cmd, line, stdin, stdout, stderr, cancel).await
    }
}

#[async_trait]
impl RemoteSession for PowerShellSession {
    async fn run_interactive(
        &mut self,
        cancel: &CancellationToken,
        command: &RemoteCommand,
        stdout: &mut (dyn AsyncWrite + Send + Unpin),
        stderr: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<i32, RunError> {
        self.run(cancel, command, stdout, stderr, None).await
    }

    async fn run_with_input(
        &mut self,
        cancel: &CancellationToken,
        command: &RemoteCommand,
        stdout: &mut (dyn AsyncWrite + Send + Unpin),
        stderr: &mut (dyn AsyncWrite + Send + Unpin),
        stdin: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<i32, RunError> {
        self.run(cancel, command, stdout, stderr, Some(stdin)).await
    }

    async fn close(&mut self) -> Result<(), RunError> {
        self.closed = true;
        if let Some(file) = self.ca_file.take() {
            file.close().map_err(RunError::Stream)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectionConfig;
    use secrecy::SecretString;
    use std::time::Duration;

    fn creds() -> Credentials {
        Credentials::new("vagrant", SecretString::from("pa55word"))
    }

    fn decode(line: &[u8]) -> serde_json::Value {
        assert_eq!(line.last(), Some(&b'\n'));
        serde_json::from_slice(&line[..line.len() - 1]).unwrap()
    }

    #[test]
    fn connect_request_carries_endpoint_and_auth() {
        let config = ConnectionConfig::new("win01")
            .port(5986)
            .https(true)
            .connect_timeout(Duration::from_secs(3));
        let endpoint = Endpoint::from_config(&config);
        let credentials = creds();
        let target = Target {
            endpoint: &endpoint,
            credentials: &credentials,
            mechanism: "Negotiate",
        };

        let json = decode(&target.request_line(Action::Connect, None, false).unwrap());
        assert_eq!(json["action"], "connect");
        assert_eq!(json["server"], "win01");
        assert_eq!(json["port"], 5986);
        assert_eq!(json["use_ssl"], true);
        assert_eq!(json["skip_ca_check"], false);
        assert_eq!(json["authentication"], "Negotiate");
        assert_eq!(json["open_timeout_ms"], 3000);
        assert!(json.get("command_b64").is_none());
    }

    #[test]
    fn run_request_encodes_command_verbatim() {
        let endpoint = Endpoint::from_config(&ConnectionConfig::new("win01"));
        let credentials = creds();
        let target = Target {
            endpoint: &endpoint,
            credentials: &credentials,
            mechanism: "Basic",
        };
        let command = RemoteCommand::new("echo \"a & b\"").unwrap();

        let json = decode(
            &target
                .request_line(Action::Run, Some(&command), true)
                .unwrap(),
        );
        assert_eq!(json["action"], "run");
        assert_eq!(json["forward_input"], true);
        let decoded = STANDARD
            .decode(json["command_b64"].as_str().unwrap())
            .unwrap();
        assert_eq!(decoded, b"echo \"a & b\"");
        assert!(json.get("open_timeout_ms").is_none());
    }

    #[test]
    fn password_never_reaches_arguments() {
        let cmd = remoting_command(Path::new("pwsh"), None);
        let args: Vec<_> = cmd.as_std().get_args().collect();
        assert!(args.iter().all(|a| !a.to_string_lossy().contains("pa55word")));
        assert_eq!(args[0], "-NoProfile");
    }

    #[test]
    fn ca_trust_is_exposed_through_environment() {
        let cmd = remoting_command(Path::new("pwsh"), Some(Path::new("/tmp/ca.pem")));
        let env: Vec<_> = cmd.as_std().get_envs().collect();
        assert!(
            env.iter()
                .any(|(k, v)| *k == "SSL_CERT_FILE" && *v == Some(Path::new("/tmp/ca.pem").as_os_str()))
        );
    }

    #[test]
    fn system_trust_store_is_used_without_anchor() {
        let cmd = remoting_command(Path::new("pwsh"), None);
        assert!(cmd.as_std().get_envs().all(|(k, _)| k != "SSL_CERT_FILE"));
    }

    #[test]
    fn stage_ca_writes_pem_bytes() {
        let config = ConnectionConfig::new("win01").ca_cert(b"PEM".to_vec());
        let staged = stage_ca(&Endpoint::from_config(&config)).unwrap().unwrap();
        assert_eq!(std::fs::read(staged.path()).unwrap(), b"PEM");

        let none = stage_ca(&Endpoint::from_config(&ConnectionConfig::new("win01"))).unwrap();
        assert!(none.is_none());
    }

    #[test]
    fn redact_hides_password() {
        assert_eq!(
            redact("Logon failure for pa55word", "pa55word"),
            "Logon failure for <redacted>"
        );
        assert_eq!(redact("unchanged", ""), "unchanged");
    }

    #[tokio::test]
    async fn missing_client_is_a_launch_error() {
        let connector = PowerShellConnector::new("/nonexistent/pwsh");
        let endpoint = Endpoint::from_config(&ConnectionConfig::new("win01"));
        let err = connector
            .open_session(&endpoint, &creds(), crate::shell::transporter_for(Default::default()))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ConnectError::Launch { .. }));
    }

    #[test]
    fn forwarded_input_is_streamed_not_buffered() {
        assert!(!REMOTING_SCRIPT.contains("ReadToEnd"));
        assert!(REMOTING_SCRIPT.contains("while ($null -ne ($line = [Console]::In.ReadLine()))"));
        assert!(REMOTING_SCRIPT.contains("GetSteppablePipeline()"));
        assert!(REMOTING_SCRIPT.contains("UTF8Encoding($false)"));
        assert!(REMOTING_SCRIPT.contains("Remove-PSSession"));
    }

    #[tokio::test]
    async fn script_rejects_a_missing_request() {
        let spawned = Command::new("pwsh")
            .args(["-NoProfile", "-NonInteractive", "-Command"])
            .arg(REMOTING_SCRIPT)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();
        let Ok(mut child) = spawned else {
            // Needs a local PowerShell client.
            return;
        };
        let mut stdin = child.stdin.take().unwrap();
        stdin.write_all(b"\n").await.unwrap();
        drop(stdin);
        let output = child.wait_with_output().await.unwrap();
        assert_eq!(output.status.code(), Some(1));
        assert!(String::from_utf8_lossy(&output.stderr).contains("no session request received"));
    }
}
