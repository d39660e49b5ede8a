// ABOUTME: Connection configuration built once from flags and an optional YAML profile.
// ABOUTME: Applies defaults, decodes the password, reads CA trust, and validates the command.

mod error;
mod password;
mod profile;

pub use error::ConfigError;
pub use password::{DecodeError, decode_password};
pub use profile::Profile;

use crate::error::{Error, Result};
use crate::shell::Credentials;
use crate::types::RemoteCommand;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_HOSTNAME: &str = "localhost";
pub const DEFAULT_USERNAME: &str = "vagrant";
pub const DEFAULT_PASSWORD: &str = "vagrant";
pub const DEFAULT_PORT: u16 = 5985;
pub const DEFAULT_PWSH: &str = "pwsh";

/// How credentials are presented to the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    #[default]
    Basic,
    Ntlm,
}

impl AuthMode {
    pub fn as_str(self) -> &'static str {
        match self {
            AuthMode::Basic => "basic",
            AuthMode::Ntlm => "ntlm",
        }
    }
}

/// Where and how to reach the remote management endpoint.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub hostname: String,
    pub port: u16,
    pub use_https: bool,
    pub skip_tls_verify: bool,
    /// PEM-encoded trust anchor for the server certificate.
    pub ca_cert: Option<Vec<u8>>,
    /// Zero waits indefinitely.
    pub connect_timeout: Duration,
    pub auth_mode: AuthMode,
}

impl ConnectionConfig {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            port: DEFAULT_PORT,
            use_https: false,
            skip_tls_verify: false,
            ca_cert: None,
            connect_timeout: Duration::ZERO,
            auth_mode: AuthMode::Basic,
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn https(mut self, use_https: bool) -> Self {
        self.use_https = use_https;
        self
    }

    pub fn skip_tls_verify(mut self, skip: bool) -> Self {
        self.skip_tls_verify = skip;
        self
    }

    pub fn ca_cert(mut self, pem: impl Into<Vec<u8>>) -> Self {
        self.ca_cert = Some(pem.into());
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn auth_mode(mut self, mode: AuthMode) -> Self {
        self.auth_mode = mode;
        self
    }
}

/// Raw settings as given on the command line, before defaults and validation.
#[derive(Debug, Default)]
pub struct Options {
    pub hostname: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    /// The password is base64 encoded.
    pub encoded_password: bool,
    pub auth: Option<AuthMode>,
    pub https: bool,
    pub insecure: bool,
    pub cacert: Option<PathBuf>,
    pub timeout: Option<Duration>,
    pub pwsh: Option<PathBuf>,
    pub command: Option<String>,
}

/// Everything the orchestrator needs for one remote command.
#[derive(Debug)]
pub struct Invocation {
    pub connection: ConnectionConfig,
    pub credentials: Credentials,
    pub command: RemoteCommand,
    /// PowerShell executable used as the remoting client.
    pub pwsh: PathBuf,
}

impl Options {
    /// Fill unset options from a profile. Flags given on the command line win.
    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.hostname = self.hostname.or(profile.hostname);
        self.port = self.port.or(profile.port);
        self.username = self.username.or(profile.username);
        self.auth = self.auth.or(profile.auth);
        self.https |= profile.https.unwrap_or(false);
        self.insecure |= profile.insecure.unwrap_or(false);
        self.cacert = self.cacert.or(profile.cacert);
        self.timeout = self.timeout.or(profile.timeout);
        self.pwsh = self.pwsh.or(profile.pwsh);
        self
    }

    /// Validate and resolve into an invocation.
    ///
    /// The command is checked first so an empty invocation fails before any
    /// file is read or connection attempted.
    pub fn into_invocation(self) -> Result<Invocation> {
        let command = RemoteCommand::new(self.command.as_deref().unwrap_or_default())
            .map_err(ConfigError::from)?;

        let port = self.port.unwrap_or(DEFAULT_PORT);
        if port == 0 {
            return Err(ConfigError::InvalidPort(port).into());
        }

        let password = match self.password {
            Some(raw) if self.encoded_password => decode_password(raw.expose_secret())?,
            Some(raw) => raw,
            None => SecretString::new(DEFAULT_PASSWORD.into()),
        };

        let ca_cert = match &self.cacert {
            Some(path) => Some(std::fs::read(path).map_err(|e| Error::io(path, e))?),
            None => None,
        };

        let connection = ConnectionConfig {
            hostname: self
                .hostname
                .unwrap_or_else(|| DEFAULT_HOSTNAME.to_string()),
            port,
            use_https: self.https,
            skip_tls_verify: self.insecure,
            ca_cert,
            connect_timeout: self.timeout.unwrap_or(Duration::ZERO),
            auth_mode: self.auth.unwrap_or_default(),
        };

        let credentials = Credentials::new(
            self.username
                .unwrap_or_else(|| DEFAULT_USERNAME.to_string()),
            password,
        );

        Ok(Invocation {
            connection,
            credentials,
            command,
            pwsh: self.pwsh.unwrap_or_else(|| PathBuf::from(DEFAULT_PWSH)),
        })
    }
}

/// Parse a connection timeout such as `0s`, `30s`, `1m30s` or `500ms`.
pub fn parse_timeout(value: &str) -> std::result::Result<Duration, ConfigError> {
    let trimmed = value.trim();
    if trimmed == "0" {
        return Ok(Duration::ZERO);
    }

    humantime::parse_duration(trimmed).map_err(|e| ConfigError::InvalidTimeout {
        value: value.to_string(),
        reason: e.to_string(),
    })
}
