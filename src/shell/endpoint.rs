// ABOUTME: Endpoint descriptor: address plus transport policy for the remote service.
// ABOUTME: Keeps verified and insecure TLS as distinct variants so neither is implicit.

use crate::config::ConnectionConfig;
use std::fmt;
use std::time::Duration;

/// How the server certificate is validated.
#[derive(Clone, PartialEq, Eq)]
pub enum TlsPolicy {
    /// Validate against the system trust store, or against only the given PEM
    /// anchor when one is set (it replaces the store rather than adding to it).
    Verified { ca_cert: Option<Vec<u8>> },
    /// No validation at all. Lab and test environments only.
    InsecureSkipVerify,
}

impl TlsPolicy {
    pub fn is_insecure(&self) -> bool {
        matches!(self, TlsPolicy::InsecureSkipVerify)
    }

    pub fn ca_cert(&self) -> Option<&[u8]> {
        match self {
            TlsPolicy::Verified { ca_cert } => ca_cert.as_deref(),
            TlsPolicy::InsecureSkipVerify => None,
        }
    }
}

impl fmt::Debug for TlsPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TlsPolicy::Verified { ca_cert } => f
                .debug_struct("Verified")
                .field("ca_cert_len", &ca_cert.as_ref().map(Vec::len))
                .finish(),
            TlsPolicy::InsecureSkipVerify => f.write_str("InsecureSkipVerify"),
        }
    }
}

/// Everything a collaborator needs to dial the endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    port: u16,
    use_https: bool,
    tls: TlsPolicy,
    connect_timeout: Option<Duration>,
}

impl Endpoint {
    pub fn from_config(config: &ConnectionConfig) -> Self {
        let tls = if config.skip_tls_verify {
            TlsPolicy::InsecureSkipVerify
        } else {
            TlsPolicy::Verified {
                ca_cert: config.ca_cert.clone(),
            }
        };

        Self {
            host: config.hostname.clone(),
            port: config.port,
            use_https: config.use_https,
            tls,
            connect_timeout: (!config.connect_timeout.is_zero()).then_some(config.connect_timeout),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn use_https(&self) -> bool {
        self.use_https
    }

    pub fn tls(&self) -> &TlsPolicy {
        &self.tls
    }

    /// `None` means wait indefinitely.
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout
    }

    pub fn url(&self) -> String {
        let scheme = if self.use_https { "https" } else { "http" };
        let host = if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        format!("{scheme}://{host}:{}/wsman", self.port)
    }
}
