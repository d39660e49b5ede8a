// ABOUTME: Auth transport capability: how credentials are presented on the wire.
// ABOUTME: Basic and NTLM are interchangeable implementations chosen from the AuthMode.

use super::endpoint::Endpoint;
use super::sealed::Sealed;
use crate::config::AuthMode;
use crate::diagnostics::{Diagnostics, Warning};
use std::fmt;
use std::sync::Arc;

/// Strategy for authenticating a session.
///
/// The orchestrator only ever holds an `Arc<dyn Transporter>`; which one it
/// gets is decided once, from configuration, by [`transporter_for`].
pub trait Transporter: Sealed + Send + Sync + fmt::Debug {
    fn mode(&self) -> AuthMode;

    /// Mechanism name understood by PowerShell Remoting's `-Authentication`.
    fn mechanism(&self) -> &'static str;

    /// Record concerns about using this transport against the endpoint.
    fn inspect(&self, endpoint: &Endpoint, diag: &mut Diagnostics);
}

/// HTTP Basic credentials.
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicTransport;

/// NTLM challenge/response, negotiated by the remoting client.
#[derive(Debug, Default, Clone, Copy)]
pub struct NtlmTransport;

impl Sealed for BasicTransport {}
impl Sealed for NtlmTransport {}

impl Transporter for BasicTransport {
    fn mode(&self) -> AuthMode {
        AuthMode::Basic
    }

    fn mechanism(&self) -> &'static str {
        "Basic"
    }

    fn inspect(&self, endpoint: &Endpoint, diag: &mut Diagnostics) {
        if !endpoint.use_https() {
            diag.warn(Warning::plaintext_basic_auth(format!(
                "Basic credentials for {} are sent without TLS; use --https or --ntlm",
                endpoint.url()
            )));
        }
    }
}

impl Transporter for NtlmTransport {
    fn mode(&self) -> AuthMode {
        AuthMode::Ntlm
    }

    fn mechanism(&self) -> &'static str {
        "Negotiate"
    }

    fn inspect(&self, _endpoint: &Endpoint, _diag: &mut Diagnostics) {}
}

/// Pick the transport implementation for an auth mode.
pub fn transporter_for(mode: AuthMode) -> Arc<dyn Transporter> {
    match mode {
        AuthMode::Basic => Arc::new(BasicTransport),
        AuthMode::Ntlm => Arc::new(NtlmTransport),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectionConfig;
    use crate::diagnostics::WarningKind;

    #[test]
    fn mode_selects_matching_transport() {
        assert_eq!(transporter_for(AuthMode::Basic).mode(), AuthMode::Basic);
        assert_eq!(transporter_for(AuthMode::Ntlm).mode(), AuthMode::Ntlm);
        assert_eq!(transporter_for(AuthMode::Ntlm).mechanism(), "Negotiate");
    }

    #[test]
    fn basic_over_http_is_flagged() {
        let endpoint = Endpoint::from_config(&ConnectionConfig::new("win01"));
        let mut diag = Diagnostics::default();
        BasicTransport.inspect(&endpoint, &mut diag);
        assert!(diag.contains(WarningKind::PlaintextBasicAuth));
    }

    #[test]
    fn basic_over_https_and_ntlm_are_quiet() {
        let https = Endpoint::from_config(&ConnectionConfig::new("win01").https(true));
        let http = Endpoint::from_config(&ConnectionConfig::new("win01"));
        let mut diag = Diagnostics::default();
        BasicTransport.inspect(&https, &mut diag);
        NtlmTransport.inspect(&http, &mut diag);
        assert!(!diag.has_warnings());
    }
}
