// ABOUTME: Diagnostics accumulator for non-fatal warnings during an invocation.
// ABOUTME: Collects warnings that shouldn't fail the run but should be shown to users.

/// Collects non-fatal warnings while configuring and running a session.
#[derive(Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning. The caller decides when to surface the collection.
    pub fn warn(&mut self, warning: Warning) {
        tracing::debug!(kind = ?warning.kind, "{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Check whether a warning of the given kind was recorded.
    pub fn contains(&self, kind: WarningKind) -> bool {
        self.warnings.iter().any(|w| w.kind == kind)
    }
}

/// A non-fatal warning.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// Server certificate verification was turned off.
    pub fn insecure_tls(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::InsecureTls,
            message: message.into(),
        }
    }

    /// Basic credentials will travel over plaintext HTTP.
    pub fn plaintext_basic_auth(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::PlaintextBasicAuth,
            message: message.into(),
        }
    }

    /// An unrecognized key size was replaced by the default.
    pub fn key_size_fallback(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::KeySizeFallback,
            message: message.into(),
        }
    }

    /// The remote session could not be released cleanly.
    pub fn session_close(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::SessionClose,
            message: message.into(),
        }
    }
}

/// Categories of non-fatal warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    InsecureTls,
    PlaintextBasicAuth,
    KeySizeFallback,
    SessionClose,
}
