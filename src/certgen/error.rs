// ABOUTME: Certificate generation errors with SNAFU pattern.
// ABOUTME: Separates entropy, encoding and signing failures for programmatic handling.

use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum GenerationError {
    #[snafu(display("failed to generate {bits}-bit RSA key: {source}"))]
    KeyGeneration { bits: usize, source: rsa::Error },

    #[snafu(display("failed to encode private key: {source}"))]
    KeyEncoding { source: rsa::pkcs1::Error },

    #[snafu(display("failed to build certificate: {source}"))]
    Certificate { source: rcgen::Error },

    #[snafu(display("invalid validity window: {reason}"))]
    InvalidValidity { reason: String },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationErrorKind {
    /// The random source or prime search failed.
    Entropy,
    /// Encoding the key or validity dates failed.
    Encoding,
    /// Assembling or self-signing the certificate failed.
    Signing,
}

impl GenerationError {
    pub fn kind(&self) -> GenerationErrorKind {
        match self {
            GenerationError::KeyGeneration { .. } => GenerationErrorKind::Entropy,
            GenerationError::KeyEncoding { .. } | GenerationError::InvalidValidity { .. } => {
                GenerationErrorKind::Encoding
            }
            GenerationError::Certificate { .. } => GenerationErrorKind::Signing,
        }
    }
}
