// ABOUTME: Decoding of base64-encoded passwords supplied on the command line.
// ABOUTME: Runs once during configuration; the orchestrator only sees the decoded secret.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use secrecy::SecretString;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("decoded password is not valid UTF-8")]
    Utf8,
}

/// Decode a base64 password, dropping line breaks in the input and trailing CR/LF
/// in the decoded text.
///
/// Encoders such as `base64` or PowerShell's `[Convert]::ToBase64String` piped
/// through a file commonly leave a newline on either side, so both are tolerated.
pub fn decode_password(encoded: &str) -> Result<SecretString, DecodeError> {
    let compact: String = encoded
        .chars()
        .filter(|c| !matches!(c, '\r' | '\n'))
        .collect();

    let bytes = STANDARD.decode(compact.as_bytes())?;
    let text = String::from_utf8(bytes).map_err(|_| DecodeError::Utf8)?;

    Ok(SecretString::new(text.trim_end_matches(['\r', '\n']).into()))
}
