// ABOUTME: Writes a generated certificate and key to disk as a pair.
// ABOUTME: Both files are staged before either is committed; a failed key commit restores the old cert.

use super::CertArtifact;
use crate::config::ConfigError;
use crate::error::{Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempPath};

pub const DEFAULT_CERT_PATH: &str = "cert.cer";
pub const DEFAULT_KEY_PATH: &str = "priv.pem";

#[cfg(unix)]
const CERT_MODE: u32 = 0o644;
#[cfg(unix)]
const KEY_MODE: u32 = 0o600;

/// Destinations for the certificate and private key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub certificate: PathBuf,
    pub private_key: PathBuf,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            certificate: PathBuf::from(DEFAULT_CERT_PATH),
            private_key: PathBuf::from(DEFAULT_KEY_PATH),
        }
    }
}

/// Write both PEM blobs, or neither.
pub fn write_artifacts(artifact: &CertArtifact, paths: &ArtifactPaths) -> Result<()> {
    if paths.certificate == paths.private_key {
        return Err(ConfigError::SameArtifactPath(paths.certificate.clone()).into());
    }

    #[cfg(unix)]
    let (cert_mode, key_mode) = (Some(CERT_MODE), Some(KEY_MODE));
    #[cfg(not(unix))]
    let (cert_mode, key_mode) = (None, None);

    let cert = stage(&paths.certificate, &artifact.certificate_pem, cert_mode)?;
    let key = stage(&paths.private_key, &artifact.private_key_pem, key_mode)?;
    let backup = backup(&paths.certificate)?;

    cert.persist(&paths.certificate)
        .map_err(|e| Error::io(&paths.certificate, e.error))?;

    if let Err(e) = key.persist(&paths.private_key) {
        let rollback = match backup {
            Some(old) => old.persist(&paths.certificate).map_err(|e| e.error),
            None => std::fs::remove_file(&paths.certificate),
        };
        if let Err(cleanup) = rollback {
            tracing::warn!(
                path = %paths.certificate.display(),
                error = %cleanup,
                "failed to roll back certificate after key write failed"
            );
        }
        return Err(Error::io(&paths.private_key, e.error));
    }

    tracing::info!(
        cert = %paths.certificate.display(),
        key = %paths.private_key.display(),
        "wrote certificate and private key"
    );
    Ok(())
}

fn parent_dir(dest: &Path) -> &Path {
    match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

/// Copy an existing file next to itself so it can be put back.
fn backup(dest: &Path) -> Result<Option<TempPath>> {
    if !dest.is_file() {
        return Ok(None);
    }
    let dir = parent_dir(dest);
    let copy = NamedTempFile::new_in(dir)
        .map_err(|e| Error::io(dir, e))?
        .into_temp_path();
    std::fs::copy(dest, &copy).map_err(|e| Error::io(dest, e))?;
    Ok(Some(copy))
}

/// Write `contents` to a temp file in the destination's directory.
fn stage(dest: &Path, contents: &[u8], mode: Option<u32>) -> Result<NamedTempFile> {
    let dir = parent_dir(dest);

    let mut file = NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;
    file.write_all(contents).map_err(|e| Error::io(dest, e))?;
    file.as_file().sync_all().map_err(|e| Error::io(dest, e))?;

    #[cfg(unix)]
    if let Some(mode) = mode {
        use std::os::unix::fs::PermissionsExt;
        file.as_file()
            .set_permissions(std::fs::Permissions::from_mode(mode))
            .map_err(|e| Error::io(dest, e))?;
    }
    #[cfg(not(unix))]
    let _ = mode;

    Ok(file)
}
