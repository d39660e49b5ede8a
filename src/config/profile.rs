// ABOUTME: Optional YAML connection profile loaded with --config.
// ABOUTME: Supplies connection defaults; secrets are never read from the profile.

use super::AuthMode;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Connection defaults for a host, overridden by command-line flags.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    #[serde(default)]
    pub hostname: Option<String>,

    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub auth: Option<AuthMode>,

    #[serde(default)]
    pub https: Option<bool>,

    #[serde(default)]
    pub insecure: Option<bool>,

    #[serde(default)]
    pub cacert: Option<PathBuf>,

    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,

    #[serde(default)]
    pub pwsh: Option<PathBuf>,
}

impl Profile {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_yaml(&content)
    }
}
