// ABOUTME: Command line to execute on the remote host.
// ABOUTME: Rejects blank input so an empty invocation never reaches the network.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteCommandError {
    #[error("no command given: enter the command to execute on the command line")]
    Empty,
}

/// A non-blank command string, passed verbatim to the remote shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCommand(String);

impl RemoteCommand {
    pub fn new(value: &str) -> Result<Self, RemoteCommandError> {
        if value.trim().is_empty() {
            return Err(RemoteCommandError::Empty);
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemoteCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_command_verbatim() {
        let cmd = RemoteCommand::new("  dir C:\\ /w").unwrap();
        assert_eq!(cmd.as_str(), "  dir C:\\ /w");
    }

    #[test]
    fn rejects_empty_and_blank() {
        assert!(matches!(
            RemoteCommand::new(""),
            Err(RemoteCommandError::Empty)
        ));
        assert!(matches!(
            RemoteCommand::new(" \t\n"),
            Err(RemoteCommandError::Empty)
        ));
    }
}
