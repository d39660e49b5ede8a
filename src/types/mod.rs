// ABOUTME: Validated domain types shared by the CLI, generator, and orchestrator.
// ABOUTME: Parsing rules live next to the types so callers never see raw strings.

mod command;
mod key_size;

pub use command::{RemoteCommand, RemoteCommandError};
pub use key_size::{KeySize, KeySizeError};
