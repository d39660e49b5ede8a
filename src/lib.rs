// ABOUTME: Library root for rwinrm.
// ABOUTME: Remote command execution over WinRM and self-signed client certificate generation.

pub mod certgen;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod interrupt;
pub mod session;
pub mod shell;
pub mod types;

pub use error::{Error, Result};
