// ABOUTME: Session state types for the type state pattern.
// ABOUTME: Each state owns exactly what the next transition needs.

use crate::shell::{Credentials, RemoteSession, Transporter};
use std::sync::Arc;

/// Endpoint described, transport chosen, nothing opened yet.
/// Available actions: `connect()`
#[derive(Debug)]
pub struct Configured {
    pub(super) credentials: Credentials,
    pub(super) transport: Arc<dyn Transporter>,
}

/// Authenticated session open on the remote side.
/// Available actions: `execute()`
pub struct Connected<R: RemoteSession> {
    pub(super) session: R,
}

/// Remote command finished and the session was released.
/// Available actions: `exit_code()`
#[derive(Debug, Clone, Copy)]
pub struct Completed {
    pub(super) exit_code: i32,
}
