// ABOUTME: Sealed trait pattern for the auth transport capability.
// ABOUTME: Keeps the set of transports closed to the two this crate knows how to present.

/// Sealed trait to prevent external implementations.
pub trait Sealed {}
