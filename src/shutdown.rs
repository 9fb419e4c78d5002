//! Process-wide shutdown coordination.
//! The ctrlc handler sets a flag; workflows check it between plan entries so a
//! file is never abandoned half-copied.
//!
//! Relaxed atomics are sufficient for a one-way "stop" flag, and `request()` is
//! safe to call from a signal handler.

use std::sync::atomic::{AtomicBool, Ordering};

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Request a cooperative shutdown (idempotent).
#[inline]
pub fn request() {
    SHUTDOWN.store(true, Ordering::Relaxed);
}

/// Check whether a shutdown has been requested.
#[inline]
pub fn is_requested() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}

/// Test-only: clear the shutdown flag.
#[cfg(test)]
#[inline]
pub fn reset() {
    SHUTDOWN.store(false, Ordering::Relaxed);
}
