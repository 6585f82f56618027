//! Cancellation token for operator interruption.
//!
//! The streaming loop polls the token once per input line; a signal
//! handler (or any other notifier thread) sets it. The token is
//! one-way: once requested, every subsequent session observes it and
//! teardown switches to the forced, non-draining queue exit.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared shutdown request flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownToken {
    flag: Arc<AtomicBool>,
}

impl ShutdownToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown. Safe to call from any thread, any number of
    /// times.
    #[inline]
    pub fn request(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Returns true once shutdown has been requested.
    #[inline]
    pub fn is_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
