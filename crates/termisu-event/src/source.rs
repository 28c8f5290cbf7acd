use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::SyncSender;

use crate::error::EventError;
use crate::event::Event;

/// Common lifecycle shared by the input, resize, and timer sources (spec
/// §4.9): `start`/`stop` are idempotent via atomic compare-and-set, and
/// both tolerate the event loop's channel having been dropped.
pub trait EventSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// # Errors
    ///
    /// Returns [`EventError::AlreadyRunning`] if already started.
    fn start(&self, sender: SyncSender<Event>) -> Result<(), EventError>;

    fn stop(&self);

    fn running(&self) -> bool;
}

/// Atomic start/stop guard shared by every source implementation.
pub(crate) struct RunGuard {
    running: AtomicBool,
    generation: std::sync::atomic::AtomicU64,
}

impl RunGuard {
    pub(crate) fn new() -> Self {
        RunGuard {
            running: AtomicBool::new(false),
            generation: std::sync::atomic::AtomicU64::new(0),
        }
    }

    /// Attempt to transition not-running -> running. Returns the
    /// generation the caller's background task should tag itself with, or
    /// `None` if already running.
    pub(crate) fn try_start(&self) -> Option<u64> {
        self.running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()?;
        Some(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Idempotent stop; a second call is a no-op.
    pub(crate) fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub(crate) fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}
