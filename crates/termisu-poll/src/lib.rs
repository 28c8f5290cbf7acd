#![warn(clippy::pedantic)]

//! Unified fd-readiness and timer multiplexer.
//!
//! [`Poller`] is implemented by three backends: [`epoll::EpollPoller`] on
//! Linux, [`kqueue::KqueuePoller`] on the BSDs/macOS, and the portable
//! [`fallback::FallbackPoller`] built on `poll()` and software timers. The
//! platform default is exposed as [`SystemPoller`]; callers that want the
//! portable backend explicitly (tests, or a platform termisu doesn't special
//! case) can construct [`fallback::FallbackPoller`] directly.

use std::fmt;
use std::os::unix::io::RawFd;
use std::time::Duration;

#[cfg(target_os = "linux")]
pub mod epoll;
pub mod fallback;
#[cfg(any(
    target_os = "macos",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "dragonfly"
))]
pub mod kqueue;

/// Opaque timer identifier, unique within the [`Poller`] that issued it.
pub type TimerHandle = u64;

/// Readiness interest for a registered file descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Interest {
    pub readable: bool,
    pub writable: bool,
}

impl Interest {
    pub const READABLE: Interest = Interest {
        readable: true,
        writable: false,
    };
    pub const WRITABLE: Interest = Interest {
        readable: false,
        writable: true,
    };

    #[must_use]
    pub const fn readable_writable() -> Self {
        Interest {
            readable: true,
            writable: true,
        }
    }
}

/// A single readiness or timer event reported by [`Poller::wait`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollResult {
    FdReadable(RawFd),
    FdWritable(RawFd),
    FdError(RawFd),
    /// A timer fired `expirations` times since it was last observed.
    TimerExpired(TimerHandle, u64),
}

/// Error conditions a [`Poller`] implementation can report.
#[derive(Debug)]
pub enum PollError {
    InvalidArgument(&'static str),
    InvalidHandle(TimerHandle),
    Io(std::io::Error),
}

impl fmt::Display for PollError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollError::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            PollError::InvalidHandle(handle) => write!(f, "unknown timer handle {handle}"),
            PollError::Io(err) => write!(f, "poller I/O error: {err}"),
        }
    }
}

impl std::error::Error for PollError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PollError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PollError {
    fn from(err: std::io::Error) -> Self {
        PollError::Io(err)
    }
}

/// Common contract shared by all three backends (spec §4.8).
///
/// `register_fd` and `unregister_fd` are idempotent: re-registering an fd
/// with a different [`Interest`] replaces the prior registration rather
/// than accumulating filters or failing with "already exists". Timer
/// methods address timers by the opaque [`TimerHandle`] returned from
/// `add_timer`; `modify_timer`/`remove_timer` on an unknown handle is an
/// error for `modify_timer` and a no-op for `remove_timer`.
pub trait Poller {
    /// Register (or re-register) interest in a file descriptor.
    fn register_fd(&mut self, fd: RawFd, events: Interest) -> Result<(), PollError>;

    /// Remove a file descriptor's registration. Unknown fds are a no-op.
    fn unregister_fd(&mut self, fd: RawFd) -> Result<(), PollError>;

    /// Install a timer, firing once after `interval` and then, if
    /// `repeating`, every `interval` thereafter.
    fn add_timer(&mut self, interval: Duration, repeating: bool) -> Result<TimerHandle, PollError>;

    /// Change a timer's interval in place. Errors with
    /// [`PollError::InvalidHandle`] for an unknown handle.
    fn modify_timer(&mut self, handle: TimerHandle, new_interval: Duration)
    -> Result<(), PollError>;

    /// Remove a timer. Unknown handles are a no-op.
    fn remove_timer(&mut self, handle: TimerHandle) -> Result<(), PollError>;

    /// Block indefinitely for the next event.
    fn wait(&mut self) -> Result<PollResult, PollError>;

    /// Block for at most `timeout`, returning `None` if nothing became
    /// ready in that window.
    fn wait_timeout(&mut self, timeout: Duration) -> Result<Option<PollResult>, PollError>;

    /// Release all fds and timer state. Idempotent.
    fn close(&mut self) -> Result<(), PollError>;
}

#[cfg(target_os = "linux")]
pub type SystemPoller = epoll::EpollPoller;

#[cfg(any(
    target_os = "macos",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "dragonfly"
))]
pub type SystemPoller = kqueue::KqueuePoller;

#[cfg(not(any(
    target_os = "linux",
    target_os = "macos",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "dragonfly"
)))]
pub type SystemPoller = fallback::FallbackPoller;

/// Construct the platform-preferred backend.
///
/// # Errors
///
/// Returns whatever error the underlying backend's constructor produces
/// (e.g. `epoll_create1` or `kqueue` failing).
pub fn new_system_poller() -> Result<SystemPoller, PollError> {
    SystemPoller::new()
}
