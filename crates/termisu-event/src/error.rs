use std::fmt;

/// Errors from event sources and the event loop.
#[derive(Debug)]
pub enum EventError {
    /// The event channel's receiver has been dropped.
    ChannelClosed,
    /// `start` was called on a source that is already running.
    AlreadyRunning(&'static str),
    /// A signal handler could not be installed.
    Signal(std::io::Error),
    Poll(termisu_poll::PollError),
    Io(std::io::Error),
}

impl fmt::Display for EventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventError::ChannelClosed => write!(f, "event channel is closed"),
            EventError::AlreadyRunning(name) => write!(f, "event source '{name}' is already running"),
            EventError::Signal(err) => write!(f, "failed to install signal handler: {err}"),
            EventError::Poll(err) => write!(f, "poller error: {err}"),
            EventError::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for EventError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EventError::Signal(err) | EventError::Io(err) => Some(err),
            EventError::Poll(err) => Some(err),
            _ => None,
        }
    }
}

impl From<termisu_poll::PollError> for EventError {
    fn from(err: termisu_poll::PollError) -> Self {
        EventError::Poll(err)
    }
}

impl From<std::io::Error> for EventError {
    fn from(err: std::io::Error) -> Self {
        EventError::Io(err)
    }
}

impl<T> From<std::sync::mpsc::SendError<T>> for EventError {
    fn from(_: std::sync::mpsc::SendError<T>) -> Self {
        EventError::ChannelClosed
    }
}
