use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, SyncSender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::EventError;
use crate::event::Event;
use crate::source::EventSource;

/// Default bound on the event channel (spec §4.10): a full channel
/// blocks the producing source rather than growing without limit.
pub const DEFAULT_CAPACITY: usize = 32;

/// Owns the event channel and the set of running [`EventSource`]s that
/// feed it.
///
/// Sources are started in `start()` and stopped in `stop()`; a source
/// added after `start()` has already run is started immediately, and one
/// removed while running is stopped immediately. The channel closes
/// exactly once, when every sender (the loop's own retained clone, plus
/// one per running source) has been dropped.
pub struct EventLoop {
    sender: Mutex<Option<SyncSender<Event>>>,
    receiver: Mutex<Receiver<Event>>,
    sources: Mutex<Vec<Arc<dyn EventSource>>>,
    running: AtomicBool,
    closed: AtomicBool,
}

impl EventLoop {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = std::sync::mpsc::sync_channel(capacity.max(1));
        EventLoop {
            sender: Mutex::new(Some(sender)),
            receiver: Mutex::new(receiver),
            sources: Mutex::new(Vec::new()),
            running: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }

    /// Register a source. If the loop is already running, the source is
    /// started immediately.
    ///
    /// # Errors
    ///
    /// Propagates the source's `start` error if the loop is running.
    pub fn add_source(&self, source: Arc<dyn EventSource>) -> Result<(), EventError> {
        if self.running.load(Ordering::SeqCst) {
            let sender = self.cloned_sender()?;
            source.start(sender)?;
        }
        self.sources.lock().unwrap().push(source);
        Ok(())
    }

    /// Stop and drop a source by name. A no-op if no source with that
    /// name is registered.
    pub fn remove_source(&self, name: &str) {
        let mut sources = self.sources.lock().unwrap();
        if let Some(pos) = sources.iter().position(|s| s.name() == name) {
            let source = sources.remove(pos);
            source.stop();
        }
    }

    /// Start every registered source.
    ///
    /// # Errors
    ///
    /// Propagates the first source's `start` error; sources started
    /// before the failing one keep running.
    pub fn start(&self) -> Result<(), EventError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let sources = self.sources.lock().unwrap();
        for source in sources.iter() {
            let sender = self.cloned_sender()?;
            source.start(sender)?;
            tracing::debug!(source = source.name(), "event source started");
        }
        Ok(())
    }

    /// Stop every source and close the channel. Idempotent: a second
    /// call is a no-op.
    pub fn stop(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.running.store(false, Ordering::SeqCst);
        for source in self.sources.lock().unwrap().iter() {
            source.stop();
        }
        self.sender.lock().unwrap().take();
        tracing::debug!("event loop closed");
    }

    /// Block for the next event.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::ChannelClosed`] once every source has
    /// stopped and no event is pending.
    pub fn recv(&self) -> Result<Event, EventError> {
        self.receiver
            .lock()
            .unwrap()
            .recv()
            .map_err(|_| EventError::ChannelClosed)
    }

    /// Wait up to `timeout` for the next event; `Ok(None)` on timeout.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::ChannelClosed`] once every source has
    /// stopped and no event is pending.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<Event>, EventError> {
        match self.receiver.lock().unwrap().recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(EventError::ChannelClosed),
        }
    }

    /// Non-blocking poll for a pending event.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::ChannelClosed`] once every source has
    /// stopped and no event is pending.
    pub fn try_recv(&self) -> Result<Option<Event>, EventError> {
        match self.receiver.lock().unwrap().try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(EventError::ChannelClosed),
        }
    }

    fn cloned_sender(&self) -> Result<SyncSender<Event>, EventError> {
        self.sender
            .lock()
            .unwrap()
            .clone()
            .ok_or(EventError::ChannelClosed)
    }
}

impl Drop for EventLoop {
    fn drop(&mut self) {
        self.stop();
    }
}
