use std::os::unix::io::RawFd;
use std::sync::mpsc::SyncSender;
use std::sync::Arc;
use std::thread::JoinHandle;

use termisu_input::{InputReader, TerminalInputEvent, TerminalInputParser};

use crate::error::EventError;
use crate::event::Event;
use crate::source::{EventSource, RunGuard};

/// Drives the escape-sequence parser over a terminal input fd on a
/// background thread, forwarding key and mouse events to the loop's
/// channel.
pub struct InputSource {
    fd: RawFd,
    guard: Arc<RunGuard>,
    handle: std::sync::Mutex<Option<JoinHandle<()>>>,
    poll_timeout_ms: i64,
}

impl InputSource {
    #[must_use]
    pub fn new(fd: RawFd) -> Self {
        InputSource {
            fd,
            guard: Arc::new(RunGuard::new()),
            handle: std::sync::Mutex::new(None),
            poll_timeout_ms: 100,
        }
    }

    fn run(fd: RawFd, guard: Arc<RunGuard>, generation: u64, sender: SyncSender<Event>, poll_timeout_ms: i64) {
        let mut reader = InputReader::new(fd);
        let mut parser = TerminalInputParser::new();

        while guard.is_running() && guard.current_generation() == generation {
            let ready = match reader.wait_for_data(poll_timeout_ms) {
                Ok(ready) => ready,
                Err(_) => break,
            };
            if !ready {
                continue;
            }

            let bytes = match reader.read_bytes(4096) {
                Ok(bytes) if !bytes.is_empty() => bytes,
                Ok(_) => continue,
                Err(_) => break,
            };

            let mut send_err = false;
            parser.feed_with(&bytes, &mut |vt_event: TerminalInputEvent<'_>| {
                if send_err {
                    return;
                }
                let mapped = match vt_event {
                    TerminalInputEvent::Key(key) => Some(Event::Key(key)),
                    TerminalInputEvent::Mouse(mouse) => Some(Event::Mouse(mouse)),
                    _ => None,
                };
                if let Some(event) = mapped {
                    if sender.send(event).is_err() {
                        send_err = true;
                    }
                }
            });
            if send_err {
                break;
            }
        }
    }
}

impl EventSource for InputSource {
    fn name(&self) -> &'static str {
        "input"
    }

    fn start(&self, sender: SyncSender<Event>) -> Result<(), EventError> {
        let Some(generation) = self.guard.try_start() else {
            return Err(EventError::AlreadyRunning(self.name()));
        };
        let fd = self.fd;
        let guard = Arc::clone(&self.guard);
        let poll_timeout_ms = self.poll_timeout_ms;
        let handle = std::thread::Builder::new()
            .name("termisu-input".into())
            .spawn(move || InputSource::run(fd, guard, generation, sender, poll_timeout_ms))
            .map_err(EventError::Io)?;
        *self.handle.lock().unwrap() = Some(handle);
        Ok(())
    }

    fn stop(&self) {
        self.guard.stop();
        if let Some(handle) = self.handle.lock().unwrap().take() {
            let _ = handle.join();
        }
    }

    fn running(&self) -> bool {
        self.guard.is_running()
    }
}
