use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::SyncSender;
use std::sync::{Arc, Mutex, Once};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::error::EventError;
use crate::event::Event;
use crate::source::{EventSource, RunGuard};

static SIGWINCH_SEEN: AtomicBool = AtomicBool::new(false);
static SIGWINCH_INIT: Once = Once::new();

extern "C" fn handle_sigwinch(_signum: libc::c_int) {
    SIGWINCH_SEEN.store(true, Ordering::SeqCst);
}

fn install_sigwinch_handler() {
    SIGWINCH_INIT.call_once(|| unsafe {
        libc::signal(libc::SIGWINCH, handle_sigwinch as usize);
    });
}

/// A terminal size query, typically an ioctl(`TIOCGWINSZ`) wrapper owned
/// by the caller.
pub type SizeProvider = Arc<dyn Fn() -> (u16, u16) + Send + Sync>;

/// Watches for terminal resizes.
///
/// Installs a process-wide `SIGWINCH` handler that only flips an atomic
/// flag (signal-handler safe), then polls `size_provider` from a
/// background thread at `poll_interval`. The provider is re-queried on
/// every tick regardless of whether the flag fired, since a resize that
/// races the signal's delivery would otherwise be missed until the next
/// one; `SIGWINCH_SEEN` exists to let that loop skip most of the
/// sleep-cycle latency rather than to gate whether it looks at all.
pub struct ResizeSource {
    guard: Arc<RunGuard>,
    handle: Mutex<Option<JoinHandle<()>>>,
    size_provider: SizeProvider,
    poll_interval: Duration,
    last_size: Arc<Mutex<(u16, u16)>>,
}

impl ResizeSource {
    #[must_use]
    pub fn new(size_provider: SizeProvider, initial_size: (u16, u16)) -> Self {
        install_sigwinch_handler();
        ResizeSource {
            guard: Arc::new(RunGuard::new()),
            handle: Mutex::new(None),
            size_provider,
            poll_interval: Duration::from_millis(100),
            last_size: Arc::new(Mutex::new(initial_size)),
        }
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn run(
        guard: Arc<RunGuard>,
        generation: u64,
        size_provider: SizeProvider,
        last_size: Arc<Mutex<(u16, u16)>>,
        poll_interval: Duration,
        sender: SyncSender<Event>,
    ) {
        while guard.is_running() && guard.current_generation() == generation {
            std::thread::sleep(poll_interval);
            SIGWINCH_SEEN.swap(false, Ordering::SeqCst);

            let (new_w, new_h) = size_provider();
            let mut last = last_size.lock().unwrap();
            let (old_w, old_h) = *last;
            if (new_w, new_h) != (old_w, old_h) {
                *last = (new_w, new_h);
                drop(last);
                if sender
                    .send(Event::Resize { new_w, new_h, old_w, old_h })
                    .is_err()
                {
                    break;
                }
            }
        }
    }
}

impl EventSource for ResizeSource {
    fn name(&self) -> &'static str {
        "resize"
    }

    fn start(&self, sender: SyncSender<Event>) -> Result<(), EventError> {
        let Some(generation) = self.guard.try_start() else {
            return Err(EventError::AlreadyRunning(self.name()));
        };
        let guard = Arc::clone(&self.guard);
        let size_provider = Arc::clone(&self.size_provider);
        let last_size = Arc::clone(&self.last_size);
        let poll_interval = self.poll_interval;
        let handle = std::thread::Builder::new()
            .name("termisu-resize".into())
            .spawn(move || ResizeSource::run(guard, generation, size_provider, last_size, poll_interval, sender))
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
