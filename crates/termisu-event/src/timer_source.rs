use std::sync::mpsc::SyncSender;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use termisu_poll::{new_system_poller, PollResult, Poller, SystemPoller};

use crate::error::EventError;
use crate::event::Event;
use crate::source::{EventSource, RunGuard};

/// Emits [`Event::Tick`] at a fixed interval.
///
/// [`TimerSource::sleep_based`] drives ticks with `std::thread::sleep` and
/// needs no platform resources; [`TimerSource::poller_backed`] instead
/// arms a timer on a [`termisu_poll::Poller`], which is more precise under
/// load since the kernel (not a user-space sleep) tracks the deadline.
pub struct TimerSource {
    guard: Arc<RunGuard>,
    handle: Mutex<Option<JoinHandle<()>>>,
    interval: Duration,
    backend: Backend,
}

enum Backend {
    Sleep,
    Poller,
}

impl TimerSource {
    #[must_use]
    pub fn sleep_based(interval: Duration) -> Self {
        TimerSource {
            guard: Arc::new(RunGuard::new()),
            handle: Mutex::new(None),
            interval,
            backend: Backend::Sleep,
        }
    }

    #[must_use]
    pub fn poller_backed(interval: Duration) -> Self {
        TimerSource {
            guard: Arc::new(RunGuard::new()),
            handle: Mutex::new(None),
            interval,
            backend: Backend::Poller,
        }
    }

    fn run_sleep(guard: Arc<RunGuard>, generation: u64, interval: Duration, sender: SyncSender<Event>) {
        let start = Instant::now();
        let mut next_deadline = start + interval;
        let mut frame_counter: u64 = 0;
        let mut last_tick = start;

        while guard.is_running() && guard.current_generation() == generation {
            let now = Instant::now();
            if now < next_deadline {
                std::thread::sleep(next_deadline - now);
            }
            if !guard.is_running() || guard.current_generation() != generation {
                break;
            }

            let now = Instant::now();
            let overdue = now.saturating_duration_since(next_deadline);
            let missed_ticks = (overdue.as_nanos() / interval.as_nanos().max(1)) as u64;
            frame_counter += 1;
            let elapsed_since_start = now.saturating_duration_since(start);
            let delta_since_last = now.saturating_duration_since(last_tick);
            last_tick = now;
            next_deadline += interval * u32::try_from(missed_ticks + 1).unwrap_or(u32::MAX);

            if sender
                .send(Event::Tick {
                    elapsed_since_start,
                    delta_since_last,
                    frame_counter,
                    missed_ticks,
                })
                .is_err()
            {
                break;
            }
        }
    }

    fn run_poller(guard: Arc<RunGuard>, generation: u64, interval: Duration, sender: SyncSender<Event>) {
        let mut poller: SystemPoller = match new_system_poller() {
            Ok(poller) => poller,
            Err(_) => return,
        };
        let handle = match poller.add_timer(interval, true) {
            Ok(handle) => handle,
            Err(_) => return,
        };

        let start = Instant::now();
        let mut frame_counter: u64 = 0;
        let mut last_tick = start;

        while guard.is_running() && guard.current_generation() == generation {
            match poller.wait_timeout(Duration::from_millis(200)) {
                Ok(Some(PollResult::TimerExpired(fired, expirations))) if fired == handle => {
                    let now = Instant::now();
                    frame_counter += 1;
                    let elapsed_since_start = now.saturating_duration_since(start);
                    let delta_since_last = now.saturating_duration_since(last_tick);
                    last_tick = now;
                    let missed_ticks = expirations.saturating_sub(1);

                    if sender
                        .send(Event::Tick {
                            elapsed_since_start,
                            delta_since_last,
                            frame_counter,
                            missed_ticks,
                        })
                        .is_err()
                    {
                        break;
                    }
                }
                Ok(_) => continue,
                Err(_) => break,
            }
        }

        let _ = poller.close();
    }
}

impl EventSource for TimerSource {
    fn name(&self) -> &'static str {
        "timer"
    }

    fn start(&self, sender: SyncSender<Event>) -> Result<(), EventError> {
        let Some(generation) = self.guard.try_start() else {
            return Err(EventError::AlreadyRunning(self.name()));
        };
        let guard = Arc::clone(&self.guard);
        let interval = self.interval;
        let backend = match self.backend {
            Backend::Sleep => Self::run_sleep,
            Backend::Poller => Self::run_poller,
        };
        let handle = std::thread::Builder::new()
            .name("termisu-timer".into())
            .spawn(move || backend(guard, generation, interval, sender))
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_guard_rejects_double_start() {
        let guard = RunGuard::new();
        assert!(guard.try_start().is_some());
        assert!(guard.try_start().is_none());
        guard.stop();
        assert!(guard.try_start().is_some());
    }
}
