//! Portable `poll()` + software-timer backend.
//!
//! Used on platforms without a native epoll/kqueue backend, and directly by
//! tests that want deterministic behavior independent of the platform
//! default. The defining correctness property is that a caller-supplied
//! timeout is a wall-clock deadline: [`FallbackPoller::wait_timeout`] must
//! return `Ok(None)` by that deadline even while timers are pending.

use std::collections::VecDeque;
use std::os::unix::io::RawFd;
use std::time::{Duration, Instant};

use crate::{Interest, PollError, PollResult, Poller, TimerHandle};

struct TimerEntry {
    interval: Duration,
    repeating: bool,
    next_deadline: Instant,
    removed: bool,
}

pub struct FallbackPoller {
    fds: Vec<(RawFd, Interest)>,
    timers: Vec<(TimerHandle, TimerEntry)>,
    next_handle: TimerHandle,
    pending: VecDeque<PollResult>,
}

impl FallbackPoller {
    /// # Errors
    ///
    /// Never actually fails; returns `Result` to match the other backends'
    /// constructors, which can fail on `epoll_create1`/`kqueue`.
    pub fn new() -> Result<Self, PollError> {
        Ok(FallbackPoller {
            fds: Vec::new(),
            timers: Vec::new(),
            next_handle: 1,
            pending: VecDeque::new(),
        })
    }

    fn earliest_deadline(&self) -> Option<Instant> {
        self.timers
            .iter()
            .filter(|(_, t)| !t.removed)
            .map(|(_, t)| t.next_deadline)
            .min()
    }

    /// Advance any timers due by `now`, queuing one [`PollResult`] per
    /// expired timer. Returns true if at least one timer fired.
    fn drain_due_timers(&mut self, now: Instant) -> bool {
        let mut fired = false;
        for (handle, timer) in &mut self.timers {
            if timer.removed || now < timer.next_deadline {
                continue;
            }
            let overdue = now.saturating_duration_since(timer.next_deadline);
            let extra_intervals = if timer.interval.is_zero() {
                0
            } else {
                (overdue.as_nanos() / timer.interval.as_nanos().max(1)) as u64
            };
            let expirations = extra_intervals.max(1);
            if timer.repeating {
                timer.next_deadline += timer.interval * u32::try_from(expirations).unwrap_or(u32::MAX);
            } else {
                timer.removed = true;
            }
            self.pending.push_back(PollResult::TimerExpired(*handle, expirations));
            fired = true;
        }
        fired
    }

    /// Run one `poll()` call (retrying on EINTR), queuing any readiness and
    /// timer events it produces into `self.pending`. `timeout_ms` of `-1`
    /// blocks indefinitely; the EINTR retry loop recomputes nothing here —
    /// callers that care about a wall-clock deadline recompute the timeout
    /// themselves between rounds.
    fn poll_round(&mut self, timeout_ms: i32) -> Result<(), PollError> {
        if self.fds.is_empty() {
            if timeout_ms < 0 {
                std::thread::sleep(Duration::from_secs(3600));
            } else {
                std::thread::sleep(Duration::from_millis(timeout_ms as u64));
            }
        } else {
            let mut pollfds: Vec<libc::pollfd> = self
                .fds
                .iter()
                .map(|(fd, interest)| libc::pollfd {
                    fd: *fd,
                    events: interest_to_events(*interest),
                    revents: 0,
                })
                .collect();

            let ret = loop {
                let ret = unsafe {
                    libc::poll(
                        pollfds.as_mut_ptr(),
                        pollfds.len() as libc::nfds_t,
                        timeout_ms,
                    )
                };
                if ret >= 0 {
                    break ret;
                }
                let err = std::io::Error::last_os_error();
                if err.kind() == std::io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(PollError::Io(err));
            };

            if ret > 0 {
                for pfd in &pollfds {
                    if pfd.revents == 0 {
                        continue;
                    }
                    if pfd.revents & (libc::POLLERR | libc::POLLHUP | libc::POLLNVAL) != 0 {
                        self.pending.push_back(PollResult::FdError(pfd.fd));
                    } else {
                        if pfd.revents & libc::POLLIN != 0 {
                            self.pending.push_back(PollResult::FdReadable(pfd.fd));
                        }
                        if pfd.revents & libc::POLLOUT != 0 {
                            self.pending.push_back(PollResult::FdWritable(pfd.fd));
                        }
                    }
                }
            }
        }

        self.drain_due_timers(Instant::now());
        Ok(())
    }
}

fn interest_to_events(interest: Interest) -> libc::c_short {
    let mut events = 0;
    if interest.readable {
        events |= libc::POLLIN;
    }
    if interest.writable {
        events |= libc::POLLOUT;
    }
    events as libc::c_short
}

impl Poller for FallbackPoller {
    fn register_fd(&mut self, fd: RawFd, events: Interest) -> Result<(), PollError> {
        if let Some(entry) = self.fds.iter_mut().find(|(existing, _)| *existing == fd) {
            entry.1 = events;
        } else {
            self.fds.push((fd, events));
        }
        Ok(())
    }

    fn unregister_fd(&mut self, fd: RawFd) -> Result<(), PollError> {
        self.fds.retain(|(existing, _)| *existing != fd);
        Ok(())
    }

    fn add_timer(&mut self, interval: Duration, repeating: bool) -> Result<TimerHandle, PollError> {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.timers.push((
            handle,
            TimerEntry {
                interval,
                repeating,
                next_deadline: Instant::now() + interval,
                removed: false,
            },
        ));
        Ok(handle)
    }

    fn modify_timer(
        &mut self,
        handle: TimerHandle,
        new_interval: Duration,
    ) -> Result<(), PollError> {
        let (_, timer) = self
            .timers
            .iter_mut()
            .find(|(h, t)| *h == handle && !t.removed)
            .ok_or(PollError::InvalidHandle(handle))?;
        timer.interval = new_interval;
        timer.next_deadline = Instant::now() + new_interval;
        Ok(())
    }

    fn remove_timer(&mut self, handle: TimerHandle) -> Result<(), PollError> {
        if let Some((_, timer)) = self.timers.iter_mut().find(|(h, _)| *h == handle) {
            timer.removed = true;
        }
        Ok(())
    }

    fn wait(&mut self) -> Result<PollResult, PollError> {
        if let Some(result) = self.pending.pop_front() {
            return Ok(result);
        }
        loop {
            let now = Instant::now();
            let time_to_timer = self.earliest_deadline().map(|d| d.saturating_duration_since(now));
            let timeout_ms = time_to_timer.map_or(-1, duration_to_poll_ms);
            self.poll_round(timeout_ms)?;
            if let Some(result) = self.pending.pop_front() {
                return Ok(result);
            }
        }
    }

    fn wait_timeout(&mut self, timeout: Duration) -> Result<Option<PollResult>, PollError> {
        if let Some(result) = self.pending.pop_front() {
            return Ok(Some(result));
        }

        let deadline = Instant::now() + timeout;
        loop {
            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            let remaining_user = deadline.saturating_duration_since(now);
            let time_to_timer = self
                .earliest_deadline()
                .map(|d| d.saturating_duration_since(now));

            let effective = match time_to_timer {
                Some(t) => remaining_user.min(t),
                None => remaining_user,
            };
            self.poll_round(duration_to_poll_ms(effective))?;

            if let Some(result) = self.pending.pop_front() {
                return Ok(Some(result));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
        }
    }

    fn close(&mut self) -> Result<(), PollError> {
        self.fds.clear();
        self.timers.clear();
        self.pending.clear();
        Ok(())
    }
}

fn duration_to_poll_ms(d: Duration) -> i32 {
    let ms = d.as_millis();
    if ms > i32::MAX as u128 {
        i32::MAX
    } else {
        ms as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_fires_after_interval() {
        let mut poller = FallbackPoller::new().unwrap();
        let handle = poller.add_timer(Duration::from_millis(20), false).unwrap();
        let result = poller.wait_timeout(Duration::from_millis(200)).unwrap();
        assert_eq!(result, Some(PollResult::TimerExpired(handle, 1)));
    }

    #[test]
    fn deadline_is_respected_with_pending_timer() {
        let mut poller = FallbackPoller::new().unwrap();
        poller.add_timer(Duration::from_secs(10), true).unwrap();
        let start = Instant::now();
        let result = poller.wait_timeout(Duration::from_millis(30)).unwrap();
        assert_eq!(result, None);
        assert!(start.elapsed() < Duration::from_millis(300));
    }

    #[test]
    fn remove_timer_is_idempotent() {
        let mut poller = FallbackPoller::new().unwrap();
        let handle = poller.add_timer(Duration::from_millis(50), false).unwrap();
        poller.remove_timer(handle).unwrap();
        poller.remove_timer(handle).unwrap();
        let result = poller.wait_timeout(Duration::from_millis(80)).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn modify_timer_unknown_handle_errors() {
        let mut poller = FallbackPoller::new().unwrap();
        let err = poller.modify_timer(9999, Duration::from_millis(5));
        assert!(matches!(err, Err(PollError::InvalidHandle(9999))));
    }

    #[test]
    fn unregister_unknown_fd_is_noop() {
        let mut poller = FallbackPoller::new().unwrap();
        assert!(poller.unregister_fd(42).is_ok());
    }

    #[test]
    fn register_fd_replaces_interest() {
        let mut poller = FallbackPoller::new().unwrap();
        poller.register_fd(0, Interest::READABLE).unwrap();
        poller.register_fd(0, Interest::WRITABLE).unwrap();
        assert_eq!(poller.fds.len(), 1);
        assert_eq!(poller.fds[0].1, Interest::WRITABLE);
    }
}
