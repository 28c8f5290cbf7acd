//! Linux backend: `epoll_create1` for fd readiness, one `timerfd_create`
//! (`CLOCK_MONOTONIC`) per timer multiplexed into the same epoll set.

use std::collections::{HashMap, VecDeque};
use std::os::unix::io::RawFd;
use std::time::Duration;

use crate::{Interest, PollError, PollResult, Poller, TimerHandle};

/// High bit of an epoll event's `u64` data payload distinguishes a timer
/// registration from a plain fd registration; the low bits carry the fd or
/// the [`TimerHandle`].
const TIMER_TAG: u64 = 1 << 63;

struct TimerState {
    fd: RawFd,
    repeating: bool,
}

pub struct EpollPoller {
    epoll_fd: RawFd,
    fds: HashMap<RawFd, Interest>,
    timers: HashMap<TimerHandle, TimerState>,
    next_handle: TimerHandle,
    pending: VecDeque<PollResult>,
}

impl EpollPoller {
    /// # Errors
    ///
    /// Returns [`PollError::Io`] if `epoll_create1` fails.
    pub fn new() -> Result<Self, PollError> {
        let epoll_fd = unsafe { libc::epoll_create1(libc::EPOLL_CLOEXEC) };
        if epoll_fd < 0 {
            return Err(PollError::Io(std::io::Error::last_os_error()));
        }
        tracing::debug!(epoll_fd, "created epoll instance");
        Ok(EpollPoller {
            epoll_fd,
            fds: HashMap::new(),
            timers: HashMap::new(),
            next_handle: 1,
            pending: VecDeque::new(),
        })
    }

    fn epoll_ctl_fd(&self, op: libc::c_int, fd: RawFd, interest: Interest) -> Result<(), PollError> {
        let mut event = libc::epoll_event {
            events: interest_to_epoll_events(interest),
            u64: fd as u64,
        };
        let ret = unsafe { libc::epoll_ctl(self.epoll_fd, op, fd, &mut event) };
        if ret < 0 {
            return Err(PollError::Io(std::io::Error::last_os_error()));
        }
        Ok(())
    }

    fn arm_timerfd(fd: RawFd, interval: Duration, repeating: bool) -> Result<(), PollError> {
        let spec = libc::itimerspec {
            it_interval: if repeating {
                duration_to_timespec(interval)
            } else {
                duration_to_timespec(Duration::ZERO)
            },
            it_value: duration_to_timespec(interval),
        };
        let ret = unsafe { libc::timerfd_settime(fd, 0, &spec, std::ptr::null_mut()) };
        if ret < 0 {
            return Err(PollError::Io(std::io::Error::last_os_error()));
        }
        Ok(())
    }

    fn poll_round(&mut self, timeout_ms: i32) -> Result<(), PollError> {
        let mut events: [libc::epoll_event; 32] = unsafe { std::mem::zeroed() };
        let n = loop {
            let ret = unsafe {
                libc::epoll_wait(self.epoll_fd, events.as_mut_ptr(), events.len() as i32, timeout_ms)
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

        for event in &events[..n as usize] {
            if event.u64 & TIMER_TAG != 0 {
                let handle = event.u64 & !TIMER_TAG;
                if let Some(state) = self.timers.get(&handle) {
                    let expirations = read_timerfd_expirations(state.fd)?;
                    if expirations > 0 {
                        self.pending.push_back(PollResult::TimerExpired(handle, expirations));
                    }
                }
            } else {
                let fd = event.u64 as RawFd;
                if event.events & (libc::EPOLLERR | libc::EPOLLHUP) as u32 != 0 {
                    self.pending.push_back(PollResult::FdError(fd));
                } else {
                    if event.events & libc::EPOLLIN as u32 != 0 {
                        self.pending.push_back(PollResult::FdReadable(fd));
                    }
                    if event.events & libc::EPOLLOUT as u32 != 0 {
                        self.pending.push_back(PollResult::FdWritable(fd));
                    }
                }
            }
        }
        Ok(())
    }
}

impl Poller for EpollPoller {
    fn register_fd(&mut self, fd: RawFd, events: Interest) -> Result<(), PollError> {
        let op = if self.fds.contains_key(&fd) {
            libc::EPOLL_CTL_MOD
        } else {
            libc::EPOLL_CTL_ADD
        };
        match self.epoll_ctl_fd(op, fd, events) {
            Ok(()) => {}
            // Tolerate a lost-track re-registration: ADD may race an
            // unregister that never reached epoll, or vice versa.
            Err(PollError::Io(err))
                if op == libc::EPOLL_CTL_ADD
                    && err.raw_os_error() == Some(libc::EEXIST) =>
            {
                self.epoll_ctl_fd(libc::EPOLL_CTL_MOD, fd, events)?;
            }
            Err(e) => return Err(e),
        }
        self.fds.insert(fd, events);
        Ok(())
    }

    fn unregister_fd(&mut self, fd: RawFd) -> Result<(), PollError> {
        if self.fds.remove(&fd).is_some() {
            let ret = unsafe {
                libc::epoll_ctl(self.epoll_fd, libc::EPOLL_CTL_DEL, fd, std::ptr::null_mut())
            };
            if ret < 0 {
                let err = std::io::Error::last_os_error();
                if err.raw_os_error() != Some(libc::ENOENT) {
                    return Err(PollError::Io(err));
                }
            }
        }
        Ok(())
    }

    fn add_timer(&mut self, interval: Duration, repeating: bool) -> Result<TimerHandle, PollError> {
        let fd = unsafe { libc::timerfd_create(libc::CLOCK_MONOTONIC, libc::TFD_NONBLOCK) };
        if fd < 0 {
            return Err(PollError::Io(std::io::Error::last_os_error()));
        }
        Self::arm_timerfd(fd, interval, repeating)?;

        let handle = self.next_handle;
        self.next_handle += 1;

        let mut event = libc::epoll_event {
            events: libc::EPOLLIN as u32,
            u64: handle | TIMER_TAG,
        };
        let ret = unsafe { libc::epoll_ctl(self.epoll_fd, libc::EPOLL_CTL_ADD, fd, &mut event) };
        if ret < 0 {
            let err = std::io::Error::last_os_error();
            unsafe { libc::close(fd) };
            return Err(PollError::Io(err));
        }

        self.timers.insert(handle, TimerState { fd, repeating });
        Ok(handle)
    }

    fn modify_timer(
        &mut self,
        handle: TimerHandle,
        new_interval: Duration,
    ) -> Result<(), PollError> {
        let state = self
            .timers
            .get(&handle)
            .ok_or(PollError::InvalidHandle(handle))?;
        Self::arm_timerfd(state.fd, new_interval, state.repeating)
    }

    fn remove_timer(&mut self, handle: TimerHandle) -> Result<(), PollError> {
        if let Some(state) = self.timers.remove(&handle) {
            unsafe {
                libc::epoll_ctl(self.epoll_fd, libc::EPOLL_CTL_DEL, state.fd, std::ptr::null_mut());
                libc::close(state.fd);
            }
        }
        Ok(())
    }

    fn wait(&mut self) -> Result<PollResult, PollError> {
        if let Some(result) = self.pending.pop_front() {
            return Ok(result);
        }
        loop {
            self.poll_round(-1)?;
            if let Some(result) = self.pending.pop_front() {
                return Ok(result);
            }
        }
    }

    fn wait_timeout(&mut self, timeout: Duration) -> Result<Option<PollResult>, PollError> {
        if let Some(result) = self.pending.pop_front() {
            return Ok(Some(result));
        }
        let deadline = std::time::Instant::now() + timeout;
        loop {
            let now = std::time::Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            let remaining = deadline.saturating_duration_since(now);
            let timeout_ms = i32::try_from(remaining.as_millis()).unwrap_or(i32::MAX);
            self.poll_round(timeout_ms)?;
            if let Some(result) = self.pending.pop_front() {
                return Ok(Some(result));
            }
            if std::time::Instant::now() >= deadline {
                return Ok(None);
            }
        }
    }

    fn close(&mut self) -> Result<(), PollError> {
        for state in self.timers.values() {
            unsafe { libc::close(state.fd) };
        }
        self.timers.clear();
        self.fds.clear();
        self.pending.clear();
        if self.epoll_fd >= 0 {
            unsafe { libc::close(self.epoll_fd) };
            self.epoll_fd = -1;
        }
        Ok(())
    }
}

impl Drop for EpollPoller {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

fn interest_to_epoll_events(interest: Interest) -> u32 {
    let mut events = 0u32;
    if interest.readable {
        events |= libc::EPOLLIN as u32;
    }
    if interest.writable {
        events |= libc::EPOLLOUT as u32;
    }
    events
}

fn duration_to_timespec(d: Duration) -> libc::timespec {
    libc::timespec {
        tv_sec: d.as_secs() as libc::time_t,
        tv_nsec: libc::c_long::from(d.subsec_nanos()),
    }
}

fn read_timerfd_expirations(fd: RawFd) -> Result<u64, PollError> {
    let mut buf = [0u8; 8];
    let ret = unsafe { libc::read(fd, buf.as_mut_ptr().cast(), buf.len()) };
    if ret == 8 {
        Ok(u64::from_ne_bytes(buf))
    } else if ret < 0 {
        let err = std::io::Error::last_os_error();
        if matches!(
            err.raw_os_error(),
            Some(libc::EAGAIN) | Some(libc::EWOULDBLOCK)
        ) {
            Ok(0)
        } else {
            Err(PollError::Io(err))
        }
    } else {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_fires_once() {
        let mut poller = EpollPoller::new().unwrap();
        let handle = poller.add_timer(Duration::from_millis(15), false).unwrap();
        let result = poller.wait_timeout(Duration::from_millis(500)).unwrap();
        assert_eq!(result, Some(PollResult::TimerExpired(handle, 1)));
    }

    #[test]
    fn unregister_unknown_fd_is_noop() {
        let mut poller = EpollPoller::new().unwrap();
        assert!(poller.unregister_fd(999).is_ok());
    }

    #[test]
    fn modify_timer_unknown_handle_errors() {
        let mut poller = EpollPoller::new().unwrap();
        assert!(matches!(
            poller.modify_timer(42, Duration::from_millis(1)),
            Err(PollError::InvalidHandle(42))
        ));
    }

    #[test]
    fn re_registering_fd_does_not_accumulate() {
        let mut poller = EpollPoller::new().unwrap();
        let (r, w) = pipe();
        poller.register_fd(r, Interest::READABLE).unwrap();
        poller.register_fd(r, Interest::readable_writable()).unwrap();
        assert_eq!(poller.fds.len(), 1);
        poller.close().unwrap();
        unsafe {
            libc::close(r);
            libc::close(w);
        }
    }

    fn pipe() -> (RawFd, RawFd) {
        let mut fds = [0; 2];
        let ret = unsafe { libc::pipe(fds.as_mut_ptr()) };
        assert_eq!(ret, 0);
        (fds[0], fds[1])
    }
}
