//! BSD/macOS backend: one `kqueue()` fd multiplexing both fd readiness
//! filters and `EVFILT_TIMER` timers.

use std::collections::{HashMap, VecDeque};
use std::os::unix::io::RawFd;
use std::time::Duration;

use crate::{Interest, PollError, PollResult, Poller, TimerHandle};

pub struct KqueuePoller {
    kq: RawFd,
    fds: HashMap<RawFd, Interest>,
    timers: HashMap<TimerHandle, bool>,
    next_handle: TimerHandle,
    pending: VecDeque<PollResult>,
}

impl KqueuePoller {
    /// # Errors
    ///
    /// Returns [`PollError::Io`] if `kqueue()` fails.
    pub fn new() -> Result<Self, PollError> {
        let kq = unsafe { libc::kqueue() };
        if kq < 0 {
            return Err(PollError::Io(std::io::Error::last_os_error()));
        }
        Ok(KqueuePoller {
            kq,
            fds: HashMap::new(),
            timers: HashMap::new(),
            next_handle: 1,
            pending: VecDeque::new(),
        })
    }

    fn submit(&self, changes: &mut [libc::kevent]) -> Result<(), PollError> {
        if changes.is_empty() {
            return Ok(());
        }
        let ret = unsafe {
            libc::kevent(
                self.kq,
                changes.as_ptr(),
                changes.len() as i32,
                std::ptr::null_mut(),
                0,
                std::ptr::null(),
            )
        };
        if ret < 0 {
            return Err(PollError::Io(std::io::Error::last_os_error()));
        }
        Ok(())
    }

    fn poll_round(&mut self, timeout_ms: i32) -> Result<(), PollError> {
        let timeout = if timeout_ms < 0 {
            None
        } else {
            Some(libc::timespec {
                tv_sec: (timeout_ms / 1000) as libc::time_t,
                tv_nsec: libc::c_long::from((timeout_ms % 1000) * 1_000_000),
            })
        };
        let timeout_ptr = timeout
            .as_ref()
            .map_or(std::ptr::null(), |t| t as *const libc::timespec);

        let mut events: [libc::kevent; 32] = unsafe { std::mem::zeroed() };
        let n = loop {
            let ret = unsafe {
                libc::kevent(
                    self.kq,
                    std::ptr::null(),
                    0,
                    events.as_mut_ptr(),
                    events.len() as i32,
                    timeout_ptr,
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

        for event in &events[..n as usize] {
            match event.filter {
                libc::EVFILT_READ => {
                    let fd = event.ident as RawFd;
                    if event.flags & libc::EV_ERROR != 0 {
                        self.pending.push_back(PollResult::FdError(fd));
                    } else {
                        self.pending.push_back(PollResult::FdReadable(fd));
                    }
                }
                libc::EVFILT_WRITE => {
                    let fd = event.ident as RawFd;
                    if event.flags & libc::EV_ERROR != 0 {
                        self.pending.push_back(PollResult::FdError(fd));
                    } else {
                        self.pending.push_back(PollResult::FdWritable(fd));
                    }
                }
                libc::EVFILT_TIMER => {
                    let handle = event.ident as TimerHandle;
                    let expirations = (event.data as u64).max(1);
                    self.pending.push_back(PollResult::TimerExpired(handle, expirations));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

impl Poller for KqueuePoller {
    fn register_fd(&mut self, fd: RawFd, events: Interest) -> Result<(), PollError> {
        // Delete any existing filters first so a narrower re-registration
        // does not leave a stale read or write filter armed.
        let mut deletes = vec![
            kevent_new(fd as usize, libc::EVFILT_READ, libc::EV_DELETE, 0),
            kevent_new(fd as usize, libc::EVFILT_WRITE, libc::EV_DELETE, 0),
        ];
        // ENOENT on delete-of-nonexistent is expected; kqueue reports it
        // per-change via EV_ERROR rather than failing the whole submit, but
        // the simplest portable approach is to submit deletes and ignore
        // failures, then submit adds separately.
        let _ = self.submit(&mut deletes);

        let mut adds = Vec::new();
        if events.readable {
            adds.push(kevent_new(fd as usize, libc::EVFILT_READ, libc::EV_ADD, 0));
        }
        if events.writable {
            adds.push(kevent_new(fd as usize, libc::EVFILT_WRITE, libc::EV_ADD, 0));
        }
        self.submit(&mut adds)?;
        self.fds.insert(fd, events);
        Ok(())
    }

    fn unregister_fd(&mut self, fd: RawFd) -> Result<(), PollError> {
        if self.fds.remove(&fd).is_some() {
            let mut deletes = vec![
                kevent_new(fd as usize, libc::EVFILT_READ, libc::EV_DELETE, 0),
                kevent_new(fd as usize, libc::EVFILT_WRITE, libc::EV_DELETE, 0),
            ];
            let _ = self.submit(&mut deletes);
        }
        Ok(())
    }

    fn add_timer(&mut self, interval: Duration, repeating: bool) -> Result<TimerHandle, PollError> {
        let handle = self.next_handle;
        self.next_handle += 1;
        let flags = if repeating {
            libc::EV_ADD
        } else {
            libc::EV_ADD | libc::EV_ONESHOT
        };
        let ms = i64::try_from(interval.as_millis()).unwrap_or(i64::MAX);
        let mut changes = vec![kevent_new(handle as usize, libc::EVFILT_TIMER, flags, ms)];
        self.submit(&mut changes)?;
        self.timers.insert(handle, repeating);
        Ok(handle)
    }

    fn modify_timer(
        &mut self,
        handle: TimerHandle,
        new_interval: Duration,
    ) -> Result<(), PollError> {
        let repeating = *self
            .timers
            .get(&handle)
            .ok_or(PollError::InvalidHandle(handle))?;
        let flags = if repeating {
            libc::EV_ADD
        } else {
            libc::EV_ADD | libc::EV_ONESHOT
        };
        let ms = i64::try_from(new_interval.as_millis()).unwrap_or(i64::MAX);
        let mut changes = vec![kevent_new(handle as usize, libc::EVFILT_TIMER, flags, ms)];
        self.submit(&mut changes)
    }

    fn remove_timer(&mut self, handle: TimerHandle) -> Result<(), PollError> {
        if self.timers.remove(&handle).is_some() {
            let mut changes = vec![kevent_new(handle as usize, libc::EVFILT_TIMER, libc::EV_DELETE, 0)];
            let _ = self.submit(&mut changes);
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
        self.fds.clear();
        self.timers.clear();
        self.pending.clear();
        if self.kq >= 0 {
            unsafe { libc::close(self.kq) };
            self.kq = -1;
        }
        Ok(())
    }
}

impl Drop for KqueuePoller {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

fn kevent_new(ident: usize, filter: i16, flags: u16, data: i64) -> libc::kevent {
    libc::kevent {
        ident: ident as libc::uintptr_t,
        filter,
        flags,
        fflags: 0,
        data: data as libc::intptr_t,
        udata: std::ptr::null_mut(),
    }
}
