//! Buffered, EINTR-safe input reader over a raw file descriptor.
//!
//! Owns a fixed-capacity ring buffer so the sequence parser can peek/consume
//! bytes one at a time without a syscall per byte. Readiness is checked with
//! a `select()` bitmask below [`FD_SETSIZE`] and a single-fd `poll()` at or
//! above it, matching the kernel's own limit on `select`'s fd_set.

use std::io;
use std::os::unix::io::RawFd;
use std::time::{Duration, Instant};

/// The kernel's `select()` fd_set limit; at or above this, readiness must
/// be checked with `poll()` instead.
const FD_SETSIZE: usize = 1024;

const BUF_CAPACITY: usize = 4096;

/// Hard cap on EINTR retries inside a single fill, to prevent a live-lock
/// under a signal storm.
const MAX_FILL_RETRIES: u32 = 100;

/// A buffered reader over a terminal input fd.
pub struct InputReader {
    fd: RawFd,
    buf: [u8; BUF_CAPACITY],
    head: usize,
    len: usize,
}

impl InputReader {
    #[must_use]
    pub fn new(fd: RawFd) -> Self {
        InputReader {
            fd,
            buf: [0; BUF_CAPACITY],
            head: 0,
            len: 0,
        }
    }

    #[must_use]
    pub fn fd(&self) -> RawFd {
        self.fd
    }

    /// Consume and return the next buffered byte, filling from the fd if
    /// the buffer is empty. `Ok(None)` means end-of-file.
    ///
    /// # Errors
    ///
    /// Returns the underlying `read(2)` error, other than EINTR (retried
    /// internally) and EAGAIN/EWOULDBLOCK (treated as "no data yet").
    pub fn read_byte(&mut self) -> io::Result<Option<u8>> {
        if self.len == 0 {
            self.fill()?;
            if self.len == 0 {
                return Ok(None);
            }
        }
        Ok(Some(self.pop_front()))
    }

    /// Look at the next buffered byte without consuming it.
    ///
    /// # Errors
    ///
    /// Same as [`InputReader::read_byte`].
    pub fn peek_byte(&mut self) -> io::Result<Option<u8>> {
        if self.len == 0 {
            self.fill()?;
            if self.len == 0 {
                return Ok(None);
            }
        }
        Ok(Some(self.buf[self.head]))
    }

    /// Read up to `n` bytes, filling from the fd as needed. Returns fewer
    /// than `n` bytes only at end-of-file.
    ///
    /// # Errors
    ///
    /// Same as [`InputReader::read_byte`].
    pub fn read_bytes(&mut self, n: usize) -> io::Result<Vec<u8>> {
        while self.len < n && self.len < BUF_CAPACITY {
            if self.fill()? == 0 {
                break;
            }
        }
        let take = n.min(self.len);
        let mut out = Vec::with_capacity(take);
        for _ in 0..take {
            out.push(self.pop_front());
        }
        Ok(out)
    }

    /// True if there is buffered data, or the fd is readable right now.
    ///
    /// # Errors
    ///
    /// Propagates readiness-check I/O errors.
    pub fn available(&mut self) -> io::Result<bool> {
        if self.len > 0 {
            return Ok(true);
        }
        wait_readable(self.fd, Some(0))
    }

    /// Wait up to `timeout_ms` for data to become available. A negative
    /// timeout waits indefinitely.
    ///
    /// # Errors
    ///
    /// Propagates readiness-check I/O errors.
    pub fn wait_for_data(&mut self, timeout_ms: i64) -> io::Result<bool> {
        if self.len > 0 {
            return Ok(true);
        }
        let timeout = if timeout_ms < 0 {
            None
        } else {
            Some(timeout_ms)
        };
        wait_readable(self.fd, timeout)
    }

    fn pop_front(&mut self) -> u8 {
        let byte = self.buf[self.head];
        self.head = (self.head + 1) % BUF_CAPACITY;
        self.len -= 1;
        byte
    }

    /// Perform one `read(2)` into the buffer's free space, retrying EINTR
    /// up to [`MAX_FILL_RETRIES`] times. Returns the number of bytes read;
    /// `0` means end-of-file (or the retry cap was hit).
    fn fill(&mut self) -> io::Result<usize> {
        if self.len == BUF_CAPACITY {
            return Ok(0);
        }
        let tail = (self.head + self.len) % BUF_CAPACITY;
        let chunk_len = if tail >= self.head {
            BUF_CAPACITY - tail
        } else {
            self.head - tail
        };

        let mut retries = 0;
        loop {
            let n = unsafe {
                libc::read(
                    self.fd,
                    self.buf[tail..tail + chunk_len].as_mut_ptr().cast(),
                    chunk_len,
                )
            };
            if n >= 0 {
                self.len += n as usize;
                return Ok(n as usize);
            }
            let err = io::Error::last_os_error();
            match err.kind() {
                io::ErrorKind::Interrupted => {
                    retries += 1;
                    if retries >= MAX_FILL_RETRIES {
                        return Ok(0);
                    }
                }
                io::ErrorKind::WouldBlock => return Ok(0),
                _ => return Err(err),
            }
        }
    }
}

fn wait_readable(fd: RawFd, timeout_ms: Option<i64>) -> io::Result<bool> {
    let deadline = timeout_ms.map(|ms| Instant::now() + Duration::from_millis(ms.max(0) as u64));
    loop {
        let remaining_ms = match deadline {
            Some(d) => {
                let now = Instant::now();
                if now >= d {
                    return Ok(false);
                }
                Some(d.saturating_duration_since(now).as_millis() as i64)
            }
            None => None,
        };

        let ready = if (fd as usize) < FD_SETSIZE {
            select_readable(fd, remaining_ms)?
        } else {
            poll_readable(fd, remaining_ms)?
        };

        match ready {
            Some(ready) => return Ok(ready),
            None => continue,
        }
    }
}

/// `select()`-based readiness check for fds below [`FD_SETSIZE`].
/// `Ok(None)` signals EINTR (caller retries with a recomputed timeout).
fn select_readable(fd: RawFd, timeout_ms: Option<i64>) -> io::Result<Option<bool>> {
    let mut read_fds: libc::fd_set = unsafe { std::mem::zeroed() };
    unsafe {
        libc::FD_ZERO(&mut read_fds);
        libc::FD_SET(fd, &mut read_fds);
    }

    let mut tv;
    let tv_ptr = match timeout_ms {
        Some(ms) => {
            tv = libc::timeval {
                tv_sec: (ms / 1000) as libc::time_t,
                tv_usec: ((ms % 1000) * 1000) as libc::suseconds_t,
            };
            std::ptr::addr_of_mut!(tv)
        }
        None => std::ptr::null_mut(),
    };

    let ret = unsafe {
        libc::select(
            fd + 1,
            &mut read_fds,
            std::ptr::null_mut(),
            std::ptr::null_mut(),
            tv_ptr,
        )
    };

    if ret < 0 {
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::Interrupted {
            return Ok(None);
        }
        return Err(err);
    }
    if ret == 0 {
        return Ok(Some(false));
    }
    Ok(Some(unsafe { libc::FD_ISSET(fd, &read_fds) }))
}

/// Single-fd `poll()` fallback for fds at or above [`FD_SETSIZE`].
/// `Ok(None)` signals EINTR (caller retries with a recomputed timeout).
fn poll_readable(fd: RawFd, timeout_ms: Option<i64>) -> io::Result<Option<bool>> {
    let mut pfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    let timeout = timeout_ms.map_or(-1, |ms| i32::try_from(ms).unwrap_or(i32::MAX));

    let ret = unsafe { libc::poll(&mut pfd, 1, timeout) };
    if ret < 0 {
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::Interrupted {
            return Ok(None);
        }
        return Err(err);
    }
    Ok(Some(ret > 0 && pfd.revents & libc::POLLIN != 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipe() -> (RawFd, RawFd) {
        let mut fds = [0; 2];
        let ret = unsafe { libc::pipe(fds.as_mut_ptr()) };
        assert_eq!(ret, 0);
        (fds[0], fds[1])
    }

    fn write_all(fd: RawFd, data: &[u8]) {
        let ret = unsafe { libc::write(fd, data.as_ptr().cast(), data.len()) };
        assert_eq!(ret as usize, data.len());
    }

    #[test]
    fn reads_bytes_written_to_pipe() {
        let (r, w) = pipe();
        write_all(w, b"hello");
        let mut reader = InputReader::new(r);
        assert_eq!(reader.read_byte().unwrap(), Some(b'h'));
        assert_eq!(reader.read_bytes(4).unwrap(), b"ello");
        unsafe {
            libc::close(w);
            libc::close(r);
        }
    }

    #[test]
    fn peek_does_not_consume() {
        let (r, w) = pipe();
        write_all(w, b"x");
        let mut reader = InputReader::new(r);
        assert_eq!(reader.peek_byte().unwrap(), Some(b'x'));
        assert_eq!(reader.peek_byte().unwrap(), Some(b'x'));
        assert_eq!(reader.read_byte().unwrap(), Some(b'x'));
        unsafe {
            libc::close(w);
            libc::close(r);
        }
    }

    #[test]
    fn closed_write_end_surfaces_as_eof() {
        let (r, w) = pipe();
        unsafe { libc::close(w) };
        let mut reader = InputReader::new(r);
        assert_eq!(reader.read_byte().unwrap(), None);
        unsafe { libc::close(r) };
    }

    #[test]
    fn available_is_false_on_empty_pipe() {
        let (r, w) = pipe();
        let mut reader = InputReader::new(r);
        assert!(!reader.available().unwrap());
        unsafe {
            libc::close(w);
            libc::close(r);
        }
    }

    #[test]
    fn wait_for_data_sees_pending_write() {
        let (r, w) = pipe();
        write_all(w, b"y");
        let mut reader = InputReader::new(r);
        assert!(reader.wait_for_data(50).unwrap());
        unsafe {
            libc::close(w);
            libc::close(r);
        }
    }
}
