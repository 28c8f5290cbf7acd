//! An fd-free [`Terminal`] implementation for tests: bookkeeps mode and a
//! fixed size, records written bytes, never touches a real TTY.

use std::convert::Infallible;

use crate::facade::{ModeFlags, Terminal};

/// A terminal double that never allocates an fd and never fails. Not a
/// real TTY backend: `set_mode` only records the requested mode, it does
/// not perform any termios negotiation.
#[derive(Debug, Default)]
pub struct NullTerminal {
    pub written: Vec<u8>,
    flushes: usize,
    size: (u16, u16),
    mode: ModeFlags,
}

impl NullTerminal {
    #[must_use]
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            written: Vec::new(),
            flushes: 0,
            size: (cols, rows),
            mode: ModeFlags::NONE,
        }
    }

    #[must_use]
    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    pub fn set_size(&mut self, cols: u16, rows: u16) {
        self.size = (cols, rows);
    }
}

impl Terminal for NullTerminal {
    type Error = Infallible;

    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.written.extend_from_slice(bytes);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.flushes += 1;
        Ok(())
    }

    fn size(&self) -> Result<(u16, u16), Self::Error> {
        Ok(self.size)
    }

    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, Self::Error> {
        Ok(0)
    }

    fn infd(&self) -> i32 {
        -1
    }

    fn outfd(&self) -> i32 {
        -1
    }

    fn set_mode(&mut self, mode: ModeFlags) -> Result<ModeFlags, Self::Error> {
        let previous = self.mode;
        self.mode = mode;
        Ok(previous)
    }

    fn current_mode(&self) -> ModeFlags {
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn records_writes_and_flushes() {
        let mut term = NullTerminal::new(80, 24);
        term.write(b"hello").unwrap();
        term.flush().unwrap();
        assert_eq!(term.written, b"hello");
        assert_eq!(term.flush_count(), 1);
    }

    #[test]
    fn with_mode_restores_on_normal_exit() {
        let mut term = NullTerminal::new(80, 24);
        term.set_mode(ModeFlags::COOKED).unwrap();
        term.with_mode(ModeFlags::RAW, |t| {
            assert_eq!(t.current_mode(), ModeFlags::RAW);
        })
        .unwrap();
        assert_eq!(term.current_mode(), ModeFlags::COOKED);
    }

    #[test]
    fn with_mode_restores_on_panic() {
        let mut term = NullTerminal::new(80, 24);
        term.set_mode(ModeFlags::COOKED).unwrap();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            term.with_mode(ModeFlags::RAW, |_| panic!("boom")).unwrap();
        }));
        assert!(result.is_err());
        assert_eq!(term.current_mode(), ModeFlags::COOKED);
    }
}
