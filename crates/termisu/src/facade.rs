//! The terminal facade contract: what the core needs from a real TTY, and
//! nothing more. Implementing this trait against an actual terminal (raw
//! fds + termios) lives outside this crate; termisu only defines the
//! contract and a fd-free test double.

use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Termios-style mode bits. `raw` clears everything; the named presets
    /// below cover the common combinations a terminal library needs.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ModeFlags: u32 {
        const NONE = 0;
        const CANONICAL = 1 << 0;
        const ECHO = 1 << 1;
        const SIGNALS = 1 << 2;
        const EXTENDED = 1 << 3;
        const FLOW_CONTROL = 1 << 4;
        const OUTPUT_PROCESSING = 1 << 5;
        const CR_TO_NL = 1 << 6;
    }
}

impl ModeFlags {
    /// No canonical processing, no echo, no signal generation: the mode a
    /// TUI application runs in.
    pub const RAW: ModeFlags = ModeFlags::NONE;
    /// Line-at-a-time signals without echo.
    pub const CBREAK: ModeFlags = ModeFlags::ECHO.union(ModeFlags::SIGNALS);
    /// The ordinary shell-prompt terminal mode.
    pub const COOKED: ModeFlags = ModeFlags::CANONICAL
        .union(ModeFlags::ECHO)
        .union(ModeFlags::SIGNALS)
        .union(ModeFlags::EXTENDED);
    /// Canonical input without echo, for password prompts.
    pub const PASSWORD: ModeFlags = ModeFlags::CANONICAL.union(ModeFlags::SIGNALS);
    /// Raw input but Ctrl-C/Ctrl-Z still generate signals.
    pub const SEMI_RAW: ModeFlags = ModeFlags::SIGNALS;
}

/// Begin-synchronized-update escape sequence (exact bytes).
pub const BSU: &[u8] = b"\x1b[?2026h";
/// End-synchronized-update escape sequence (exact bytes).
pub const ESU: &[u8] = b"\x1b[?2026l";

/// What the core requires from a terminal backend: writing output, reading
/// input, querying size, and switching termios-style modes.
pub trait Terminal {
    type Error: std::error::Error;

    /// Write raw bytes to the terminal's output stream.
    ///
    /// # Errors
    ///
    /// Returns `Self::Error` if the underlying write fails for a reason
    /// other than `EINTR` (which is retried internally).
    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Flush any buffered output.
    ///
    /// # Errors
    ///
    /// Returns `Self::Error` if the underlying flush fails.
    fn flush(&mut self) -> Result<(), Self::Error>;

    /// Current terminal size as `(columns, rows)`.
    ///
    /// # Errors
    ///
    /// Returns `Self::Error` if the size cannot be queried.
    fn size(&self) -> Result<(u16, u16), Self::Error>;

    /// Read up to `buf.len()` bytes of input, retrying on `EINTR`.
    /// Returns the number of bytes read.
    ///
    /// # Errors
    ///
    /// Returns `Self::Error` if the underlying read fails for a reason
    /// other than `EINTR`.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// The input file descriptor.
    fn infd(&self) -> i32;

    /// The output file descriptor.
    fn outfd(&self) -> i32;

    /// Switch to `mode`, returning the previously active mode.
    ///
    /// # Errors
    ///
    /// Returns `Self::Error` if the underlying mode switch fails.
    fn set_mode(&mut self, mode: ModeFlags) -> Result<ModeFlags, Self::Error>;

    /// The currently active mode.
    fn current_mode(&self) -> ModeFlags;

    /// Run `body` with `mode` active, restoring the previous mode on every
    /// exit path including a panic unwinding through `body`.
    ///
    /// # Errors
    ///
    /// Returns `Self::Error` if either mode switch fails. If switching into
    /// `mode` fails, `body` does not run and the mode is left unchanged.
    fn with_mode<T>(
        &mut self,
        mode: ModeFlags,
        body: impl FnOnce(&mut Self) -> T,
    ) -> Result<T, Self::Error> {
        let previous = self.set_mode(mode)?;
        struct RestoreGuard<'a, Term: Terminal + ?Sized> {
            term: &'a mut Term,
            previous: ModeFlags,
        }
        impl<Term: Terminal + ?Sized> Drop for RestoreGuard<'_, Term> {
            fn drop(&mut self) {
                let _ = self.term.set_mode(self.previous);
            }
        }
        let mut guard = RestoreGuard {
            term: self,
            previous,
        };
        let result = body(guard.term);
        drop(guard);
        Ok(result)
    }
}

/// A mode change observed by a caller, used by the mode-change event
/// variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeChange {
    pub mode: ModeFlags,
    pub previous: Option<ModeFlags>,
}

impl ModeChange {
    /// Whether this transition actually altered the active mode bits.
    #[must_use]
    pub fn changed(&self) -> bool {
        match self.previous {
            None => true,
            Some(previous) => previous != self.mode,
        }
    }
}

impl fmt::Display for ModeChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.previous {
            Some(previous) => write!(f, "{previous:?} -> {:?}", self.mode),
            None => write!(f, "(none) -> {:?}", self.mode),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn presets_match_spec() {
        assert_eq!(ModeFlags::RAW, ModeFlags::NONE);
        assert_eq!(ModeFlags::CBREAK, ModeFlags::ECHO | ModeFlags::SIGNALS);
        assert_eq!(
            ModeFlags::COOKED,
            ModeFlags::CANONICAL | ModeFlags::ECHO | ModeFlags::SIGNALS | ModeFlags::EXTENDED
        );
        assert_eq!(ModeFlags::PASSWORD, ModeFlags::CANONICAL | ModeFlags::SIGNALS);
        assert_eq!(ModeFlags::SEMI_RAW, ModeFlags::SIGNALS);
    }

    #[test]
    fn synchronized_update_sequences_are_exact() {
        assert_eq!(BSU, b"\x1b[?2026h");
        assert_eq!(ESU, b"\x1b[?2026l");
    }

    #[test]
    fn mode_change_without_previous_is_unchanged() {
        let change = ModeChange {
            mode: ModeFlags::NONE,
            previous: None,
        };
        assert!(!change.changed());
    }

    #[test]
    fn mode_change_to_different_mode_changed() {
        let change = ModeChange {
            mode: ModeFlags::ECHO,
            previous: Some(ModeFlags::NONE),
        };
        assert!(change.changed());
    }

    #[test]
    fn mode_change_to_same_mode_unchanged() {
        let change = ModeChange {
            mode: ModeFlags::SIGNALS,
            previous: Some(ModeFlags::SIGNALS),
        };
        assert!(!change.changed());
    }
}
