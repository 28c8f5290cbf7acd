use std::time::Duration;

use termisu_input::{KeyEvent, MouseEvent};

/// A single event delivered by the [`crate::EventLoop`].
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Key(KeyEvent),
    Mouse(MouseEvent),
    /// A terminal resize, carrying both the new and previous size so
    /// consumers can compute a delta without tracking it themselves.
    Resize {
        new_w: u16,
        new_h: u16,
        old_w: u16,
        old_h: u16,
    },
    /// A periodic tick from a timer source.
    Tick {
        elapsed_since_start: Duration,
        delta_since_last: Duration,
        frame_counter: u64,
        missed_ticks: u64,
    },
    /// The terminal's mode flags changed (see `termisu`'s mode bitset).
    ModeChange { old_mode: u8, new_mode: u8 },
}
