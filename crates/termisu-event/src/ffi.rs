//! Bit-exact `#[repr(C)]` mirrors of the wire-level `Color`, `CellStyle`,
//! `Size`, and `Event` shapes from the external FFI boundary (§6). The
//! actual FFI crate/C header is out of scope here; these types exist so the
//! layout can be asserted at compile time and hashed once at
//! [`crate::EventLoop::new`] against drift in the field table below.

use std::mem::size_of;
use std::time::Duration;

use termisu_color::Color;
use termisu_input::{KeyCode, MouseButton, MouseEventKind};

use crate::event::Event;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorFfi {
    pub mode: u8,
    _pad0: [u8; 3],
    pub index: i32,
    pub r: u8,
    pub g: u8,
    pub b: u8,
    _pad1: u8,
}

const _: () = assert!(size_of::<ColorFfi>() == 12);

impl From<Color> for ColorFfi {
    fn from(color: Color) -> Self {
        match color {
            Color::Default => ColorFfi {
                mode: 0,
                _pad0: [0; 3],
                index: 0,
                r: 0,
                g: 0,
                b: 0,
                _pad1: 0,
            },
            Color::Ansi8(i) => ColorFfi {
                mode: 1,
                _pad0: [0; 3],
                index: i32::from(i),
                r: 0,
                g: 0,
                b: 0,
                _pad1: 0,
            },
            Color::Ansi256(i) => ColorFfi {
                mode: 2,
                _pad0: [0; 3],
                index: i32::from(i),
                r: 0,
                g: 0,
                b: 0,
                _pad1: 0,
            },
            Color::Rgb(r, g, b) => ColorFfi {
                mode: 3,
                _pad0: [0; 3],
                index: 0,
                r,
                g,
                b,
                _pad1: 0,
            },
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellStyleFfi {
    pub fg: ColorFfi,
    pub bg: ColorFfi,
    pub attr: u16,
}

const _: () = assert!(size_of::<CellStyleFfi>() == 28);

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeFfi {
    pub w: i32,
    pub h: i32,
}

const _: () = assert!(size_of::<SizeFfi>() == 8);

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPayloadFfi {
    /// 0 = printable char, 1 = named key, 2 = function key `F(n)`.
    pub code_tag: u8,
    _pad: [u8; 3],
    pub codepoint: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MousePayloadFfi {
    pub kind: u8,
    pub button: u8,
    pub x: u16,
    pub y: u16,
    _pad: [u8; 2],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizePayloadFfi {
    pub new_w: i32,
    pub new_h: i32,
    pub old_w: i32,
    pub old_h: i32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickPayloadFfi {
    pub elapsed_ms: u64,
    pub delta_ms: u64,
    pub frame_counter: u64,
    pub missed_ticks: u64,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeChangePayloadFfi {
    pub old_mode: u32,
    pub new_mode: u32,
}

const PAYLOAD_SIZE: usize = 92;

#[repr(C)]
#[derive(Clone, Copy)]
pub union EventPayloadFfi {
    pub key: KeyPayloadFfi,
    pub mouse: MousePayloadFfi,
    pub resize: ResizePayloadFfi,
    pub tick: TickPayloadFfi,
    pub mode_change: ModeChangePayloadFfi,
    pub raw: [u8; PAYLOAD_SIZE],
}

const _: () = assert!(size_of::<EventPayloadFfi>() == PAYLOAD_SIZE);

/// Event discriminants, matching `event_type` at offset 0.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTag {
    Key = 0,
    Mouse = 1,
    Resize = 2,
    Tick = 3,
    ModeChange = 4,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct EventFfi {
    pub event_type: u8,
    pub modifiers: u8,
    _pad: [u8; 2],
    pub payload: EventPayloadFfi,
}

const _: () = assert!(size_of::<EventFfi>() == 96);

impl From<&Event> for EventFfi {
    fn from(event: &Event) -> Self {
        match event {
            Event::Key(key) => {
                let (tag, codepoint) = keycode_to_ffi(&key.code);
                EventFfi {
                    event_type: EventTag::Key as u8,
                    modifiers: key.modifiers.bits(),
                    _pad: [0; 2],
                    payload: EventPayloadFfi {
                        key: KeyPayloadFfi {
                            code_tag: tag,
                            _pad: [0; 3],
                            codepoint,
                        },
                    },
                }
            }
            Event::Mouse(mouse) => EventFfi {
                event_type: EventTag::Mouse as u8,
                modifiers: mouse.modifiers.bits(),
                _pad: [0; 2],
                payload: EventPayloadFfi {
                    mouse: MousePayloadFfi {
                        kind: mouse_kind_tag(&mouse.kind),
                        button: mouse_button_code(&mouse.kind),
                        x: mouse.column,
                        y: mouse.row,
                        _pad: [0; 2],
                    },
                },
            },
            Event::Resize {
                new_w,
                new_h,
                old_w,
                old_h,
            } => EventFfi {
                event_type: EventTag::Resize as u8,
                modifiers: 0,
                _pad: [0; 2],
                payload: EventPayloadFfi {
                    resize: ResizePayloadFfi {
                        new_w: i32::from(*new_w),
                        new_h: i32::from(*new_h),
                        old_w: i32::from(*old_w),
                        old_h: i32::from(*old_h),
                    },
                },
            },
            Event::Tick {
                elapsed_since_start,
                delta_since_last,
                frame_counter,
                missed_ticks,
            } => EventFfi {
                event_type: EventTag::Tick as u8,
                modifiers: 0,
                _pad: [0; 2],
                payload: EventPayloadFfi {
                    tick: TickPayloadFfi {
                        elapsed_ms: duration_to_millis(*elapsed_since_start),
                        delta_ms: duration_to_millis(*delta_since_last),
                        frame_counter: *frame_counter,
                        missed_ticks: *missed_ticks,
                    },
                },
            },
            Event::ModeChange { old_mode, new_mode } => EventFfi {
                event_type: EventTag::ModeChange as u8,
                modifiers: 0,
                _pad: [0; 2],
                payload: EventPayloadFfi {
                    mode_change: ModeChangePayloadFfi {
                        old_mode: u32::from(*old_mode),
                        new_mode: u32::from(*new_mode),
                    },
                },
            },
        }
    }
}

fn duration_to_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// `(code_tag, codepoint)` for the wire [`KeyPayloadFfi`]. Named keys with
/// no natural codepoint get a small fixed ordinal; anything not in the
/// table (the enhanced-keyboard-only keys) maps to ordinal 0.
fn keycode_to_ffi(code: &KeyCode) -> (u8, u32) {
    match code {
        KeyCode::Char(c) => (0, *c as u32),
        KeyCode::F(n) => (2, u32::from(*n)),
        other => (1, named_key_ordinal(other)),
    }
}

fn named_key_ordinal(code: &KeyCode) -> u32 {
    match code {
        KeyCode::Backspace => 1,
        KeyCode::Enter => 2,
        KeyCode::Left => 3,
        KeyCode::Right => 4,
        KeyCode::Up => 5,
        KeyCode::Down => 6,
        KeyCode::Home => 7,
        KeyCode::End => 8,
        KeyCode::PageUp => 9,
        KeyCode::PageDown => 10,
        KeyCode::Tab => 11,
        KeyCode::BackTab => 12,
        KeyCode::Delete => 13,
        KeyCode::Insert => 14,
        KeyCode::Null => 15,
        KeyCode::Esc => 16,
        _ => 0,
    }
}

fn mouse_kind_tag(kind: &MouseEventKind) -> u8 {
    match kind {
        MouseEventKind::Down(_) => 0,
        MouseEventKind::Up(_) => 1,
        MouseEventKind::Drag(_) => 2,
        MouseEventKind::Moved => 3,
        MouseEventKind::ScrollDown => 4,
        MouseEventKind::ScrollUp => 5,
        MouseEventKind::ScrollLeft => 6,
        MouseEventKind::ScrollRight => 7,
    }
}

fn mouse_button_code(kind: &MouseEventKind) -> u8 {
    match kind {
        MouseEventKind::Down(button) | MouseEventKind::Up(button) | MouseEventKind::Drag(button) => {
            match button {
                MouseButton::Left => 0,
                MouseButton::Right => 1,
                MouseButton::Middle => 2,
            }
        }
        _ => 0xFF,
    }
}

/// `(field name, byte offset, byte size)` descriptor table for [`EventFfi`],
/// hand-maintained alongside the struct definition. [`layout_signature`]
/// hashes this table; a struct edit that forgets to update it silently
/// stops affecting the signature, so the `const _` size assertions above
/// remain the authoritative check — the signature is a convenience
/// fingerprint for detecting drift across builds, not a substitute for them.
const LAYOUT_FIELDS: &[(&str, usize, usize)] = &[
    ("event_type", 0, 1),
    ("modifiers", 1, 1),
    ("payload", 4, PAYLOAD_SIZE),
];

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

const fn fnv1a_str(mut hash: u64, s: &str) -> u64 {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

const fn fnv1a_u64(mut hash: u64, value: u64) -> u64 {
    let bytes = value.to_le_bytes();
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

const fn compute_layout_signature() -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    let mut i = 0;
    while i < LAYOUT_FIELDS.len() {
        let (name, offset, size) = LAYOUT_FIELDS[i];
        hash = fnv1a_str(hash, name);
        hash = fnv1a_u64(hash, offset as u64);
        hash = fnv1a_u64(hash, size as u64);
        i += 1;
    }
    hash
}

/// FNV-1a hash of [`LAYOUT_FIELDS`], computed at compile time.
pub const LAYOUT_SIGNATURE: u64 = compute_layout_signature();

/// Returns [`LAYOUT_SIGNATURE`]. Kept as a function (rather than having
/// callers reach for the const directly) so the check reads the same way
/// whether the signature ends up precomputed or, one day, recomputed from
/// reflection.
#[must_use]
pub const fn layout_signature() -> u64 {
    LAYOUT_SIGNATURE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_match_spec() {
        assert_eq!(size_of::<ColorFfi>(), 12);
        assert_eq!(size_of::<CellStyleFfi>(), 28);
        assert_eq!(size_of::<SizeFfi>(), 8);
        assert_eq!(size_of::<EventFfi>(), 96);
    }

    #[test]
    fn signature_is_deterministic() {
        assert_eq!(layout_signature(), layout_signature());
        assert_ne!(layout_signature(), 0);
    }

    #[test]
    fn resize_event_converts() {
        let event = Event::Resize {
            new_w: 80,
            new_h: 24,
            old_w: 80,
            old_h: 25,
        };
        let ffi = EventFfi::from(&event);
        assert_eq!(ffi.event_type, EventTag::Resize as u8);
        let resize = unsafe { ffi.payload.resize };
        assert_eq!(resize.new_h, 24);
        assert_eq!(resize.old_h, 25);
    }
}
