#![warn(clippy::pedantic)]

//! Top-level façade for the termisu TUI core: the terminal contract the
//! rest of the library runs against, termios-style mode flags, and
//! re-exports of the sub-crates that make up the rest of the stack.

pub mod facade;
pub mod null_terminal;
mod traits;

pub use crate::facade::{ModeChange, ModeFlags, Terminal, BSU, ESU};
pub use crate::null_terminal::NullTerminal;
pub use crate::traits::TerseDisplay;

pub use termisu_color as color;
pub use termisu_event as event;
pub use termisu_grid as grid;
pub use termisu_input as input;
pub use termisu_poll as poll;
pub use termisu_terminfo as terminfo;
