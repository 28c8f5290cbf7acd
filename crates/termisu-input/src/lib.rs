#![warn(clippy::pedantic)]

mod c0;
mod char;
mod csi;
pub mod encode;
mod engine;
mod esc;
pub mod event;
mod macros;
pub mod parser;
pub mod reader;
mod ss;
pub use encode::Encode;
pub use engine::{VTEvent, VTOwnedEvent};
pub use event::{
    KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers, KeyboardEnhancementFlags,
    MouseButton, MouseEvent, MouseEventKind, TerminalInputEvent, TerminalInputEventOwned,
    TerseDisplay,
};
pub use parser::TerminalInputParser;
pub use reader::InputReader;
