#![warn(clippy::pedantic)]

//! The double-buffered cell grid, its diff-based renderer, and the
//! render-state cache that elides redundant style escapes.

mod cache;
mod cell;
mod cursor;
mod grid;
mod renderer;
mod sink;

pub use cache::StyleCache;
pub use cell::Cell;
pub use cursor::{Cursor, HIDDEN};
pub use grid::CellGrid;
pub use renderer::{render_to, sync_to};
pub use sink::Sink;
