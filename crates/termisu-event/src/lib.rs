#![warn(clippy::pedantic)]

//! Unified event type, event sources, and the event loop that multiplexes
//! them onto one channel.
//!
//! [`Event`] is the single type every source ([`InputSource`],
//! [`ResizeSource`], [`TimerSource`]) feeds into an [`EventLoop`]. [`ffi`]
//! exposes a `#[repr(C)]` mirror of [`Event`] for embedders that need a
//! stable wire layout across an FFI boundary.

mod error;
mod event;
pub mod ffi;
mod event_loop;
mod input_source;
mod resize_source;
mod source;
mod timer_source;

pub use error::EventError;
pub use event::Event;
pub use event_loop::{EventLoop, DEFAULT_CAPACITY};
pub use input_source::InputSource;
pub use resize_source::{ResizeSource, SizeProvider};
pub use source::EventSource;
pub use timer_source::TimerSource;
