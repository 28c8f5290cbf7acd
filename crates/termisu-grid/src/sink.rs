use termisu_color::{Attribute, Color};

/// What the diff renderer needs from a terminal backend (or a mock, in
/// tests). Both the real `termisu` facade and test doubles implement this
/// so the renderer is testable without a TTY.
pub trait Sink {
    type Error: std::error::Error;

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error>;
    fn move_cursor(&mut self, x: u16, y: u16) -> Result<(), Self::Error>;
    fn set_foreground(&mut self, color: Color) -> Result<(), Self::Error>;
    fn set_background(&mut self, color: Color) -> Result<(), Self::Error>;
    fn set_attributes(&mut self, attrs: Attribute) -> Result<(), Self::Error>;
    /// Reset all rendition to the terminal default.
    fn reset_style(&mut self) -> Result<(), Self::Error>;
    fn set_cursor_visible(&mut self, visible: bool) -> Result<(), Self::Error>;
    fn begin_sync(&mut self) -> Result<(), Self::Error>;
    fn end_sync(&mut self) -> Result<(), Self::Error>;
    fn flush(&mut self) -> Result<(), Self::Error>;
}
