#![warn(clippy::pedantic)]

//! Color and attribute primitives shared by the grid, render-state cache,
//! and terminfo fallback tables.

use core::fmt;

use bitflags::bitflags;

/// A terminal color.
///
/// Value type; equality is by tag and payload. `Default` means "use the
/// terminal's configured default foreground/background", distinct from any
/// of the indexed or RGB variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    /// The terminal's default foreground or background.
    Default,
    /// One of the 8 basic ANSI colors (0..=7).
    Ansi8(u8),
    /// One of the 256 indexed colors (0..=255).
    Ansi256(u8),
    /// A 24-bit RGB color.
    Rgb(u8, u8, u8),
}

impl Default for Color {
    fn default() -> Self {
        Color::Default
    }
}

impl Color {
    /// Construct an [`Color::Ansi8`] color, validating the index is in
    /// `0..=7`.
    #[must_use]
    pub fn ansi8(index: u8) -> Option<Self> {
        (index <= 7).then_some(Color::Ansi8(index))
    }

    /// Construct an [`Color::Ansi256`] color. Every `u8` value is valid.
    #[must_use]
    pub fn ansi256(index: u8) -> Self {
        Color::Ansi256(index)
    }

    /// The 24-level grayscale ramp, mapping `0..=23` to ANSI-256 indices
    /// `232..=255`.
    #[must_use]
    pub fn gray(level: u8) -> Option<Self> {
        (level <= 23).then(|| Color::Ansi256(232 + level))
    }

    /// Parse a `#rgb` or `#rrggbb` hex color string.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if the string is empty, is not prefixed with
    /// `#`, contains non-hex digits, or has a length other than 3 or 6 hex
    /// digits.
    pub fn from_hex(s: &str) -> Result<Self, ParseError> {
        let digits = s.strip_prefix('#').ok_or(ParseError::UnknownFormat)?;
        if digits.is_empty() {
            return Err(ParseError::Empty);
        }
        match digits.len() {
            3 => {
                let r = hex_nibble(digits, 0)?;
                let g = hex_nibble(digits, 1)?;
                let b = hex_nibble(digits, 2)?;
                Ok(Color::Rgb(r * 17, g * 17, b * 17))
            }
            6 => {
                let r = hex_byte(digits, 0)?;
                let g = hex_byte(digits, 2)?;
                let b = hex_byte(digits, 4)?;
                Ok(Color::Rgb(r, g, b))
            }
            len => Err(ParseError::InvalidLength { len }),
        }
    }
}

fn hex_nibble(digits: &str, index: usize) -> Result<u8, ParseError> {
    let ch = digits.as_bytes()[index];
    (ch as char)
        .to_digit(16)
        .map(|v| v as u8)
        .ok_or(ParseError::InvalidHex { offset: index })
}

fn hex_byte(digits: &str, offset: usize) -> Result<u8, ParseError> {
    u8::from_str_radix(&digits[offset..offset + 2], 16)
        .map_err(|_| ParseError::InvalidHex { offset })
}

/// Error parsing a color specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The input is empty.
    Empty,
    /// The input did not start with `#`.
    UnknownFormat,
    /// An invalid hex digit was found at the given offset.
    InvalidHex { offset: usize },
    /// The number of hex digits was not 3 or 6.
    InvalidLength { len: usize },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Empty => write!(f, "empty color specification"),
            ParseError::UnknownFormat => write!(f, "color specification must start with '#'"),
            ParseError::InvalidHex { offset } => write!(f, "invalid hex digit at offset {offset}"),
            ParseError::InvalidLength { len } => {
                write!(f, "invalid hex color length: {len} (expected 3 or 6)")
            }
        }
    }
}

impl std::error::Error for ParseError {}

bitflags! {
    /// A set of character-cell rendition attributes.
    ///
    /// `Italic` and `Cursive` are aliases for the same bit: some terminfo
    /// databases call the capability `sitm`/`ritm` "italic", others treat it
    /// as the historic "cursive" mode. They are never distinguished.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Attribute: u8 {
        const BOLD          = 0b0000_0001;
        const UNDERLINE     = 0b0000_0010;
        const REVERSE       = 0b0000_0100;
        const BLINK         = 0b0000_1000;
        const DIM           = 0b0001_0000;
        const ITALIC        = 0b0010_0000;
        const CURSIVE       = 0b0010_0000;
        const HIDDEN        = 0b0100_0000;
        const STRIKETHROUGH = 0b1000_0000;
    }
}

impl Default for Attribute {
    fn default() -> Self {
        Attribute::empty()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn default_color_is_default() {
        assert_eq!(Color::default(), Color::Default);
    }

    #[test]
    fn ansi8_range() {
        assert_eq!(Color::ansi8(0), Some(Color::Ansi8(0)));
        assert_eq!(Color::ansi8(7), Some(Color::Ansi8(7)));
        assert_eq!(Color::ansi8(8), None);
    }

    #[test]
    fn gray_ramp_maps_into_ansi256() {
        assert_eq!(Color::gray(0), Some(Color::Ansi256(232)));
        assert_eq!(Color::gray(23), Some(Color::Ansi256(255)));
        assert_eq!(Color::gray(24), None);
    }

    #[test]
    fn hex_parses_short_and_long_forms() {
        assert_eq!(Color::from_hex("#fff").unwrap(), Color::Rgb(255, 255, 255));
        assert_eq!(Color::from_hex("#000").unwrap(), Color::Rgb(0, 0, 0));
        assert_eq!(
            Color::from_hex("#336699").unwrap(),
            Color::Rgb(0x33, 0x66, 0x99)
        );
    }

    #[test]
    fn hex_rejects_malformed_input() {
        assert_eq!(Color::from_hex(""), Err(ParseError::UnknownFormat));
        assert_eq!(Color::from_hex("#"), Err(ParseError::Empty));
        assert_eq!(
            Color::from_hex("#ff"),
            Err(ParseError::InvalidLength { len: 2 })
        );
        assert!(matches!(
            Color::from_hex("#zzzzzz"),
            Err(ParseError::InvalidHex { .. })
        ));
    }

    #[test]
    fn attribute_italic_cursive_alias() {
        assert_eq!(Attribute::ITALIC, Attribute::CURSIVE);
        let a = Attribute::ITALIC;
        assert!(a.contains(Attribute::CURSIVE));
    }

    #[test]
    fn attribute_default_is_empty() {
        assert!(Attribute::default().is_empty());
    }
}
