use termisu_color::{Attribute, Color};

/// A single character cell: a scalar value plus the style it is drawn
/// with. The default cell is a space, white-on-default, with no
/// attributes set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: Color,
    pub bg: Color,
    pub attrs: Attribute,
}

impl Default for Cell {
    fn default() -> Self {
        Cell {
            ch: ' ',
            fg: Color::Ansi8(7),
            bg: Color::Default,
            attrs: Attribute::empty(),
        }
    }
}

impl Cell {
    #[must_use]
    pub fn new(ch: char, fg: Color, bg: Color, attrs: Attribute) -> Self {
        Cell { ch, fg, bg, attrs }
    }

    /// The effective style triple used for run-coalescing comparisons.
    #[must_use]
    pub fn style(&self) -> (Color, Color, Attribute) {
        (self.fg, self.bg, self.attrs)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn default_cell_matches_spec() {
        let cell = Cell::default();
        assert_eq!(cell.ch, ' ');
        assert_eq!(cell.fg, Color::Ansi8(7));
        assert_eq!(cell.bg, Color::Default);
        assert_eq!(cell.attrs, Attribute::empty());
    }
}
