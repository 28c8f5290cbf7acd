use termisu_color::{Attribute, Color};

use crate::sink::Sink;

/// Wraps a [`Sink`], memoizing the last-set foreground, background,
/// attribute mask, and cursor visibility so repeated identical style
/// writes become no-ops.
pub struct StyleCache<S: Sink> {
    inner: S,
    fg: Option<Color>,
    bg: Option<Color>,
    attrs: Option<Attribute>,
    cursor_visible: Option<bool>,
}

impl<S: Sink> StyleCache<S> {
    #[must_use]
    pub fn new(inner: S) -> Self {
        StyleCache {
            inner,
            fg: None,
            bg: None,
            attrs: None,
            cursor_visible: None,
        }
    }

    #[must_use]
    pub fn inner(&self) -> &S {
        &self.inner
    }

    #[must_use]
    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    #[must_use]
    pub fn cached_foreground(&self) -> Option<Color> {
        self.fg
    }

    #[must_use]
    pub fn cached_background(&self) -> Option<Color> {
        self.bg
    }

    #[must_use]
    pub fn cached_attributes(&self) -> Option<Attribute> {
        self.attrs
    }

    /// Clear the whole cache so the next style write is never elided.
    /// Called after a mode switch (e.g. raw-mode toggling) that may have
    /// perturbed terminal rendition state outside the renderer's view.
    pub fn invalidate(&mut self) {
        self.fg = None;
        self.bg = None;
        self.attrs = None;
        self.cursor_visible = None;
    }
}

impl<S: Sink> Sink for StyleCache<S> {
    type Error = S::Error;

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        self.inner.write_str(s)
    }

    fn move_cursor(&mut self, x: u16, y: u16) -> Result<(), Self::Error> {
        self.inner.move_cursor(x, y)
    }

    fn set_foreground(&mut self, color: Color) -> Result<(), Self::Error> {
        if self.fg == Some(color) {
            return Ok(());
        }
        self.inner.set_foreground(color)?;
        self.fg = Some(color);
        Ok(())
    }

    fn set_background(&mut self, color: Color) -> Result<(), Self::Error> {
        if self.bg == Some(color) {
            return Ok(());
        }
        self.inner.set_background(color)?;
        self.bg = Some(color);
        Ok(())
    }

    fn set_attributes(&mut self, attrs: Attribute) -> Result<(), Self::Error> {
        if self.attrs == Some(attrs) {
            return Ok(());
        }
        self.inner.set_attributes(attrs)?;
        self.attrs = Some(attrs);
        Ok(())
    }

    fn reset_style(&mut self) -> Result<(), Self::Error> {
        self.inner.reset_style()?;
        self.fg = None;
        self.bg = None;
        self.attrs = None;
        Ok(())
    }

    fn set_cursor_visible(&mut self, visible: bool) -> Result<(), Self::Error> {
        if self.cursor_visible == Some(visible) {
            return Ok(());
        }
        self.inner.set_cursor_visible(visible)?;
        self.cursor_visible = Some(visible);
        Ok(())
    }

    fn begin_sync(&mut self) -> Result<(), Self::Error> {
        self.inner.begin_sync()
    }

    fn end_sync(&mut self) -> Result<(), Self::Error> {
        self.inner.end_sync()
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        fg_writes: usize,
        bg_writes: usize,
        attr_writes: usize,
    }

    impl Sink for RecordingSink {
        type Error = Infallible;

        fn write_str(&mut self, _s: &str) -> Result<(), Self::Error> {
            Ok(())
        }
        fn move_cursor(&mut self, _x: u16, _y: u16) -> Result<(), Self::Error> {
            Ok(())
        }
        fn set_foreground(&mut self, _color: Color) -> Result<(), Self::Error> {
            self.fg_writes += 1;
            Ok(())
        }
        fn set_background(&mut self, _color: Color) -> Result<(), Self::Error> {
            self.bg_writes += 1;
            Ok(())
        }
        fn set_attributes(&mut self, _attrs: Attribute) -> Result<(), Self::Error> {
            self.attr_writes += 1;
            Ok(())
        }
        fn reset_style(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
        fn set_cursor_visible(&mut self, _visible: bool) -> Result<(), Self::Error> {
            Ok(())
        }
        fn begin_sync(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
        fn end_sync(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    #[test]
    fn repeated_identical_foreground_is_single_write() {
        let mut cache = StyleCache::new(RecordingSink::default());
        for _ in 0..5 {
            cache.set_foreground(Color::Ansi8(1)).unwrap();
        }
        assert_eq!(cache.inner().fg_writes, 1);
    }

    #[test]
    fn different_color_writes_again() {
        let mut cache = StyleCache::new(RecordingSink::default());
        cache.set_foreground(Color::Ansi8(1)).unwrap();
        cache.set_foreground(Color::Ansi8(2)).unwrap();
        assert_eq!(cache.inner().fg_writes, 2);
    }

    #[test]
    fn reset_style_clears_cache() {
        let mut cache = StyleCache::new(RecordingSink::default());
        cache.set_foreground(Color::Ansi8(1)).unwrap();
        cache.reset_style().unwrap();
        assert_eq!(cache.cached_foreground(), None);
        cache.set_foreground(Color::Ansi8(1)).unwrap();
        assert_eq!(cache.inner().fg_writes, 2);
    }

    #[test]
    fn invalidate_clears_everything() {
        let mut cache = StyleCache::new(RecordingSink::default());
        cache.set_foreground(Color::Ansi8(1)).unwrap();
        cache.set_background(Color::Ansi8(2)).unwrap();
        cache.set_attributes(Attribute::BOLD).unwrap();
        cache.invalidate();
        assert_eq!(cache.cached_foreground(), None);
        assert_eq!(cache.cached_background(), None);
        assert_eq!(cache.cached_attributes(), None);
    }
}
