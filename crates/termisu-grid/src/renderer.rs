use termisu_color::{Attribute, Color};

use crate::cache::StyleCache;
use crate::cell::Cell;
use crate::grid::CellGrid;
use crate::sink::Sink;

/// Run `body` with a synchronized-update frame open, guaranteeing
/// `end_sync` fires on every exit path out of `body` (including a failed
/// write partway through).
fn with_synchronized_update<S: Sink>(
    sink: &mut StyleCache<S>,
    body: impl FnOnce(&mut StyleCache<S>) -> Result<(), S::Error>,
) -> Result<(), S::Error> {
    struct EndGuard<'a, S: Sink> {
        sink: &'a mut StyleCache<S>,
    }
    impl<S: Sink> Drop for EndGuard<'_, S> {
        fn drop(&mut self) {
            let _ = self.sink.end_sync();
        }
    }

    sink.begin_sync()?;
    let guard = EndGuard { sink };
    let result = body(guard.sink);
    drop(guard);
    result
}

struct Run {
    x: u16,
    y: u16,
    style: (Color, Color, Attribute),
    text: String,
}

/// Reconcile `grid`'s back buffer against the terminal, writing only the
/// cells that changed since the last render, then commit the back buffer
/// onto the front buffer.
///
/// # Errors
///
/// Propagates any error from `sink`. The end-of-synchronized-update
/// sequence is still emitted on every exit path, including this one.
pub fn render_to<S: Sink>(grid: &mut CellGrid, sink: &mut StyleCache<S>) -> Result<(), S::Error> {
    reconcile(grid, sink, false)
}

/// Like [`render_to`], but emits every cell regardless of whether it
/// changed. Used after a resize, alternate-screen entry, or any other
/// event that may have corrupted the terminal's view of the screen.
///
/// # Errors
///
/// Propagates any error from `sink`.
pub fn sync_to<S: Sink>(grid: &mut CellGrid, sink: &mut StyleCache<S>) -> Result<(), S::Error> {
    reconcile(grid, sink, true)
}

fn reconcile<S: Sink>(
    grid: &mut CellGrid,
    sink: &mut StyleCache<S>,
    force: bool,
) -> Result<(), S::Error> {
    let result = with_synchronized_update(sink, |sink| {
        let mut last_cursor: Option<(u16, u16)> = None;
        let mut run: Option<Run> = None;

        for (i, (x, y)) in grid.positions().enumerate() {
            let back = grid.cell_at(i);
            let changed = force || back != grid.front_at(i);
            if !changed {
                flush_run(sink, &mut last_cursor, run.take())?;
                continue;
            }

            let style = back.style();
            let fits_run = run
                .as_ref()
                .is_some_and(|r| r.y == y && r.x as usize + r.text.chars().count() == x as usize && r.style == style);

            if fits_run {
                run.as_mut().unwrap().text.push(back.ch);
            } else {
                flush_run(sink, &mut last_cursor, run.take())?;
                run = Some(Run {
                    x,
                    y,
                    style,
                    text: back.ch.to_string(),
                });
            }
        }
        flush_run(sink, &mut last_cursor, run.take())?;

        match grid.cursor.position() {
            Some((x, y)) => {
                sink.set_cursor_visible(true)?;
                sink.move_cursor(x, y)?;
            }
            None => sink.set_cursor_visible(false)?,
        }
        sink.flush()
    });

    grid.commit();
    result
}

fn flush_run<S: Sink>(
    sink: &mut StyleCache<S>,
    last_cursor: &mut Option<(u16, u16)>,
    run: Option<Run>,
) -> Result<(), S::Error> {
    let Some(run) = run else { return Ok(()) };

    if *last_cursor != Some((run.x, run.y)) {
        sink.move_cursor(run.x, run.y)?;
    }

    apply_style(sink, run.style)?;
    sink.write_str(&run.text)?;

    let written = u16::try_from(run.text.chars().count()).unwrap_or(u16::MAX);
    *last_cursor = Some((run.x.saturating_add(written), run.y));
    Ok(())
}

fn apply_style<S: Sink>(
    sink: &mut StyleCache<S>,
    (fg, bg, attrs): (Color, Color, Attribute),
) -> Result<(), S::Error> {
    // If bits that were set are now clear, there is no escape that only
    // clears those bits: emit a full reset and reapply everything that
    // should remain set.
    let dropped_bits = sink
        .cached_attributes()
        .is_some_and(|cached| !cached.difference(attrs).is_empty());
    if dropped_bits {
        sink.reset_style()?;
    }
    sink.set_foreground(fg)?;
    sink.set_background(bg)?;
    sink.set_attributes(attrs)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::convert::Infallible;
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Write(String),
        Move(u16, u16),
        Fg(Color),
        Bg(Color),
        Attrs(Attribute),
        Reset,
        CursorVisible(bool),
    }

    #[derive(Default, Clone)]
    struct MockSink {
        ops: Rc<RefCell<Vec<Op>>>,
    }

    impl Sink for MockSink {
        type Error = Infallible;
        fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
            self.ops.borrow_mut().push(Op::Write(s.to_owned()));
            Ok(())
        }
        fn move_cursor(&mut self, x: u16, y: u16) -> Result<(), Self::Error> {
            self.ops.borrow_mut().push(Op::Move(x, y));
            Ok(())
        }
        fn set_foreground(&mut self, color: Color) -> Result<(), Self::Error> {
            self.ops.borrow_mut().push(Op::Fg(color));
            Ok(())
        }
        fn set_background(&mut self, color: Color) -> Result<(), Self::Error> {
            self.ops.borrow_mut().push(Op::Bg(color));
            Ok(())
        }
        fn set_attributes(&mut self, attrs: Attribute) -> Result<(), Self::Error> {
            self.ops.borrow_mut().push(Op::Attrs(attrs));
            Ok(())
        }
        fn reset_style(&mut self) -> Result<(), Self::Error> {
            self.ops.borrow_mut().push(Op::Reset);
            Ok(())
        }
        fn set_cursor_visible(&mut self, visible: bool) -> Result<(), Self::Error> {
            self.ops.borrow_mut().push(Op::CursorVisible(visible));
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

    fn write_count(ops: &[Op]) -> usize {
        ops.iter().filter(|op| matches!(op, Op::Write(_))).count()
    }

    #[test]
    fn diff_minimality_for_disjoint_runs() {
        let mut grid = CellGrid::new(10, 1);
        grid.commit();
        grid.set_cell(0, 0, Cell::new('a', Color::Default, Color::Default, Attribute::empty()));
        grid.set_cell(1, 0, Cell::new('b', Color::Default, Color::Default, Attribute::empty()));
        grid.set_cell(5, 0, Cell::new('c', Color::Default, Color::Default, Attribute::empty()));

        let mock = MockSink::default();
        let mut cache = StyleCache::new(mock.clone());
        render_to(&mut grid, &mut cache).unwrap();

        let ops = mock.ops.borrow();
        assert_eq!(write_count(&ops), 2);
    }

    #[test]
    fn style_cache_elides_repeated_sgr() {
        let mut grid = CellGrid::new(3, 1);
        grid.commit();
        for x in 0..3 {
            grid.set_cell(x, 0, Cell::new('x', Color::Ansi8(2), Color::Default, Attribute::empty()));
        }

        let mock = MockSink::default();
        let mut cache = StyleCache::new(mock.clone());
        render_to(&mut grid, &mut cache).unwrap();

        let ops = mock.ops.borrow();
        let fg_writes = ops.iter().filter(|op| matches!(op, Op::Fg(_))).count();
        assert_eq!(fg_writes, 1);
    }

    #[test]
    fn sync_to_forces_every_cell() {
        let mut grid = CellGrid::new(2, 1);
        grid.set_cell(0, 0, Cell::new('a', Color::Default, Color::Default, Attribute::empty()));
        grid.commit();
        // Nothing changed, render_to would emit no writes.
        let mock = MockSink::default();
        let mut cache = StyleCache::new(mock.clone());
        sync_to(&mut grid, &mut cache).unwrap();
        let ops = mock.ops.borrow();
        assert!(write_count(&ops) >= 1);
    }

    #[test]
    fn dropped_attribute_bits_trigger_full_reset() {
        let mut grid = CellGrid::new(1, 1);
        grid.set_cell(0, 0, Cell::new('a', Color::Default, Color::Default, Attribute::BOLD));
        grid.commit();
        grid.set_cell(0, 0, Cell::new('a', Color::Default, Color::Default, Attribute::empty()));

        let mock = MockSink::default();
        let mut cache = StyleCache::new(mock.clone());
        cache.set_attributes(Attribute::BOLD).unwrap();
        mock.ops.borrow_mut().clear();

        render_to(&mut grid, &mut cache).unwrap();
        let ops = mock.ops.borrow();
        assert!(ops.contains(&Op::Reset));
    }
}
