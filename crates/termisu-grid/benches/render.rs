use criterion::{black_box, criterion_group, criterion_main, Criterion};
use termisu_color::{Attribute, Color};
use termisu_grid::{Cell, CellGrid, Sink, StyleCache};

#[derive(Default)]
struct DiscardSink;

impl Sink for DiscardSink {
    type Error = std::convert::Infallible;
    fn write_str(&mut self, _s: &str) -> Result<(), Self::Error> {
        Ok(())
    }
    fn move_cursor(&mut self, _x: u16, _y: u16) -> Result<(), Self::Error> {
        Ok(())
    }
    fn set_foreground(&mut self, _color: Color) -> Result<(), Self::Error> {
        Ok(())
    }
    fn set_background(&mut self, _color: Color) -> Result<(), Self::Error> {
        Ok(())
    }
    fn set_attributes(&mut self, _attrs: Attribute) -> Result<(), Self::Error> {
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

fn bench_full_screen_diff(c: &mut Criterion) {
    c.bench_function("render_to 80x24 full diff", |b| {
        b.iter_batched(
            || {
                let mut grid = CellGrid::new(80, 24);
                grid.commit();
                for y in 0..24 {
                    for x in 0..80 {
                        grid.set_cell(x, y, Cell::new('x', Color::Ansi8(3), Color::Default, Attribute::empty()));
                    }
                }
                (grid, StyleCache::new(DiscardSink))
            },
            |(mut grid, mut sink)| {
                termisu_grid::render_to(black_box(&mut grid), black_box(&mut sink)).unwrap();
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_full_screen_diff);
criterion_main!(benches);
