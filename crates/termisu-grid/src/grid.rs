use crate::cell::Cell;
use crate::cursor::Cursor;

/// A double-buffered grid of character cells: a "back" buffer applications
/// write into, and a "front" buffer recording what was last reconciled to
/// the terminal. Both buffers always share the same dimensions.
#[derive(Debug, Clone)]
pub struct CellGrid {
    width: u16,
    height: u16,
    back: Vec<Cell>,
    front: Vec<Cell>,
    pub cursor: Cursor,
}

impl CellGrid {
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        let len = usize::from(width) * usize::from(height);
        CellGrid {
            width,
            height,
            back: vec![Cell::default(); len],
            front: vec![Cell::default(); len],
            cursor: Cursor::new(),
        }
    }

    #[must_use]
    pub fn width(&self) -> u16 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u16 {
        self.height
    }

    fn index(&self, x: u16, y: u16) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| usize::from(y) * usize::from(self.width) + usize::from(x))
    }

    /// The back-buffer cell at `(x, y)`, or `None` if out of bounds.
    #[must_use]
    pub fn get_cell(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.back[i])
    }

    /// The front-buffer (last-reconciled) cell at `(x, y)`.
    #[must_use]
    pub fn get_front_cell(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.front[i])
    }

    /// Write `cell` into the back buffer at `(x, y)`. Returns `false`
    /// without mutating anything if `(x, y)` is out of bounds.
    pub fn set_cell(&mut self, x: u16, y: u16, cell: Cell) -> bool {
        match self.index(x, y) {
            Some(i) => {
                self.back[i] = cell;
                true
            }
            None => false,
        }
    }

    /// Resize to `(new_width, new_height)`, preserving the top-left
    /// `min(old, new)` rectangle of both buffers and filling the rest with
    /// default cells. A no-op if the dimensions are unchanged.
    pub fn resize(&mut self, new_width: u16, new_height: u16) {
        if new_width == self.width && new_height == self.height {
            return;
        }
        let len = usize::from(new_width) * usize::from(new_height);
        let mut new_back = vec![Cell::default(); len];
        let mut new_front = vec![Cell::default(); len];

        let copy_w = self.width.min(new_width);
        let copy_h = self.height.min(new_height);
        for y in 0..copy_h {
            for x in 0..copy_w {
                let old_i = usize::from(y) * usize::from(self.width) + usize::from(x);
                let new_i = usize::from(y) * usize::from(new_width) + usize::from(x);
                new_back[new_i] = self.back[old_i];
                new_front[new_i] = self.front[old_i];
            }
        }

        self.back = new_back;
        self.front = new_front;
        self.width = new_width;
        self.height = new_height;
        self.cursor.clamp(new_width, new_height);
    }

    /// Cells at `(x, y)` for `0 <= x < width`, `0 <= y < height`, row-major.
    pub(crate) fn positions(&self) -> impl Iterator<Item = (u16, u16)> + '_ {
        let width = self.width;
        let height = self.height;
        (0..height).flat_map(move |y| (0..width).map(move |x| (x, y)))
    }

    pub(crate) fn cell_at(&self, i: usize) -> &Cell {
        &self.back[i]
    }

    pub(crate) fn front_at(&self, i: usize) -> &Cell {
        &self.front[i]
    }

    pub(crate) fn len(&self) -> usize {
        self.back.len()
    }

    /// Copy the back buffer onto the front buffer, marking everything as
    /// reconciled.
    pub(crate) fn commit(&mut self) {
        self.front.clone_from(&self.back);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn get_cell_is_none_out_of_bounds() {
        let grid = CellGrid::new(10, 5);
        assert!(grid.get_cell(9, 4).is_some());
        assert!(grid.get_cell(10, 4).is_none());
        assert!(grid.get_cell(9, 5).is_none());
    }

    #[test]
    fn set_cell_rejects_out_of_bounds() {
        let mut grid = CellGrid::new(4, 4);
        assert!(!grid.set_cell(4, 0, Cell::default()));
        assert!(!grid.set_cell(0, 4, Cell::default()));
    }

    #[test]
    fn resize_preserves_overlap_and_fills_default() {
        let mut grid = CellGrid::new(4, 4);
        let cell = Cell::new('x', termisu_color::Color::Default, termisu_color::Color::Default, termisu_color::Attribute::empty());
        grid.set_cell(1, 1, cell);
        grid.commit();
        grid.resize(2, 2);
        assert_eq!(*grid.get_cell(1, 1).unwrap(), cell);
        grid.resize(6, 6);
        assert_eq!(*grid.get_cell(1, 1).unwrap(), cell);
        assert_eq!(*grid.get_cell(5, 5).unwrap(), Cell::default());
    }

    proptest! {
        #[test]
        fn grid_size_invariant(
            w in 1u16..20, h in 1u16..20,
            qx in 0u16..25, qy in 0u16..25,
        ) {
            let grid = CellGrid::new(w, h);
            let present = grid.get_cell(qx, qy).is_some();
            prop_assert_eq!(present, qx < w && qy < h);
        }
    }
}
