/// Grid: the authoritative occupancy table.
///
/// Pure data structure. Callers (the motion resolver) are responsible for
/// only writing consistent states; the grid enforces bounds and nothing else.

use thiserror::Error;

use super::cell::Cell;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("cell ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds { x: i32, y: i32, width: usize, height: usize },
}

#[derive(Clone, Debug)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        Grid { width, height, cells: vec![Cell::Empty; width * height] }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Result<usize, GridError> {
        if self.in_bounds(x, y) {
            Ok(y as usize * self.width + x as usize)
        } else {
            Err(GridError::OutOfBounds { x, y, width: self.width, height: self.height })
        }
    }

    pub fn get(&self, x: i32, y: i32) -> Result<Cell, GridError> {
        self.index(x, y).map(|i| self.cells[i])
    }

    pub fn set(&mut self, x: i32, y: i32, cell: Cell) -> Result<(), GridError> {
        let i = self.index(x, y)?;
        self.cells[i] = cell;
        Ok(())
    }

    /// Neighbor lookup: outside the grid counts as wall.
    #[inline]
    pub fn cell_or_wall(&self, x: i32, y: i32) -> Cell {
        self.get(x, y).unwrap_or(Cell::Wall)
    }

    /// Iterate `(x, y, cell)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, i32, Cell)> + '_ {
        let w = self.width;
        self.cells.iter().enumerate().map(move |(i, &c)| ((i % w) as i32, (i / w) as i32, c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::jelly::CellId;

    #[test]
    fn defaults_to_empty() {
        let g = Grid::new(3, 2);
        assert!(g.iter().all(|(_, _, c)| c == Cell::Empty));
        assert_eq!(g.iter().count(), 6);
    }

    #[test]
    fn set_then_get() {
        let mut g = Grid::new(3, 2);
        g.set(2, 1, Cell::Jelly(CellId(7))).unwrap();
        assert_eq!(g.get(2, 1), Ok(Cell::Jelly(CellId(7))));
        g.set(2, 1, Cell::Wall).unwrap();
        assert_eq!(g.get(2, 1), Ok(Cell::Wall));
    }

    #[test]
    fn out_of_bounds_reported() {
        let mut g = Grid::new(3, 2);
        assert_eq!(
            g.get(3, 0),
            Err(GridError::OutOfBounds { x: 3, y: 0, width: 3, height: 2 })
        );
        assert!(g.get(-1, 0).is_err());
        assert!(g.get(0, 2).is_err());
        assert!(g.set(0, -1, Cell::Wall).is_err());
    }

    #[test]
    fn outside_reads_as_wall() {
        let g = Grid::new(1, 1);
        assert_eq!(g.cell_or_wall(0, 0), Cell::Empty);
        assert_eq!(g.cell_or_wall(1, 0), Cell::Wall);
        assert_eq!(g.cell_or_wall(0, -1), Cell::Wall);
    }

    #[test]
    fn iter_is_row_major() {
        let mut g = Grid::new(2, 2);
        g.set(1, 0, Cell::Wall).unwrap();
        let walls: Vec<_> = g.iter().filter(|(_, _, c)| *c == Cell::Wall).map(|(x, y, _)| (x, y)).collect();
        assert_eq!(walls, vec![(1, 0)]);
    }
}
