/// Entities: jelly cells and the rigid jellies that own them.
///
/// Both live in arenas owned by the board and are referenced by stable ids.
/// The grid stores a `CellId`; each cell knows its owning `JellyId` and its
/// offset from that jelly's origin. No back-pointers, no cycles.

use super::cell::Dir;
use super::color::Color;

/// Stable index into the cell arena. Cells are never removed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct CellId(pub usize);

/// Stable index into the jelly arena. Absorbed jellies leave a `None` slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct JellyId(pub usize);

#[derive(Clone, Debug)]
pub struct JellyCell {
    pub color: Color,
    pub jelly: JellyId,
    pub offset: (i32, i32),
    /// Set by the merge scan once this cell merged across a direction.
    pub merged: [bool; 4],
    /// Border removed on this side (merge or anchor). Presentation only.
    pub joined: [bool; 4],
}

impl JellyCell {
    pub fn new(color: Color, jelly: JellyId) -> Self {
        JellyCell { color, jelly, offset: (0, 0), merged: [false; 4], joined: [false; 4] }
    }

    pub fn has_merged(&self, dir: Dir) -> bool {
        self.merged[dir.index()]
    }
}

/// A rigid body of one or more cells sharing one origin.
#[derive(Clone, Debug)]
pub struct Jelly {
    pub origin: (i32, i32),
    pub cells: Vec<CellId>,
    pub immovable: bool,
}

impl Jelly {
    pub fn new(cell: CellId, x: i32, y: i32) -> Self {
        Jelly { origin: (x, y), cells: vec![cell], immovable: false }
    }

    /// Absolute position of a member cell.
    #[inline]
    pub fn abs(&self, cell: &JellyCell) -> (i32, i32) {
        (self.origin.0 + cell.offset.0, self.origin.1 + cell.offset.1)
    }

    pub fn translate(&mut self, dx: i32, dy: i32) {
        self.origin = (self.origin.0 + dx, self.origin.1 + dy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abs_adds_offset() {
        let mut j = Jelly::new(CellId(0), 4, 2);
        let mut c = JellyCell::new(Color::Red, JellyId(0));
        c.offset = (1, -1);
        assert_eq!(j.abs(&c), (5, 1));
        j.translate(-2, 3);
        assert_eq!(j.abs(&c), (3, 4));
    }

    #[test]
    fn fresh_cell_has_no_merges() {
        let c = JellyCell::new(Color::Blue, JellyId(3));
        for dir in Dir::ALL {
            assert!(!c.has_merged(dir));
        }
        assert_eq!(c.offset, (0, 0));
    }
}
