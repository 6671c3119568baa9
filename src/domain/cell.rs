/// Cell kinds and directions.
/// Every grid inspection site matches on `Cell` exhaustively,
/// so cell semantics are centralized here.

use serde::{Deserialize, Serialize};

use super::jelly::CellId;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Cell {
    #[default]
    Empty,
    Wall,           // Immovable terrain, never part of a jelly
    Jelly(CellId),  // Owned by exactly one jelly
}

impl Cell {
    /// The jelly cell id, if any.
    pub fn jelly_cell(self) -> Option<CellId> {
        match self {
            Cell::Jelly(id) => Some(id),
            Cell::Empty | Cell::Wall => None,
        }
    }
}

/// The four cardinal directions.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dir {
    Left,
    Right,
    Up,
    Down,
}

impl Dir {
    #[cfg(test)]
    pub const ALL: [Dir; 4] = [Dir::Left, Dir::Right, Dir::Up, Dir::Down];

    /// Unit vector, y grows downward.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Dir::Left => (-1, 0),
            Dir::Right => (1, 0),
            Dir::Up => (0, -1),
            Dir::Down => (0, 1),
        }
    }

    pub fn opposite(self) -> Dir {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
            Dir::Up => Dir::Down,
            Dir::Down => Dir::Up,
        }
    }

    /// Slot in per-direction flag arrays.
    pub fn index(self) -> usize {
        match self {
            Dir::Left => 0,
            Dir::Right => 1,
            Dir::Up => 2,
            Dir::Down => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Dir::Left => "left",
            Dir::Right => "right",
            Dir::Up => "up",
            Dir::Down => "down",
        }
    }
}
