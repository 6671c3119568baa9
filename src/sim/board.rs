/// Board: the complete mutable state of a loaded level.
///
/// ## Entity Architecture
///
/// Three layers, kept consistent by the resolvers:
///   - `grid`    : what occupies each coordinate (`Cell::Jelly` holds a `CellId`)
///   - `cells`   : cell arena: color, owning jelly, offset, merge flags
///   - `jellies` : jelly arena: origin, member cells, immovable
///
/// `order` lists the live jellies in load order (growth appends); every
/// resolver scans jellies in this order. Absorbed jellies leave a `None`
/// slot in the arena and drop out of `order`.
///
/// Invariant at rest: every member cell of a live jelly sits in the grid at
/// `origin + offset`, and no coordinate is claimed twice.

use std::collections::HashSet;

use crate::domain::cell::{Cell, Dir};
use crate::domain::color::Color;
use crate::domain::grid::{Grid, GridError};
use crate::domain::groups::ColorGroups;
use crate::domain::jelly::{CellId, Jelly, JellyCell, JellyId};
use super::anchor;
use super::event::{AnchorMark, Frame, GrowerMark, JellyView, Phase, ViewCell};
use super::level::{LevelDescriptor, LevelError};

/// What an anchor binds to, or what a grower lives in.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Attach {
    Wall,
    Cell(CellId),
}

/// An anchor whose own cell does not exist yet.
#[derive(Clone, Debug)]
pub struct PendingAnchor {
    pub x: i32,
    pub y: i32,
    pub dir: Dir,
    pub neighbor: Attach,
}

#[derive(Clone, Debug)]
pub struct Grower {
    pub x: i32,
    pub y: i32,
    pub dir: Dir,
    pub color: Color,
    pub host: Attach,
}

pub struct Board {
    pub grid: Grid,
    pub cells: Vec<JellyCell>,
    pub jellies: Vec<Option<Jelly>>,
    pub order: Vec<JellyId>,
    pub groups: ColorGroups,

    // ── Anchors / growers ──
    /// Resolved anchors, kept for snapshot reconstruction.
    pub anchored: Vec<(CellId, Dir)>,
    pub delayed: Vec<PendingAnchor>,
    pub growers: Vec<Grower>,

    // ── Completion tracking ──
    /// Live color groups plus pending growers.
    pub blocks: usize,
    /// Distinct colors at load (map and growers). Fixed for the level.
    pub colors: usize,
    /// The completion signal has been raised once.
    pub solved_signalled: bool,
}

// ── Construction ──

impl Board {
    pub fn new(width: usize, height: usize) -> Self {
        Board {
            grid: Grid::new(width, height),
            cells: vec![],
            jellies: vec![],
            order: vec![],
            groups: ColorGroups::new(),
            anchored: vec![],
            delayed: vec![],
            growers: vec![],
            blocks: 0,
            colors: 0,
            solved_signalled: false,
        }
    }

    /// Build a board from a descriptor: map, then anchors, then growers.
    /// Merges are not run here; the stage does that.
    pub fn from_descriptor(level: &LevelDescriptor) -> Result<Self, LevelError> {
        let height = level.map.len();
        let width = level.map.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        if height == 0 || width == 0 {
            return Err(LevelError::EmptyMap);
        }

        let mut board = Board::new(width, height);
        let mut palette: HashSet<Color> = HashSet::new();

        for (y, row) in level.map.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let (x, y) = (x as i32, y as i32);
                match ch {
                    'x' => board.grid.set(x, y, Cell::Wall)?,
                    ' ' => {}
                    _ => {
                        let color = Color::from_symbol(ch)
                            .ok_or(LevelError::UnknownCellSymbol { symbol: ch, x, y })?;
                        board.spawn_jelly(color, x, y)?;
                        board.blocks += 1;
                        palette.insert(color);
                    }
                }
            }
        }

        anchor::place_anchors(&mut board, &level.anchors)?;

        for spec in &level.growers {
            let color = Color::from_name(&spec.color)
                .ok_or_else(|| LevelError::UnknownColor(spec.color.clone()))?;
            let host = match board.grid.get(spec.x, spec.y)? {
                Cell::Wall => Attach::Wall,
                Cell::Jelly(c) => Attach::Cell(c),
                Cell::Empty => return Err(LevelError::GrowerWithoutHost { x: spec.x, y: spec.y }),
            };
            board.growers.push(Grower { x: spec.x, y: spec.y, dir: spec.dir, color, host });
            // Each grower is a future block.
            board.blocks += 1;
            palette.insert(color);
        }

        board.colors = palette.len();
        tracing::info!(
            width, height,
            jellies = board.order.len(),
            blocks = board.blocks,
            colors = board.colors,
            "board loaded"
        );
        Ok(board)
    }
}

// ── Entity query API ──

impl Board {
    #[inline]
    pub fn cell(&self, id: CellId) -> &JellyCell {
        &self.cells[id.0]
    }

    pub fn jelly(&self, id: JellyId) -> Option<&Jelly> {
        self.jellies.get(id.0).and_then(|j| j.as_ref())
    }

    pub fn jelly_mut(&mut self, id: JellyId) -> Option<&mut Jelly> {
        self.jellies.get_mut(id.0).and_then(|j| j.as_mut())
    }

    pub fn is_live(&self, id: JellyId) -> bool {
        self.jelly(id).is_some()
    }

    /// Absolute grid position of a cell.
    pub fn cell_pos(&self, id: CellId) -> (i32, i32) {
        let cell = self.cell(id);
        match self.jelly(cell.jelly) {
            Some(j) => j.abs(cell),
            None => cell.offset,
        }
    }

    /// Absolute positions of a jelly's member cells.
    pub fn member_positions(&self, id: JellyId) -> Vec<(CellId, i32, i32)> {
        match self.jelly(id) {
            Some(j) => j.cells.iter().map(|&c| {
                let (x, y) = j.abs(self.cell(c));
                (c, x, y)
            }).collect(),
            None => vec![],
        }
    }

    /// The jelly occupying (x, y), if any.
    pub fn jelly_at(&self, x: i32, y: i32) -> Option<JellyId> {
        match self.grid.get(x, y) {
            Ok(Cell::Jelly(c)) => Some(self.cell(c).jelly),
            Ok(Cell::Empty | Cell::Wall) | Err(_) => None,
        }
    }

    pub fn attach_pos(&self, attach: Attach, fallback: (i32, i32)) -> (i32, i32) {
        match attach {
            Attach::Wall => fallback,
            Attach::Cell(c) => self.cell_pos(c),
        }
    }

    /// Current position of a grower (a hosted grower travels with its jelly).
    pub fn grower_pos(&self, g: &Grower) -> (i32, i32) {
        self.attach_pos(g.host, (g.x, g.y))
    }

    pub fn is_complete(&self) -> bool {
        self.blocks <= self.colors
    }

    /// Check the occupancy invariant and the block count (one per color group
    /// plus one per pending grower). Returns a description of the first violation.
    pub fn check_occupancy(&self) -> Result<(), String> {
        let mut claimed: HashSet<(i32, i32)> = HashSet::new();
        for &id in &self.order {
            let jelly = self.jelly(id).ok_or_else(|| format!("{:?} tracked but dead", id))?;
            if jelly.cells.is_empty() {
                return Err(format!("{:?} has no cells", id));
            }
            for &c in &jelly.cells {
                if self.cell(c).jelly != id {
                    return Err(format!("{:?} listed in {:?} but owned elsewhere", c, id));
                }
                let (x, y) = jelly.abs(self.cell(c));
                if self.grid.get(x, y) != Ok(Cell::Jelly(c)) {
                    return Err(format!("{:?} of {:?} missing from grid at ({}, {})", c, id, x, y));
                }
                if !claimed.insert((x, y)) {
                    return Err(format!("({}, {}) claimed twice", x, y));
                }
            }
        }
        let on_grid = self.grid.iter().filter(|(_, _, c)| c.jelly_cell().is_some()).count();
        if on_grid != claimed.len() {
            return Err(format!("{} jelly cells on grid, {} owned", on_grid, claimed.len()));
        }
        let expected = self.groups.count() + self.growers.len();
        if self.blocks != expected {
            return Err(format!("{} blocks counted, {} groups and growers", self.blocks, expected));
        }
        Ok(())
    }
}

// ── Entity mutation API ──

impl Board {
    /// Create a single-cell jelly at (x, y) and write it into the grid.
    /// The new cell starts its own color group; block accounting is the caller's.
    pub fn spawn_jelly(&mut self, color: Color, x: i32, y: i32) -> Result<CellId, GridError> {
        let cid = CellId(self.cells.len());
        let jid = JellyId(self.jellies.len());
        self.grid.set(x, y, Cell::Jelly(cid))?;
        self.cells.push(JellyCell::new(color, jid));
        self.groups.add(cid);
        self.jellies.push(Some(Jelly::new(cid, x, y)));
        self.order.push(jid);
        Ok(cid)
    }

    /// Bind `cell` to its neighbor across `dir`: drop the shared border,
    /// make the jelly immovable against a wall, or fuse the two jellies.
    /// Color groups are untouched.
    pub fn fuse(&mut self, cell: CellId, dir: Dir, other: Attach) {
        self.cells[cell.0].joined[dir.index()] = true;
        let mine = self.cells[cell.0].jelly;
        match other {
            Attach::Wall => {
                if let Some(j) = self.jelly_mut(mine) {
                    j.immovable = true;
                }
            }
            Attach::Cell(o) => {
                self.cells[o.0].joined[dir.opposite().index()] = true;
                let theirs = self.cells[o.0].jelly;
                if mine != theirs {
                    self.absorb(mine, theirs);
                }
            }
        }
    }

    /// Move every cell of `gone` into `keep`, translating offsets into
    /// `keep`'s frame, and discard the empty shell.
    pub fn absorb(&mut self, keep: JellyId, gone: JellyId) {
        if keep == gone { return; }
        let keep_origin = match self.jelly(keep) {
            Some(j) => j.origin,
            None => return,
        };
        let Some(shell) = self.jellies.get_mut(gone.0).and_then(|j| j.take()) else { return };
        let dx = shell.origin.0 - keep_origin.0;
        let dy = shell.origin.1 - keep_origin.1;
        for &c in &shell.cells {
            let cell = &mut self.cells[c.0];
            cell.offset = (cell.offset.0 + dx, cell.offset.1 + dy);
            cell.jelly = keep;
        }
        if let Some(keeper) = self.jelly_mut(keep) {
            keeper.cells.extend_from_slice(&shell.cells);
            keeper.immovable |= shell.immovable;
        }
        self.order.retain(|&j| j != gone);
        tracing::trace!(?keep, ?gone, "jelly absorbed");
    }
}

// ── Presentation views ──

impl Board {
    pub fn views(&self) -> Vec<JellyView> {
        self.order.iter().filter_map(|&id| {
            let j = self.jelly(id)?;
            Some(JellyView {
                id,
                origin: j.origin,
                cells: j.cells.iter().map(|&c| {
                    let cell = self.cell(c);
                    ViewCell { offset: cell.offset, color: cell.color, joined: cell.joined }
                }).collect(),
                immovable: j.immovable,
            })
        }).collect()
    }

    pub fn grower_marks(&self) -> Vec<GrowerMark> {
        self.growers.iter().map(|g| {
            let (x, y) = self.grower_pos(g);
            GrowerMark { x, y, dir: g.dir, color: g.color }
        }).collect()
    }

    pub fn anchor_marks(&self) -> Vec<AnchorMark> {
        let mut marks: Vec<AnchorMark> = self.anchored.iter().map(|&(c, dir)| {
            let (x, y) = self.cell_pos(c);
            AnchorMark { x, y, dir, pending: false }
        }).collect();
        for p in &self.delayed {
            let (x, y) = anchor::expected_position(self, p);
            marks.push(AnchorMark { x, y, dir: p.dir, pending: true });
        }
        marks
    }

    pub fn frame(&self, phase: Phase) -> Frame {
        Frame {
            phase,
            jellies: self.views(),
            growers: self.grower_marks(),
            anchors: self.anchor_marks(),
        }
    }
}
