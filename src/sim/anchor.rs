/// Anchors: permanent bonds between a cell and its neighbor.
///
/// An anchor is declared as (x, y, dir). The neighbor at (x, y) + dir must
/// exist at load (a wall or a jelly cell). When the anchored cell itself is
/// absent, or the anchor is marked delayed, the bond waits until growth
/// places a cell where the anchor expects it.

use crate::domain::cell::{Cell, Dir};
use crate::domain::jelly::CellId;
use super::board::{Attach, Board, PendingAnchor};
use super::event::{Resolution, StageEvent};
use super::level::{AnchorSpec, LevelError};

/// Bind every declared anchor whose cell exists; queue the rest.
pub fn place_anchors(board: &mut Board, specs: &[AnchorSpec]) -> Result<(), LevelError> {
    for spec in specs {
        let (dx, dy) = spec.dir.delta();
        let neighbor = match board.grid.get(spec.x + dx, spec.y + dy)? {
            Cell::Wall => Attach::Wall,
            Cell::Jelly(c) => Attach::Cell(c),
            Cell::Empty => {
                return Err(LevelError::AnchorNeighborMissing {
                    x: spec.x,
                    y: spec.y,
                    dir: spec.dir,
                })
            }
        };

        // A delayed anchor never looks at its own cell.
        let me = if spec.delayed { Cell::Empty } else { board.grid.get(spec.x, spec.y)? };
        match me {
            Cell::Jelly(me) => {
                board.fuse(me, spec.dir, neighbor);
                board.anchored.push((me, spec.dir));
            }
            Cell::Wall => {
                return Err(LevelError::AnchorOnWall { x: spec.x, y: spec.y });
            }
            Cell::Empty => board.delayed.push(PendingAnchor {
                x: spec.x,
                y: spec.y,
                dir: spec.dir,
                neighbor,
            }),
        }
    }
    tracing::debug!(
        anchored = board.anchored.len(),
        delayed = board.delayed.len(),
        "anchors placed"
    );
    Ok(())
}

/// Where the cell of a pending anchor has to appear. A wall-bound anchor
/// keeps its declared position; a cell-bound one tracks its neighbor.
pub fn expected_position(board: &Board, pending: &PendingAnchor) -> (i32, i32) {
    match pending.neighbor {
        Attach::Wall => (pending.x, pending.y),
        Attach::Cell(c) => {
            let (nx, ny) = board.cell_pos(c);
            let (dx, dy) = pending.dir.delta();
            (nx - dx, ny - dy)
        }
    }
}

/// A cell was just grown: resolve every pending anchor expecting it.
/// Returns how many anchors were resolved.
pub fn check_grown_anchored(board: &mut Board, grown: CellId, out: &mut Resolution) -> usize {
    let pos = board.cell_pos(grown);
    let (hits, rest): (Vec<PendingAnchor>, Vec<PendingAnchor>) = std::mem::take(&mut board.delayed)
        .into_iter()
        .partition(|p| expected_position(board, p) == pos);
    board.delayed = rest;

    for p in &hits {
        board.fuse(grown, p.dir, p.neighbor);
        board.anchored.push((grown, p.dir));
        out.push(StageEvent::Anchored { x: pos.0, y: pos.1, dir: p.dir });
        tracing::debug!(x = pos.0, y = pos.1, dir = p.dir.name(), "delayed anchor resolved");
    }
    hits.len()
}

/// Snapshot form of one pending anchor, at its current expected position.
pub fn pending_spec(board: &Board, pending: &PendingAnchor) -> AnchorSpec {
    let (x, y) = expected_position(board, pending);
    AnchorSpec { x, y, dir: pending.dir, delayed: true }
}

/// Snapshot form of one resolved anchor.
pub fn resolved_spec(board: &Board, cell: CellId, dir: Dir) -> AnchorSpec {
    let (x, y) = board.cell_pos(cell);
    AnchorSpec { x, y, dir, delayed: false }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::level::LevelDescriptor;

    fn level(rows: &[&str], anchors: &[(i32, i32, Dir, bool)]) -> LevelDescriptor {
        let mut l = LevelDescriptor::from_rows(rows);
        l.anchors = anchors
            .iter()
            .map(|&(x, y, dir, delayed)| AnchorSpec { x, y, dir, delayed })
            .collect();
        l
    }

    #[test]
    fn wall_anchor_pins_jelly() {
        let b = Board::from_descriptor(&level(&["x r x", "xxxxx"], &[(2, 0, Dir::Down, false)])).unwrap();
        let j = b.jelly_at(2, 0).unwrap();
        assert!(b.jelly(j).unwrap().immovable);
        assert_eq!(b.anchored.len(), 1);
        assert!(b.delayed.is_empty());
    }

    #[test]
    fn cell_anchor_fuses_jellies() {
        let b = Board::from_descriptor(&level(&["rg"], &[(0, 0, Dir::Right, false)])).unwrap();
        assert_eq!(b.order.len(), 1);
        assert_eq!(b.jelly_at(0, 0), b.jelly_at(1, 0));
        // Anchoring never merges colors.
        assert_eq!(b.blocks, 2);
    }

    #[test]
    fn missing_neighbor_is_an_error() {
        let err = Board::from_descriptor(&level(&["r  "], &[(0, 0, Dir::Right, false)]))
            .err()
            .expect("must fail");
        assert!(matches!(err, LevelError::AnchorNeighborMissing { x: 0, y: 0, dir: Dir::Right }));
    }

    #[test]
    fn anchor_on_wall_is_an_error() {
        let err = Board::from_descriptor(&level(&["xr"], &[(0, 0, Dir::Right, false)]))
            .err()
            .expect("must fail");
        assert!(matches!(err, LevelError::AnchorOnWall { x: 0, y: 0 }));
    }

    #[test]
    fn neighbor_off_grid_is_an_error() {
        let err = Board::from_descriptor(&level(&["r"], &[(0, 0, Dir::Left, false)]))
            .err()
            .expect("must fail");
        assert!(matches!(err, LevelError::OutOfBounds(_)));
    }

    #[test]
    fn absent_cell_is_queued() {
        let b = Board::from_descriptor(&level(&["x  ", "xxx"], &[(1, 0, Dir::Down, false)])).unwrap();
        assert!(b.anchored.is_empty());
        assert_eq!(b.delayed.len(), 1);
        assert_eq!(expected_position(&b, &b.delayed[0]), (1, 0));
    }

    #[test]
    fn delayed_flag_queues_even_over_a_cell() {
        let b = Board::from_descriptor(&level(&["rg"], &[(0, 0, Dir::Right, true)])).unwrap();
        assert_eq!(b.order.len(), 2);
        assert_eq!(b.delayed.len(), 1);
    }

    #[test]
    fn cell_bound_pending_tracks_neighbor() {
        let mut b = Board::from_descriptor(&level(&["  g", "   "], &[(1, 0, Dir::Right, false)])).unwrap();
        let g = b.jelly_at(2, 0).unwrap();
        crate::sim::motion::apply_move(&mut b, &[g], 0, 1).unwrap();
        assert_eq!(expected_position(&b, &b.delayed[0]), (1, 1));
    }

    #[test]
    fn grown_cell_resolves_pending() {
        let mut b = Board::from_descriptor(&level(&["x  ", "xxx"], &[(1, 0, Dir::Down, false)])).unwrap();
        let cell = b.spawn_jelly(crate::domain::color::Color::Red, 1, 0).unwrap();
        let mut out = Resolution::default();
        assert_eq!(check_grown_anchored(&mut b, cell, &mut out), 1);
        assert!(b.delayed.is_empty());
        assert!(b.jelly(b.cell(cell).jelly).unwrap().immovable);
        assert_eq!(out.events, vec![StageEvent::Anchored { x: 1, y: 0, dir: Dir::Down }]);
    }

    #[test]
    fn grown_cell_elsewhere_leaves_pending() {
        let mut b = Board::from_descriptor(&level(&["x  ", "xxx"], &[(1, 0, Dir::Down, false)])).unwrap();
        let cell = b.spawn_jelly(crate::domain::color::Color::Red, 2, 0).unwrap();
        let mut out = Resolution::default();
        assert_eq!(check_grown_anchored(&mut b, cell, &mut out), 0);
        assert_eq!(b.delayed.len(), 1);
        assert!(out.events.is_empty());
    }
}
