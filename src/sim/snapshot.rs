/// Undo snapshots: the board written back out as a level descriptor.
///
/// ## What is captured
///   - map:     every coordinate as its textual symbol
///   - anchors: resolved anchors at their cell's current position,
///              then pending anchors (marked delayed) where they expect a cell
///   - growers: unfired growers at their host's current position
///
/// Merges are not recorded: reloading the map re-runs merging, which
/// rebuilds them from touching same-color cells.

use crate::domain::cell::Cell;
use super::anchor::{pending_spec, resolved_spec};
use super::board::Board;
use super::level::{AnchorSpec, GrowerSpec, LevelDescriptor};

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

pub fn capture(board: &Board) -> LevelDescriptor {
    LevelDescriptor {
        map: capture_map(board),
        anchors: capture_anchors(board),
        growers: capture_growers(board),
    }
}

// ══════════════════════════════════════════════════════════════
// Sections
// ══════════════════════════════════════════════════════════════

fn capture_map(board: &Board) -> Vec<String> {
    let mut rows = vec![String::with_capacity(board.grid.width()); board.grid.height()];
    for (_, y, cell) in board.grid.iter() {
        let ch = match cell {
            Cell::Empty => ' ',
            Cell::Wall => 'x',
            Cell::Jelly(c) => board.cell(c).color.symbol(),
        };
        rows[y as usize].push(ch);
    }
    rows
}

fn capture_anchors(board: &Board) -> Vec<AnchorSpec> {
    let resolved = board.anchored.iter().map(|&(c, dir)| resolved_spec(board, c, dir));
    let pending = board.delayed.iter().map(|p| pending_spec(board, p));
    resolved.chain(pending).collect()
}

fn capture_growers(board: &Board) -> Vec<GrowerSpec> {
    board.growers.iter().map(|g| {
        let (x, y) = board.grower_pos(g);
        GrowerSpec { x, y, dir: g.dir, color: g.color.name() }
    }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cell::Dir;
    use crate::sim::motion::apply_move;

    fn board(l: &LevelDescriptor) -> Board {
        Board::from_descriptor(l).expect("valid level")
    }

    #[test]
    fn map_round_trips_symbols() {
        let l = LevelDescriptor::from_rows(&["xxxx", "xr1x", "x gx", "xxxx"]);
        let snap = capture(&board(&l));
        assert_eq!(snap.map, l.map);
        assert!(snap.anchors.is_empty());
        assert!(snap.growers.is_empty());
    }

    #[test]
    fn short_rows_come_back_padded() {
        let l = LevelDescriptor::from_rows(&["xxx", "x", "xxx"]);
        assert_eq!(capture(&board(&l)).map, vec!["xxx", "x  ", "xxx"]);
    }

    #[test]
    fn anchors_follow_their_cells() {
        let mut l = LevelDescriptor::from_rows(&["   ", " rg", "   "]);
        l.anchors.push(AnchorSpec { x: 1, y: 1, dir: Dir::Right, delayed: false });
        let mut b = board(&l);
        let j = b.jelly_at(1, 1).unwrap();
        apply_move(&mut b, &[j], -1, 1).unwrap();
        let snap = capture(&b);
        assert_eq!(snap.anchors, vec![AnchorSpec { x: 0, y: 2, dir: Dir::Right, delayed: false }]);
    }

    #[test]
    fn pending_anchor_is_written_delayed() {
        let mut l = LevelDescriptor::from_rows(&["x  ", "xxx"]);
        l.anchors.push(AnchorSpec { x: 1, y: 0, dir: Dir::Down, delayed: false });
        let snap = capture(&board(&l));
        assert_eq!(snap.anchors, vec![AnchorSpec { x: 1, y: 0, dir: Dir::Down, delayed: true }]);
    }

    #[test]
    fn hosted_grower_travels() {
        let mut l = LevelDescriptor::from_rows(&["   ", " g ", "   "]);
        l.growers.push(GrowerSpec { x: 1, y: 1, dir: Dir::Up, color: "black3".into() });
        let mut b = board(&l);
        let j = b.jelly_at(1, 1).unwrap();
        apply_move(&mut b, &[j], 1, 0).unwrap();
        let snap = capture(&b);
        assert_eq!(snap.growers, vec![GrowerSpec { x: 2, y: 1, dir: Dir::Up, color: "black3".into() }]);
    }

    #[test]
    fn snapshot_reloads_to_same_map() {
        let mut l = LevelDescriptor::from_rows(&["x    x", "x r gx", "xxxxxx"]);
        l.growers.push(GrowerSpec { x: 2, y: 2, dir: Dir::Up, color: "red".into() });
        let b = board(&l);
        let snap = capture(&b);
        let again = capture(&board(&snap));
        assert_eq!(again, snap);
    }
}
