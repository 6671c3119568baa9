/// Motion: which jellies move together, and moving them.
///
/// Pushing a jelly pushes everything stacked behind it in the same
/// direction. The moving set is the transitive closure of that push;
/// the move is blocked if any member is immovable or any member cell
/// would enter a wall (the grid boundary counts as wall).

use crate::domain::cell::Cell;
use crate::domain::grid::GridError;
use crate::domain::jelly::JellyId;
use super::board::Board;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MoveSet {
    Blocked,
    /// Jellies to move, seeds first, then in discovery order.
    Free(Vec<JellyId>),
}

/// Closure of jellies that must move with `seeds` by (dx, dy).
/// Read-only: the board is untouched whatever the outcome.
pub fn compute_moving_set(board: &Board, seeds: &[JellyId], dx: i32, dy: i32) -> MoveSet {
    let mut set: Vec<JellyId> = Vec::with_capacity(seeds.len() + 4);
    for &s in seeds {
        if !set.contains(&s) {
            set.push(s);
        }
    }

    // Worklist: jellies appended during the scan are scanned in turn.
    let mut i = 0;
    while i < set.len() {
        let Some(jelly) = board.jelly(set[i]) else { return MoveSet::Blocked };
        if jelly.immovable {
            return MoveSet::Blocked;
        }
        for &c in &jelly.cells {
            let (x, y) = jelly.abs(board.cell(c));
            match board.grid.cell_or_wall(x + dx, y + dy) {
                Cell::Empty => {}
                Cell::Wall => return MoveSet::Blocked,
                Cell::Jelly(other) => {
                    let owner = board.cell(other).jelly;
                    if !set.contains(&owner) {
                        set.push(owner);
                    }
                }
            }
        }
        i += 1;
    }
    MoveSet::Free(set)
}

/// Would any cell of `movers`, shifted by (dx, dy), land on a cell of `still`?
pub fn lands_on(board: &Board, movers: &[JellyId], still: JellyId, dx: i32, dy: i32) -> bool {
    movers.iter().flat_map(|&m| board.member_positions(m)).any(|(_, x, y)| {
        matches!(board.grid.cell_or_wall(x + dx, y + dy),
            Cell::Jelly(c) if board.cell(c).jelly == still)
    })
}

/// Translate `jellies` by (dx, dy). Clears every member cell first, then
/// writes every member cell back, so chained jellies never overwrite each other.
pub fn apply_move(board: &mut Board, jellies: &[JellyId], dx: i32, dy: i32) -> Result<(), GridError> {
    let positions: Vec<_> = jellies.iter().flat_map(|&j| board.member_positions(j)).collect();

    for &(_, x, y) in &positions {
        board.grid.set(x, y, Cell::Empty)?;
    }
    for &j in jellies {
        if let Some(jelly) = board.jelly_mut(j) {
            jelly.translate(dx, dy);
        }
    }
    for &(c, x, y) in &positions {
        board.grid.set(x + dx, y + dy, Cell::Jelly(c))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::level::LevelDescriptor;

    fn board(rows: &[&str]) -> Board {
        Board::from_descriptor(&LevelDescriptor::from_rows(rows)).expect("valid level")
    }

    fn grid_text(b: &Board) -> Vec<String> {
        (0..b.grid.height() as i32).map(|y| {
            (0..b.grid.width() as i32).map(|x| match b.grid.get(x, y).unwrap() {
                Cell::Empty => ' ',
                Cell::Wall => 'x',
                Cell::Jelly(c) => b.cell(c).color.symbol(),
            }).collect()
        }).collect()
    }

    #[test]
    fn free_move_into_empty() {
        let b = board(&["x r  x"]);
        let j = b.jelly_at(2, 0).unwrap();
        assert_eq!(compute_moving_set(&b, &[j], 1, 0), MoveSet::Free(vec![j]));
        assert_eq!(compute_moving_set(&b, &[j], -1, 0), MoveSet::Free(vec![j]));
    }

    #[test]
    fn wall_blocks_and_leaves_grid_untouched() {
        let b = board(&["xr  x"]);
        let before = grid_text(&b);
        let j = b.jelly_at(1, 0).unwrap();
        assert_eq!(compute_moving_set(&b, &[j], -1, 0), MoveSet::Blocked);
        assert_eq!(grid_text(&b), before);
        assert_eq!(b.jelly(j).unwrap().origin, (1, 0));
    }

    #[test]
    fn boundary_blocks() {
        let b = board(&["r  "]);
        let j = b.jelly_at(0, 0).unwrap();
        assert_eq!(compute_moving_set(&b, &[j], -1, 0), MoveSet::Blocked);
        assert_eq!(compute_moving_set(&b, &[j], 0, 1), MoveSet::Blocked);
    }

    #[test]
    fn pushes_chain_transitively() {
        let b = board(&["x rgb x"]);
        let r = b.jelly_at(2, 0).unwrap();
        let g = b.jelly_at(3, 0).unwrap();
        let bl = b.jelly_at(4, 0).unwrap();
        assert_eq!(compute_moving_set(&b, &[r], 1, 0), MoveSet::Free(vec![r, g, bl]));
    }

    #[test]
    fn chain_against_wall_is_blocked() {
        let b = board(&["x rgbx"]);
        let r = b.jelly_at(2, 0).unwrap();
        assert_eq!(compute_moving_set(&b, &[r], 1, 0), MoveSet::Blocked);
    }

    #[test]
    fn immovable_member_blocks() {
        let mut b = board(&["x rg  x"]);
        let g = b.jelly_at(3, 0).unwrap();
        b.jelly_mut(g).unwrap().immovable = true;
        let r = b.jelly_at(2, 0).unwrap();
        assert_eq!(compute_moving_set(&b, &[r], 1, 0), MoveSet::Blocked);
        assert_ne!(compute_moving_set(&b, &[r], -1, 0), MoveSet::Blocked);
    }

    #[test]
    fn apply_chain_move() {
        let mut b = board(&["x rgb x"]);
        let r = b.jelly_at(2, 0).unwrap();
        let MoveSet::Free(set) = compute_moving_set(&b, &[r], 1, 0) else { panic!("blocked") };
        apply_move(&mut b, &set, 1, 0).unwrap();
        assert_eq!(grid_text(&b), vec!["x  rgbx"]);
        assert!(b.check_occupancy().is_ok());
    }

    #[test]
    fn lands_on_detects_overlap() {
        let b = board(&["rg "]);
        let r = b.jelly_at(0, 0).unwrap();
        let g = b.jelly_at(1, 0).unwrap();
        assert!(lands_on(&b, &[r], g, 1, 0));
        assert!(!lands_on(&b, &[g], r, 1, 0));
    }
}
