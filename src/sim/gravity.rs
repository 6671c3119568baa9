/// Gravity: settle every jelly to rest.
///
/// Each pass tries to drop every tracked jelly by one row (pushing whatever
/// it rests on along, when that can fall too). Passes repeat until one moves
/// nothing. Terminates: the sum of origin rows strictly grows each
/// productive pass and is bounded by the grid height.

use crate::domain::grid::GridError;
use crate::domain::jelly::JellyId;
use super::board::Board;
use super::event::{Phase, Resolution, StageEvent};
use super::motion::{apply_move, compute_moving_set, MoveSet};

/// Run one pass. Returns the jellies that fell.
pub fn fall_once(board: &mut Board) -> Result<Vec<JellyId>, GridError> {
    let mut fell = vec![];
    // `order` does not change during gravity; snapshot it anyway.
    for id in board.order.clone() {
        if let MoveSet::Free(set) = compute_moving_set(board, &[id], 0, 1) {
            apply_move(board, &set, 0, 1)?;
            for j in set {
                if !fell.contains(&j) {
                    fell.push(j);
                }
            }
        }
    }
    Ok(fell)
}

/// Fall to rest. Returns true if anything moved.
pub fn settle_gravity(board: &mut Board, out: &mut Resolution) -> Result<bool, GridError> {
    let mut moved = false;
    let mut passes = 0;
    loop {
        let fell = fall_once(board)?;
        if fell.is_empty() {
            break;
        }
        passes += 1;
        moved = true;
        out.push(StageEvent::Fell { jellies: fell });
        out.frames.push(board.frame(Phase::Falling));
    }
    if moved {
        tracing::trace!(passes, "gravity settled");
    }
    Ok(moved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::level::LevelDescriptor;

    fn board(rows: &[&str]) -> Board {
        Board::from_descriptor(&LevelDescriptor::from_rows(rows)).expect("valid level")
    }

    #[test]
    fn drops_to_floor() {
        let mut b = board(&[
            "x r x",
            "x   x",
            "x   x",
            "xxxxx",
        ]);
        let mut out = Resolution::default();
        assert!(settle_gravity(&mut b, &mut out).unwrap());
        let j = b.jelly_at(2, 2).expect("landed");
        assert_eq!(b.jelly(j).unwrap().origin, (2, 2));
        assert_eq!(out.frames.len(), 2);
        assert!(b.check_occupancy().is_ok());
    }

    #[test]
    fn stacks_fall_together() {
        let mut b = board(&[
            "xgx",
            "xrx",
            "x x",
            "xxx",
        ]);
        let mut out = Resolution::default();
        settle_gravity(&mut b, &mut out).unwrap();
        assert!(b.jelly_at(1, 1).is_some());
        assert!(b.jelly_at(1, 2).is_some());
        assert!(b.jelly_at(1, 0).is_none());
    }

    #[test]
    fn resting_board_is_noop() {
        let mut b = board(&[
            "x x",
            "xrx",
            "xxx",
        ]);
        let mut out = Resolution::default();
        assert!(!settle_gravity(&mut b, &mut out).unwrap());
        assert!(out.events.is_empty());
        assert!(out.frames.is_empty());
    }

    #[test]
    fn immovable_jelly_hangs() {
        let mut b = board(&[
            "xrx",
            "x x",
            "xxx",
        ]);
        let j = b.jelly_at(1, 0).unwrap();
        b.jelly_mut(j).unwrap().immovable = true;
        let mut out = Resolution::default();
        assert!(!settle_gravity(&mut b, &mut out).unwrap());
        assert_eq!(b.jelly(j).unwrap().origin, (1, 0));
    }
}
