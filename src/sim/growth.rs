/// Growth: growers spawn a new cell once a matching jelly can be pushed
/// away from them.
///
/// A grower lives in a wall or in a jelly cell (its host) and faces `dir`.
/// The activator is the jelly cell at host + dir. When it has the grower's
/// color, the activator's jelly is pushed one step along `dir` and a new
/// single-cell jelly appears at host + dir. A grower hosted by a jelly may
/// instead push its own jelly the opposite way, leaving the activator in
/// place and spawning at the host's old position.
///
/// When both pushes are blocked the grower stays and is retried on the
/// next settle.

use crate::domain::cell::Cell;
use crate::domain::grid::GridError;
use crate::domain::jelly::JellyId;
use super::anchor::check_grown_anchored;
use super::board::{Attach, Board};
use super::event::{Phase, Resolution, StageEvent};
use super::merge::settle_merges;
use super::motion::{apply_move, compute_moving_set, lands_on, MoveSet};

/// How a triggered grower makes room.
struct Plan {
    grower: usize,
    movers: Vec<JellyId>,
    dx: i32,
    dy: i32,
    spawn: (i32, i32),
}

fn plan_growth(board: &Board) -> Option<Plan> {
    for (i, g) in board.growers.iter().enumerate() {
        let (dx, dy) = g.dir.delta();
        let (hx, hy) = board.grower_pos(g);
        let (ax, ay) = (hx + dx, hy + dy);

        let Cell::Jelly(act) = board.grid.cell_or_wall(ax, ay) else { continue };
        if board.cell(act).color != g.color {
            continue;
        }
        let activator = board.cell(act).jelly;
        let host_jelly = match g.host {
            Attach::Wall => None,
            Attach::Cell(c) => Some(board.cell(c).jelly),
        };
        if host_jelly == Some(activator) {
            continue;
        }

        // Forward: shove the activator away from the host.
        if let MoveSet::Free(set) = compute_moving_set(board, &[activator], dx, dy) {
            if host_jelly.map_or(true, |h| !set.contains(&h)) {
                return Some(Plan { grower: i, movers: set, dx, dy, spawn: (ax, ay) });
            }
            continue;
        }

        // Reverse: shove the host away from the activator.
        let Some(host) = host_jelly else { continue };
        let MoveSet::Free(set) = compute_moving_set(board, &[activator], -dx, -dy) else { continue };
        let movers: Vec<JellyId> = set.into_iter().filter(|&j| j != activator).collect();
        if !movers.contains(&host) || lands_on(board, &movers, activator, -dx, -dy) {
            continue;
        }
        return Some(Plan { grower: i, movers, dx: -dx, dy: -dy, spawn: (hx, hy) });
    }
    None
}

/// Trigger the first grower that can fire. Returns false if none could.
pub fn try_one_growth(board: &mut Board, out: &mut Resolution) -> Result<bool, GridError> {
    let Some(plan) = plan_growth(board) else { return Ok(false) };

    apply_move(board, &plan.movers, plan.dx, plan.dy)?;
    let grower = board.growers.remove(plan.grower);
    let (x, y) = plan.spawn;
    // The grower was already counted as a block at load.
    let cell = board.spawn_jelly(grower.color, x, y)?;

    tracing::debug!(x, y, color = %grower.color.name(), "grew");
    out.push(StageEvent::Grew { x, y, color: grower.color });
    check_grown_anchored(board, cell, out);
    out.frames.push(board.frame(Phase::Growing));
    settle_merges(board, out);
    Ok(true)
}

/// Fire growers one by one until none can. Returns how many grew.
pub fn settle_growth(board: &mut Board, out: &mut Resolution) -> Result<usize, GridError> {
    let mut grown = 0;
    while try_one_growth(board, out)? {
        grown += 1;
    }
    Ok(grown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cell::Dir;
    use crate::domain::color::Color;
    use crate::sim::level::{AnchorSpec, GrowerSpec, LevelDescriptor};

    fn level(rows: &[&str], growers: &[(i32, i32, Dir, &str)]) -> LevelDescriptor {
        let mut l = LevelDescriptor::from_rows(rows);
        l.growers = growers
            .iter()
            .map(|&(x, y, dir, color)| GrowerSpec { x, y, dir, color: color.to_string() })
            .collect();
        l
    }

    fn board(l: &LevelDescriptor) -> Board {
        Board::from_descriptor(l).expect("valid level")
    }

    #[test]
    fn wall_grower_pushes_activator_up() {
        let mut b = board(&level(&[
            "x   x",
            "x   x",
            "x r x",
            "xxxxx",
        ], &[(2, 3, Dir::Up, "red")]));
        assert_eq!(b.blocks, 2);
        let mut out = Resolution::default();
        assert_eq!(settle_growth(&mut b, &mut out).unwrap(), 1);
        assert!(b.growers.is_empty());
        // The new cell merged with the pushed activator.
        assert_eq!(b.blocks, 1);
        assert_eq!(out.growths(), 1);
        assert!(out.events.contains(&StageEvent::Grew { x: 2, y: 2, color: Color::Red }));
        assert!(b.check_occupancy().is_ok());
        assert_eq!(b.jelly_at(2, 1), b.jelly_at(2, 2));
    }

    #[test]
    fn wrong_color_does_not_trigger() {
        let mut b = board(&level(&["x   x", "x g x", "xxxxx"], &[(2, 2, Dir::Up, "red")]));
        let mut out = Resolution::default();
        assert_eq!(settle_growth(&mut b, &mut out).unwrap(), 0);
        assert_eq!(b.growers.len(), 1);
    }

    #[test]
    fn blocked_wall_grower_waits() {
        let mut b = board(&level(&["xxxxx", "x r x", "xxxxx"], &[(2, 2, Dir::Up, "red")]));
        let mut out = Resolution::default();
        assert_eq!(settle_growth(&mut b, &mut out).unwrap(), 0);
        assert_eq!(b.growers.len(), 1);
        assert_eq!(b.blocks, 2);
        assert!(out.events.is_empty());
    }

    #[test]
    fn hosted_grower_pushes_its_host_backwards() {
        // Grower inside g at (3,1) faces right towards r at (4,1), which is
        // against the wall; g slides left instead and the cell appears at (3,1).
        let mut b = board(&level(&[
            "xxxxxx",
            "x  grx",
            "xxxxxx",
        ], &[(3, 1, Dir::Right, "red")]));
        let mut out = Resolution::default();
        assert_eq!(settle_growth(&mut b, &mut out).unwrap(), 1);
        let g = b.jelly_at(2, 1).unwrap();
        assert_eq!(b.cell(b.jelly(g).unwrap().cells[0]).color, Color::Green);
        assert!(out.events.contains(&StageEvent::Grew { x: 3, y: 1, color: Color::Red }));
        assert_eq!(b.jelly_at(3, 1), b.jelly_at(4, 1));
        assert!(b.check_occupancy().is_ok());
    }

    #[test]
    fn hosted_grower_blocked_both_ways() {
        let mut b = board(&level(&["xxxx", "xgrx", "xxxx"], &[(1, 1, Dir::Right, "red")]));
        let mut out = Resolution::default();
        assert_eq!(settle_growth(&mut b, &mut out).unwrap(), 0);
        assert_eq!(b.growers.len(), 1);
    }

    #[test]
    fn grower_in_activator_jelly_is_skipped() {
        let mut l = level(&["x   x", "x gr x", "xxxxxx"], &[(2, 1, Dir::Right, "red")]);
        l.anchors.push(AnchorSpec { x: 2, y: 1, dir: Dir::Right, delayed: false });
        let mut b = board(&l);
        let mut out = Resolution::default();
        assert_eq!(settle_growth(&mut b, &mut out).unwrap(), 0);
    }

    #[test]
    fn grown_cell_resolves_delayed_anchor() {
        let mut l = level(&[
            "x   x",
            "x   x",
            "x r x",
            "xxxxx",
        ], &[(2, 3, Dir::Up, "red")]);
        l.anchors.push(AnchorSpec { x: 2, y: 2, dir: Dir::Down, delayed: true });
        let mut b = board(&l);
        let mut out = Resolution::default();
        settle_growth(&mut b, &mut out).unwrap();
        assert!(b.delayed.is_empty());
        assert!(out.events.contains(&StageEvent::Anchored { x: 2, y: 2, dir: Dir::Down }));
        let j = b.jelly_at(2, 2).unwrap();
        assert!(b.jelly(j).unwrap().immovable);
    }
}
