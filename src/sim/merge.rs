/// Merging: touching same-color cells fuse into one jelly.
///
/// One merge at a time, scanning jellies in `order`, their cells in member
/// order, and each cell's right then down neighbor (left/up pairs are seen
/// from the other side). After each merge the scan restarts, since the
/// jelly list has changed.

use crate::domain::cell::{Cell, Dir};
use super::board::{Attach, Board};
use super::event::{Phase, Resolution, StageEvent};

const SCAN: [Dir; 2] = [Dir::Right, Dir::Down];

/// Perform the first pending merge. Returns false if there was none.
pub fn try_one_merge(board: &mut Board, out: &mut Resolution) -> bool {
    let mut found = None;
    'scan: for &id in &board.order {
        for (cid, x, y) in board.member_positions(id) {
            let cell = board.cell(cid);
            for dir in SCAN {
                if cell.has_merged(dir) {
                    continue;
                }
                let (dx, dy) = dir.delta();
                let Cell::Jelly(other) = board.grid.cell_or_wall(x + dx, y + dy) else { continue };
                if board.cell(other).color != cell.color {
                    continue;
                }
                found = Some((cid, other, dir, x, y));
                break 'scan;
            }
        }
    }
    let Some((cid, other, dir, x, y)) = found else { return false };

    let unified = board.groups.union(cid, other);
    if unified {
        board.blocks = board.blocks.saturating_sub(1);
    }
    board.fuse(cid, dir, Attach::Cell(other));
    board.cells[cid.0].merged[dir.index()] = true;

    tracing::trace!(x, y, dir = dir.name(), unified, blocks = board.blocks, "merged");
    out.push(StageEvent::Merged { x, y, dir, unified });
    out.frames.push(board.frame(Phase::Merging));
    true
}

/// Merge until nothing touches. Raises the completion signal the first time
/// a merge leaves the board complete. Returns true if anything merged.
pub fn settle_merges(board: &mut Board, out: &mut Resolution) -> bool {
    let mut merged = false;
    while try_one_merge(board, out) {
        merged = true;
    }
    if merged && board.is_complete() && !board.solved_signalled {
        board.solved_signalled = true;
        out.completed = true;
        out.push(StageEvent::Completed);
        tracing::info!(blocks = board.blocks, colors = board.colors, "level complete");
    }
    merged
}
