/// Stage: one loaded level and the per-move resolution pipeline.
///
/// ## Move pipeline
///
///   request_slide(jelly, dir)
///     → moving set (blocked ⇒ no-op, nothing recorded)
///     → history snapshot
///     → Sliding → Falling → Merging → Growing (growth re-runs merging)
///     → Idle
///
/// Every phase runs to a fixed point before the next one starts; the call
/// returns only when the board is at rest. Undo and reset rebuild the whole
/// stage from a descriptor, exactly like loading a level.

use crate::domain::cell::Dir;
use crate::domain::grid::GridError;
use crate::domain::jelly::JellyId;
use super::board::Board;
use super::event::{Phase, Resolution, StageEvent};
use super::gravity::settle_gravity;
use super::growth::settle_growth;
use super::level::{LevelDescriptor, LevelError};
use super::merge::settle_merges;
use super::motion::{apply_move, compute_moving_set, MoveSet};
use super::snapshot;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StageState {
    Idle,
    Resolving(Phase),
}

/// Why a request was dropped. Never an error: illegal moves simply don't happen.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum InvalidRequest {
    Busy,
    UnknownJelly,
    NothingToUndo,
}

#[derive(Debug)]
pub enum SlideOutcome {
    Moved(Resolution),
    Blocked,
    Ignored(InvalidRequest),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum UndoOutcome {
    Restored,
    Ignored(InvalidRequest),
}

pub struct Stage {
    board: Board,
    /// The level as declared, for reset.
    level: LevelDescriptor,
    /// Pre-move snapshots, oldest first.
    history: Vec<LevelDescriptor>,
    state: StageState,
}

// ══════════════════════════════════════════════════════════════
// Construction
// ══════════════════════════════════════════════════════════════

impl Stage {
    /// Load a level: build the board and run the initial merge pass.
    pub fn load(level: &LevelDescriptor) -> Result<Self, LevelError> {
        let mut board = Board::from_descriptor(level)?;
        let mut opening = Resolution::default();
        settle_merges(&mut board, &mut opening);
        // A level complete at load never signals again.
        board.solved_signalled |= board.is_complete();
        Ok(Stage {
            board,
            level: level.clone(),
            history: vec![],
            state: StageState::Idle,
        })
    }

    /// Back to the level as declared. History is dropped.
    pub fn reset(&mut self) -> Result<(), LevelError> {
        let level = self.level.clone();
        *self = Stage::load(&level)?;
        tracing::debug!("stage reset");
        Ok(())
    }
}

// ══════════════════════════════════════════════════════════════
// Requests
// ══════════════════════════════════════════════════════════════

impl Stage {
    pub fn request_slide(&mut self, jelly: JellyId, dir: Dir) -> Result<SlideOutcome, GridError> {
        if self.is_busy() {
            return Ok(SlideOutcome::Ignored(InvalidRequest::Busy));
        }
        if !self.board.is_live(jelly) {
            return Ok(SlideOutcome::Ignored(InvalidRequest::UnknownJelly));
        }

        let (dx, dy) = dir.delta();
        let MoveSet::Free(set) = compute_moving_set(&self.board, &[jelly], dx, dy) else {
            tracing::debug!(?jelly, dir = dir.name(), "slide blocked");
            return Ok(SlideOutcome::Blocked);
        };

        self.history.push(snapshot::capture(&self.board));
        let resolved = self.resolve(set, dx, dy, dir);
        self.state = StageState::Idle;
        let out = match resolved {
            Ok(out) => out,
            Err(e) => {
                tracing::warn!(error = %e, "slide failed, board rolled back");
                if let Some(before) = self.history.pop().and_then(|snap| Stage::load(&snap).ok()) {
                    self.board = before.board;
                }
                return Err(e);
            }
        };
        debug_assert_eq!(self.board.check_occupancy(), Ok(()));

        tracing::debug!(
            ?jelly,
            dir = dir.name(),
            frames = out.frames.len(),
            merges = out.merges(),
            growths = out.growths(),
            blocks = self.board.blocks,
            "slide resolved"
        );
        Ok(SlideOutcome::Moved(out))
    }

    /// Slide, then run every phase to rest. `state` tracks the running phase.
    fn resolve(&mut self, set: Vec<JellyId>, dx: i32, dy: i32, dir: Dir) -> Result<Resolution, GridError> {
        let mut out = Resolution::default();

        self.state = StageState::Resolving(Phase::Sliding);
        apply_move(&mut self.board, &set, dx, dy)?;
        out.push(StageEvent::Slid { jellies: set, dir });
        out.frames.push(self.board.frame(Phase::Sliding));

        self.state = StageState::Resolving(Phase::Falling);
        settle_gravity(&mut self.board, &mut out)?;

        self.state = StageState::Resolving(Phase::Merging);
        settle_merges(&mut self.board, &mut out);

        self.state = StageState::Resolving(Phase::Growing);
        settle_growth(&mut self.board, &mut out)?;
        Ok(out)
    }

    /// Restore the state before the last committed move.
    pub fn undo(&mut self) -> Result<UndoOutcome, LevelError> {
        if self.is_busy() {
            return Ok(UndoOutcome::Ignored(InvalidRequest::Busy));
        }
        let Some(snap) = self.history.pop() else {
            return Ok(UndoOutcome::Ignored(InvalidRequest::NothingToUndo));
        };
        let mut restored = match Stage::load(&snap) {
            Ok(stage) => stage,
            Err(e) => {
                tracing::warn!(error = %e, "undo snapshot failed to load");
                self.history.push(snap);
                return Err(e);
            }
        };
        restored.level = std::mem::take(&mut self.level);
        restored.history = std::mem::take(&mut self.history);
        *self = restored;
        tracing::debug!(remaining = self.history.len(), "undo");
        Ok(UndoOutcome::Restored)
    }
}

// ══════════════════════════════════════════════════════════════
// Queries
// ══════════════════════════════════════════════════════════════

impl Stage {
    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn is_busy(&self) -> bool {
        self.state != StageState::Idle
    }

    pub fn is_complete(&self) -> bool {
        self.board.is_complete()
    }

    /// Committed moves still on the undo stack.
    pub fn moves(&self) -> usize {
        self.history.len()
    }

    pub fn num_blocks(&self) -> usize {
        self.board.blocks
    }

    pub fn num_colors(&self) -> usize {
        self.board.colors
    }

    pub fn jelly_at(&self, x: i32, y: i32) -> Option<JellyId> {
        self.board.jelly_at(x, y)
    }

    /// The current board as a loadable level descriptor.
    pub fn save_descriptor(&self) -> LevelDescriptor {
        snapshot::capture(&self.board)
    }
}
