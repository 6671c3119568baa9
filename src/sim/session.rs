/// Session: the playing state around one stage.
///
/// Holds the level catalog, the loaded stage, the cursor and the playback
/// queue. A resolved move arrives as a list of frames; they are shown one
/// at a time, each held for the configured step (plus the growth pause
/// after growth frames). While frames are pending the session is busy and
/// every request is dropped.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::PacingConfig;
use crate::domain::cell::Dir;
use crate::domain::grid::GridError;
use super::event::{Frame, Phase, Resolution};
use super::level::{write_level_file, LevelDef, LevelError};
use super::stage::{SlideOutcome, Stage, UndoOutcome};

/// Sound cue for the frame that just came on screen.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Cue {
    Slide,
    Merge,
    Grow,
    Solved,
    Blocked,
}

struct PlaybackStep {
    frame: Frame,
    remaining: Duration,
    cues: Vec<Cue>,
}

pub struct Session {
    pub levels: Vec<LevelDef>,
    pub current: usize,
    pub stage: Stage,
    /// Grid coordinate under the cursor.
    pub cursor: (i32, i32),

    playback: VecDeque<PlaybackStep>,
    cues: Vec<Cue>,
    pacing: PacingConfig,

    // ── Messages ──
    pub message: String,
    pub message_timer: u32,
}

impl Session {
    /// Open the catalog at `index` (0-based, clamped to the catalog).
    pub fn new(levels: Vec<LevelDef>, index: usize, pacing: PacingConfig) -> Result<Self, LevelError> {
        let last = levels.len().checked_sub(1).ok_or(LevelError::NoLevels)?;
        let current = index.min(last);
        let stage = Stage::load(&levels[current].level)?;
        let mut session = Session {
            levels,
            current,
            stage,
            cursor: (0, 0),
            playback: VecDeque::new(),
            cues: vec![],
            pacing,
            message: String::new(),
            message_timer: 0,
        };
        session.center_cursor();
        tracing::info!(level = %session.level_name(), "session started");
        Ok(session)
    }

    pub fn level_name(&self) -> &str {
        &self.levels[self.current].name
    }

    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }

    /// Frames still to show, or the stage itself mid-resolution.
    pub fn is_busy(&self) -> bool {
        !self.playback.is_empty() || self.stage.is_busy()
    }

    /// Solved and fully played back.
    pub fn show_solved(&self) -> bool {
        self.playback.is_empty() && self.stage.is_complete()
    }

    /// What to draw: the pending frame, or the board at rest.
    pub fn view(&self) -> Frame {
        match self.playback.front() {
            Some(step) => step.frame.clone(),
            None => self.stage.board().frame(Phase::Sliding),
        }
    }

    /// Sound cues raised since the last call.
    pub fn take_cues(&mut self) -> Vec<Cue> {
        std::mem::take(&mut self.cues)
    }
}

// ══════════════════════════════════════════════════════════════
// Requests
// ══════════════════════════════════════════════════════════════

impl Session {
    pub fn move_cursor(&mut self, dx: i32, dy: i32) {
        let board = self.stage.board();
        let w = board.grid.width() as i32;
        let h = board.grid.height() as i32;
        self.cursor.0 = (self.cursor.0 + dx).clamp(0, w - 1);
        self.cursor.1 = (self.cursor.1 + dy).clamp(0, h - 1);
    }

    pub fn slide_at_cursor(&mut self, dir: Dir) -> Result<(), GridError> {
        let (x, y) = self.cursor;
        self.slide_at(x, y, dir)
    }

    /// Slide the jelly at (x, y). Empty cells and walls are ignored.
    pub fn slide_at(&mut self, x: i32, y: i32, dir: Dir) -> Result<(), GridError> {
        if self.is_busy() {
            return Ok(());
        }
        let Some(jelly) = self.stage.jelly_at(x, y) else { return Ok(()) };
        match self.stage.request_slide(jelly, dir)? {
            SlideOutcome::Moved(res) => {
                if dir.delta().1 == 0 {
                    self.cursor = (x, y);
                    self.move_cursor(dir.delta().0, 0);
                }
                self.enqueue(res);
            }
            SlideOutcome::Blocked => self.cues.push(Cue::Blocked),
            SlideOutcome::Ignored(why) => tracing::debug!(?why, "slide ignored"),
        }
        Ok(())
    }

    pub fn undo(&mut self) {
        if self.is_busy() {
            return;
        }
        match self.stage.undo() {
            Ok(UndoOutcome::Restored) => self.set_message("Undo", 20),
            Ok(UndoOutcome::Ignored(why)) => tracing::debug!(?why, "undo ignored"),
            Err(e) => {
                tracing::warn!(error = %e, "undo failed");
                self.set_message("Undo failed", 40);
            }
        }
    }

    pub fn reset(&mut self) {
        self.playback.clear();
        match self.stage.reset() {
            Ok(()) => self.set_message("Level Restarted", 30),
            Err(e) => {
                tracing::warn!(error = %e, "reset failed");
                self.set_message("Reset failed", 40);
            }
        }
    }

    pub fn next_level(&mut self) {
        if self.current + 1 < self.levels.len() {
            self.switch_to(self.current + 1);
        }
    }

    pub fn prev_level(&mut self) {
        if self.current > 0 {
            self.switch_to(self.current - 1);
        }
    }

    /// Write the board as it stands to `dir` as a loadable level file.
    pub fn export(&mut self, dir: &Path) -> Result<PathBuf, LevelError> {
        let name = format!("{} (move {})", self.level_name(), self.stage.moves());
        let text = write_level_file(&name, &self.stage.save_descriptor())?;
        let path = dir.join(format!("export-{:02}-{:03}.toml", self.current + 1, self.stage.moves()));
        std::fs::write(&path, text)
            .map_err(|source| LevelError::Io { path: path.clone(), source })?;
        tracing::info!(path = %path.display(), "board exported");
        self.set_message("Exported", 40);
        Ok(path)
    }

    /// Load catalog entry `index`. A level that fails to load leaves the
    /// current one in place.
    pub fn switch_to(&mut self, index: usize) {
        let Some(def) = self.levels.get(index) else { return };
        let name = def.name.clone();
        match Stage::load(&def.level) {
            Ok(stage) => {
                self.stage = stage;
                self.current = index;
                self.playback.clear();
                self.center_cursor();
                tracing::info!(level = %name, "level switched");
                self.set_message(&name, 40);
            }
            Err(e) => {
                tracing::warn!(level = %name, error = %e, "level failed to load");
                self.set_message(&format!("{name}: {e}"), 80);
            }
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Playback
// ══════════════════════════════════════════════════════════════

impl Session {
    fn enqueue(&mut self, res: Resolution) {
        let count = res.frames.len();
        for (i, frame) in res.frames.into_iter().enumerate() {
            let mut remaining = Duration::from_millis(self.pacing.step_ms);
            let mut cues = vec![];
            match frame.phase {
                Phase::Sliding => cues.push(Cue::Slide),
                Phase::Falling => {}
                Phase::Merging => cues.push(Cue::Merge),
                Phase::Growing => {
                    cues.push(Cue::Grow);
                    remaining += Duration::from_millis(self.pacing.grow_ms);
                }
            }
            if res.completed && i + 1 == count {
                cues.push(Cue::Solved);
            }
            self.playback.push_back(PlaybackStep { frame, remaining, cues });
        }
        if res.completed {
            self.set_message("Solved!", 0);
        }
        self.start_front();
    }

    fn start_front(&mut self) {
        if let Some(step) = self.playback.front_mut() {
            self.cues.append(&mut step.cues);
        }
    }

    /// Advance playback and timers by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        let mut left = dt;
        while let Some(step) = self.playback.front_mut() {
            if step.remaining > left {
                step.remaining -= left;
                break;
            }
            left -= step.remaining;
            self.playback.pop_front();
            self.start_front();
        }

        if self.message_timer > 0 {
            self.message_timer -= 1;
            if self.message_timer == 0 {
                self.message.clear();
            }
        }
    }

    fn center_cursor(&mut self) {
        let board = self.stage.board();
        self.cursor = match board.order.first() {
            Some(&id) => board.member_positions(id).first().map_or((0, 0), |&(_, x, y)| (x, y)),
            None => (board.grid.width() as i32 / 2, board.grid.height() as i32 / 2),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::level::{embedded_levels, LevelDescriptor};

    fn pacing() -> PacingConfig {
        PacingConfig { step_ms: 10, grow_ms: 50, tick_rate_ms: 10 }
    }

    fn session_from(rows: &[&str]) -> Session {
        let def = LevelDef { name: "test".into(), level: LevelDescriptor::from_rows(rows) };
        Session::new(vec![def], 0, pacing()).expect("valid level")
    }

    #[test]
    fn empty_catalog_is_an_error() {
        assert!(matches!(Session::new(vec![], 0, pacing()), Err(LevelError::NoLevels)));
    }

    #[test]
    fn start_index_is_clamped() {
        let levels = embedded_levels();
        let n = levels.len();
        let s = Session::new(levels, 999, pacing()).unwrap();
        assert_eq!(s.current, n - 1);
    }

    #[test]
    fn cursor_starts_on_first_jelly_and_stays_inside() {
        let mut s = session_from(&["x r x", "xxxxx"]);
        assert_eq!(s.cursor, (2, 0));
        s.move_cursor(-10, 10);
        assert_eq!(s.cursor, (0, 1));
    }

    #[test]
    fn playback_blocks_input_until_drained() {
        let mut s = session_from(&[
            "x r  x",
            "x    x",
            "xxxxxx",
        ]);
        s.slide_at_cursor(Dir::Right).unwrap();
        assert!(s.is_busy());
        assert_eq!(s.take_cues(), vec![Cue::Slide]);
        assert_eq!(s.stage.moves(), 1);

        // Dropped while frames are pending.
        s.slide_at_cursor(Dir::Right).unwrap();
        assert_eq!(s.stage.moves(), 1);

        s.advance(Duration::from_millis(1000));
        assert!(!s.is_busy());
        assert_eq!(s.cursor, (3, 0));
    }

    #[test]
    fn blocked_slide_raises_cue_only() {
        let mut s = session_from(&["xr x", "xxxx"]);
        s.slide_at(1, 0, Dir::Left).unwrap();
        assert!(!s.is_busy());
        assert_eq!(s.take_cues(), vec![Cue::Blocked]);
    }

    #[test]
    fn growth_frames_hold_longer() {
        let mut level = LevelDescriptor::from_rows(&[
            "x   x",
            "x   x",
            "xr  x",
            "xxxxx",
        ]);
        level.growers.push(crate::sim::level::GrowerSpec {
            x: 2, y: 3, dir: Dir::Up, color: "red".into(),
        });
        let def = LevelDef { name: "grow".into(), level };
        let mut s = Session::new(vec![def], 0, pacing()).unwrap();
        s.slide_at(1, 2, Dir::Right).unwrap();
        // Slide frame, then growth, then merge.
        s.advance(Duration::from_millis(10));
        assert_eq!(s.view().phase, Phase::Growing);
        s.advance(Duration::from_millis(30));
        assert_eq!(s.view().phase, Phase::Growing);
        s.advance(Duration::from_millis(30));
        assert_eq!(s.view().phase, Phase::Merging);
        let cues: Vec<Cue> = s.take_cues();
        assert_eq!(cues, vec![Cue::Slide, Cue::Grow, Cue::Merge, Cue::Solved]);
        s.advance(Duration::from_millis(10));
        assert!(s.show_solved());
    }

    #[test]
    fn switching_levels_moves_through_catalog() {
        let mut s = Session::new(embedded_levels(), 0, pacing()).unwrap();
        s.prev_level();
        assert_eq!(s.current, 0);
        s.next_level();
        assert_eq!(s.current, 1);
        assert_eq!(s.stage.moves(), 0);
    }

    #[test]
    fn export_writes_a_loadable_level() {
        let mut s = session_from(&["x r  x", "xxxxxx"]);
        s.slide_at_cursor(Dir::Right).unwrap();
        s.advance(Duration::from_millis(1000));
        let dir = std::env::temp_dir().join(format!("jellyslide-export-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = s.export(&dir).unwrap();
        let def = crate::sim::level::read_level_file(&path).unwrap();
        assert_eq!(def.name, "test (move 1)");
        assert_eq!(def.level, s.stage.save_descriptor());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn broken_level_keeps_current() {
        let good = LevelDef { name: "good".into(), level: LevelDescriptor::from_rows(&["xrx"]) };
        let bad = LevelDef { name: "bad".into(), level: LevelDescriptor::from_rows(&["x?x"]) };
        let mut s = Session::new(vec![good, bad], 0, pacing()).unwrap();
        s.next_level();
        assert_eq!(s.current, 0);
        assert!(s.message.starts_with("bad"));
    }
}
