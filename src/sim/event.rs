/// Events and frames emitted while a move resolves.
/// The presentation layer consumes these for animation/sound at its own pace;
/// the engine never waits on it.

use crate::domain::cell::Dir;
use crate::domain::color::Color;
use crate::domain::jelly::JellyId;

/// Ordered phases of one move resolution.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Sliding,
    Falling,
    Merging,
    Growing,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StageEvent {
    Slid { jellies: Vec<JellyId>, dir: Dir },
    Fell { jellies: Vec<JellyId> },
    /// Cell at (x, y) merged with its neighbor across `dir`.
    /// `unified` = two color groups became one.
    Merged { x: i32, y: i32, dir: Dir, unified: bool },
    Anchored { x: i32, y: i32, dir: Dir },
    Grew { x: i32, y: i32, color: Color },
    Completed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewCell {
    pub offset: (i32, i32),
    pub color: Color,
    /// Border removed per direction (indexed by `Dir::index`).
    pub joined: [bool; 4],
}

/// Everything a renderer needs about one jelly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JellyView {
    pub id: JellyId,
    pub origin: (i32, i32),
    pub cells: Vec<ViewCell>,
    pub immovable: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GrowerMark {
    pub x: i32,
    pub y: i32,
    pub dir: Dir,
    pub color: Color,
}

/// Anchored cell at (x, y) held across `dir`. `pending` = not grown yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnchorMark {
    pub x: i32,
    pub y: i32,
    pub dir: Dir,
    pub pending: bool,
}

/// Board state after one discrete mutation.
#[derive(Clone, Debug)]
pub struct Frame {
    pub phase: Phase,
    pub jellies: Vec<JellyView>,
    pub growers: Vec<GrowerMark>,
    pub anchors: Vec<AnchorMark>,
}

/// Everything one resolved move produced, in order.
#[derive(Clone, Debug, Default)]
pub struct Resolution {
    pub events: Vec<StageEvent>,
    pub frames: Vec<Frame>,
    /// The completion signal fired during this resolution.
    pub completed: bool,
}

impl Resolution {
    pub fn push(&mut self, event: StageEvent) {
        self.events.push(event);
    }

    pub fn merges(&self) -> usize {
        self.events.iter().filter(|e| matches!(e, StageEvent::Merged { .. })).count()
    }

    pub fn growths(&self) -> usize {
        self.events.iter().filter(|e| matches!(e, StageEvent::Grew { .. })).count()
    }
}
