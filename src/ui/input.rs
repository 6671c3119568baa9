/// Input state tracker.
///
/// Collects one frame's worth of terminal events:
///   - key presses (Press and Repeat; Release is ignored)
///   - mouse clicks, in terminal cell coordinates
///
/// Every action in the game is edge-triggered, so nothing is tracked
/// across frames. Auto-repeat from the terminal moves the cursor.

use std::time::Duration;

use crossterm::event::{
    self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Click {
    pub column: u16,
    pub row: u16,
    /// Left button slides left, right button slides right.
    pub right: bool,
}

pub struct InputState {
    /// Keys pressed during the most recent drain_events() call.
    presses: Vec<KeyEvent>,
    clicks: Vec<Click>,
    /// The terminal was resized; the renderer must repaint everything.
    pub resized: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            presses: Vec::with_capacity(8),
            clicks: Vec::with_capacity(2),
            resized: false,
        }
    }

    /// Drain all pending terminal events without blocking.
    /// Call this once per frame.
    pub fn drain_events(&mut self) {
        self.presses.clear();
        self.clicks.clear();
        self.resized = false;

        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => {
                    self.presses.push(key);
                }
                Ok(Event::Mouse(m)) => {
                    let right = match m.kind {
                        MouseEventKind::Down(MouseButton::Left) => false,
                        MouseEventKind::Down(MouseButton::Right) => true,
                        _ => continue,
                    };
                    self.clicks.push(Click { column: m.column, row: m.row, right });
                }
                Ok(Event::Resize(..)) => self.resized = true,
                _ => {}
            }
        }
    }

    /// Was this key pressed this frame?
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.presses.iter().any(|k| k.code == code)
    }

    /// Convenience: was any of these keys pressed?
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    pub fn clicks(&self) -> &[Click] {
        &self.clicks
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        self.presses.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}
