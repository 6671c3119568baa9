/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use tracing_subscriber::EnvFilter;

use config::GameConfig;
use domain::cell::Dir;
use sim::level::load_catalog;
use sim::session::Session;
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::{play_cues, SoundEngine};

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    let config = GameConfig::load();

    if let Err(e) = init_logging(&config) {
        eprintln!("Warning: logging disabled: {e}");
    }

    let levels = load_catalog(&config);
    let mut session = match Session::new(levels, config.start_level - 1, config.pacing.clone()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Could not open level: {e}");
            return;
        }
    };

    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();

    let result = game_loop(&mut session, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        tracing::error!(error = %e, "game loop failed");
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Jelly Slide!");
    println!("Last level: {}", session.level_name());
}

/// Log to a file: the terminal belongs to the game.
/// `JELLY_LOG` overrides the configured filter.
fn init_logging(config: &GameConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let file = File::create(&config.log.file)?;
    let filter = EnvFilter::try_from_env("JELLY_LOG")
        .or_else(|_| EnvFilter::try_new(&config.log.level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()?;
    Ok(())
}

fn game_loop(
    session: &mut Session,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.pacing.tick_rate_ms);

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            break;
        }
        if kb.resized {
            renderer.invalidate();
        }
        if handle_input(session, renderer, &kb, &gp)? {
            break;
        }

        let elapsed = last_tick.elapsed();
        if elapsed >= tick_rate {
            session.advance(elapsed);
            last_tick = Instant::now();
        }
        play_cues(sound, &session.take_cues());

        renderer.render(session)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

// ── Key Constants ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_SLIDE_L: &[KeyCode] = &[KeyCode::Char('z'), KeyCode::Char('Z'), KeyCode::Char(',')];
const KEYS_SLIDE_R: &[KeyCode] = &[KeyCode::Char('x'), KeyCode::Char('X'), KeyCode::Char('.')];
const KEYS_UNDO: &[KeyCode] = &[KeyCode::Char('u'), KeyCode::Char('U'), KeyCode::Backspace];
const KEYS_RESET: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_NEXT: &[KeyCode] = &[KeyCode::Char('n'), KeyCode::Char('N'), KeyCode::PageDown];
const KEYS_PREV: &[KeyCode] = &[KeyCode::Char('p'), KeyCode::Char('P'), KeyCode::PageUp];
const KEYS_EXPORT: &[KeyCode] = &[KeyCode::Char('e'), KeyCode::Char('E')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q'), KeyCode::Esc];

fn detect_cursor_step(kb: &InputState, gp: &GamepadState) -> (i32, i32) {
    let (mut dx, mut dy) = gp.cursor_step();
    if kb.any_pressed(KEYS_LEFT) { dx -= 1; }
    if kb.any_pressed(KEYS_RIGHT) { dx += 1; }
    if kb.any_pressed(KEYS_UP) { dy -= 1; }
    if kb.any_pressed(KEYS_DOWN) { dy += 1; }
    (dx, dy)
}

/// Returns true when the player asked to quit.
fn handle_input(
    session: &mut Session,
    renderer: &Renderer,
    kb: &InputState,
    gp: &GamepadState,
) -> Result<bool, Box<dyn std::error::Error>> {
    if kb.any_pressed(KEYS_QUIT) || gp.quit_pressed() {
        return Ok(true);
    }

    // Level-wide actions work even during playback.
    if kb.any_pressed(KEYS_RESET) || gp.reset_pressed() {
        session.reset();
        return Ok(false);
    }
    if kb.any_pressed(KEYS_NEXT) || gp.next_level_pressed() {
        session.next_level();
        return Ok(false);
    }
    if kb.any_pressed(KEYS_PREV) || gp.prev_level_pressed() {
        session.prev_level();
        return Ok(false);
    }

    // Board input is dropped while frames play back.
    if session.is_busy() {
        return Ok(false);
    }

    let (dx, dy) = detect_cursor_step(kb, gp);
    if dx != 0 || dy != 0 {
        session.move_cursor(dx, dy);
    }

    if kb.any_pressed(KEYS_EXPORT) {
        if let Err(e) = session.export(Path::new(".")) {
            tracing::warn!(error = %e, "export failed");
            session.set_message("Export failed", 40);
        }
    } else if kb.any_pressed(KEYS_UNDO) || gp.undo_pressed() {
        session.undo();
    } else if kb.any_pressed(KEYS_SLIDE_L) || gp.slide_left_pressed() {
        session.slide_at_cursor(Dir::Left)?;
    } else if kb.any_pressed(KEYS_SLIDE_R) || gp.slide_right_pressed() {
        session.slide_at_cursor(Dir::Right)?;
    } else if let Some(click) = kb.clicks().first() {
        if let Some((x, y)) = renderer.screen_to_grid(click.column, click.row) {
            let dir = if click.right { Dir::Right } else { Dir::Left };
            session.cursor = (x, y);
            session.slide_at(x, y, dir)?;
        }
    }

    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logging_goes_to_the_configured_file() {
        let mut config = GameConfig::default();
        config.log.file = std::env::temp_dir().join(format!("jellyslide-{}.log", std::process::id()));
        config.log.level = "info".into();
        init_logging(&config).expect("subscriber installs");
        assert!(config.log.file.exists());
        std::fs::remove_file(&config.log.file).ok();
    }
}
