/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub pacing: PacingConfig,
    pub gamepad: GamepadConfig,
    pub log: LogConfig,
    pub levels_dir: PathBuf,
    /// 1-based catalog index to open first.
    pub start_level: usize,
}

#[derive(Clone, Debug)]
pub struct PacingConfig {
    pub step_ms: u64,      // delay per engine frame during playback
    pub grow_ms: u64,      // extra delay after a growth frame
    pub tick_rate_ms: u64, // input poll interval
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub slide_left: Vec<String>,
    pub slide_right: Vec<String>,
    pub undo: Vec<String>,
    pub reset: Vec<String>,
    pub next_level: Vec<String>,
    pub prev_level: Vec<String>,
    pub quit: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct LogConfig {
    pub file: PathBuf,
    /// `tracing-subscriber` filter directive, overridden by `JELLY_LOG`.
    pub level: String,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    pacing: TomlPacing,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
    #[serde(default)]
    log: TomlLog,
}

#[derive(Deserialize, Debug)]
struct TomlPacing {
    #[serde(default = "default_step_ms")]
    step_ms: u64,
    #[serde(default = "default_grow_ms")]
    grow_ms: u64,
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_slide_left")]
    slide_left: Vec<String>,
    #[serde(default = "default_slide_right")]
    slide_right: Vec<String>,
    #[serde(default = "default_undo")]
    undo: Vec<String>,
    #[serde(default = "default_reset")]
    reset: Vec<String>,
    #[serde(default = "default_next_level")]
    next_level: Vec<String>,
    #[serde(default = "default_prev_level")]
    prev_level: Vec<String>,
    #[serde(default = "default_quit")]
    quit: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
    #[serde(default = "default_start_level")]
    start_level: usize,
}

#[derive(Deserialize, Debug)]
struct TomlLog {
    #[serde(default = "default_log_file")]
    file: String,
    #[serde(default = "default_log_level")]
    level: String,
}

// ── Defaults ──

fn default_step_ms() -> u64 { 90 }
fn default_grow_ms() -> u64 { 200 }
fn default_tick_rate() -> u64 { 30 }

fn default_slide_left() -> Vec<String> { vec!["X".into(), "L1".into()] }
fn default_slide_right() -> Vec<String> { vec!["A".into(), "R1".into()] }
fn default_undo() -> Vec<String> { vec!["B".into()] }
fn default_reset() -> Vec<String> { vec!["Y".into()] }
fn default_next_level() -> Vec<String> { vec!["R2".into()] }
fn default_prev_level() -> Vec<String> { vec!["L2".into()] }
fn default_quit() -> Vec<String> { vec!["Select".into()] }
fn default_levels_dir() -> String { "levels".into() }
fn default_start_level() -> usize { 1 }
fn default_log_file() -> String { "jellyslide.log".into() }
fn default_log_level() -> String { "info".into() }

impl Default for TomlPacing {
    fn default() -> Self {
        TomlPacing {
            step_ms: default_step_ms(),
            grow_ms: default_grow_ms(),
            tick_rate_ms: default_tick_rate(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            slide_left: default_slide_left(),
            slide_right: default_slide_right(),
            undo: default_undo(),
            reset: default_reset(),
            next_level: default_next_level(),
            prev_level: default_prev_level(),
            quit: default_quit(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
            start_level: default_start_level(),
        }
    }
}

impl Default for TomlLog {
    fn default() -> Self {
        TomlLog { file: default_log_file(), level: default_log_level() }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        Self::resolve(toml_cfg, &search_dirs)
    }

    fn resolve(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        // Resolve levels directory
        let levels_dir_str = &toml_cfg.general.levels_dir;
        let levels_dir = if PathBuf::from(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        GameConfig {
            pacing: PacingConfig {
                step_ms: toml_cfg.pacing.step_ms,
                grow_ms: toml_cfg.pacing.grow_ms,
                tick_rate_ms: toml_cfg.pacing.tick_rate_ms.max(1),
            },
            gamepad: GamepadConfig {
                slide_left: toml_cfg.gamepad.slide_left,
                slide_right: toml_cfg.gamepad.slide_right,
                undo: toml_cfg.gamepad.undo,
                reset: toml_cfg.gamepad.reset,
                next_level: toml_cfg.gamepad.next_level,
                prev_level: toml_cfg.gamepad.prev_level,
                quit: toml_cfg.gamepad.quit,
            },
            log: LogConfig {
                file: PathBuf::from(toml_cfg.log.file),
                level: toml_cfg.log.level,
            },
            levels_dir,
            start_level: toml_cfg.general.start_level.max(1),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::resolve(TomlConfig::default(), &[])
    }
}

/// Candidate directories to search: exe dir + CWD + system paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/jellyslide)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/jellyslide");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    // 4. System data directory
    let sys = PathBuf::from("/usr/share/jellyslide");
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
/// Runs before logging is up, so problems go to stderr.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => return parse_toml(&text),
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

fn parse_toml(text: &str) -> TomlConfig {
    match toml::from_str::<TomlConfig>(text) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Warning: config.toml parse error: {e}");
            eprintln!("Using default settings.");
            TomlConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_empty() {
        let cfg = GameConfig::resolve(parse_toml(""), &[]);
        assert_eq!(cfg.pacing.step_ms, 90);
        assert_eq!(cfg.pacing.grow_ms, 200);
        assert_eq!(cfg.pacing.tick_rate_ms, 30);
        assert_eq!(cfg.levels_dir, PathBuf::from("levels"));
        assert_eq!(cfg.start_level, 1);
        assert_eq!(cfg.log.level, "info");
        assert_eq!(cfg.gamepad.undo, vec!["B".to_string()]);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::resolve(parse_toml("[pacing]\ngrow_ms = 0\n[log]\nlevel = \"debug\"\n"), &[]);
        assert_eq!(cfg.pacing.grow_ms, 0);
        assert_eq!(cfg.pacing.step_ms, 90);
        assert_eq!(cfg.log.level, "debug");
        assert_eq!(cfg.log.file, PathBuf::from("jellyslide.log"));
    }

    #[test]
    fn malformed_file_falls_back() {
        let cfg = GameConfig::resolve(parse_toml("[pacing\nstep_ms = 1"), &[]);
        assert_eq!(cfg.pacing.step_ms, 90);
    }

    #[test]
    fn start_level_is_one_based() {
        let cfg = GameConfig::resolve(parse_toml("[general]\nstart_level = 0\n"), &[]);
        assert_eq!(cfg.start_level, 1);
    }
}
