/// Level descriptors and the level catalog.
///
/// ## Sources (priority order):
///   1. `levels/` directory (individual `.toml` files, sorted by file name)
///   2. Built-in embedded levels
///
/// ## Level file format (`.toml`):
///   ```toml
///   name = "Level 21"
///   map = [
///     "xxxxxx",
///     "x r  x",
///     "xxxxxx",
///   ]
///   [[anchors]]
///   x = 2
///   y = 1
///   dir = "down"
///   [[growers]]
///   x = 3
///   y = 2
///   dir = "up"
///   color = "red"
///   ```
///
/// ## Cell legend:
///   'x' = Wall        ' ' = Empty
///   'r' 'g' 'b' 'y'   = named colors
///   '0'..'9'          = numbered colors (mutually distinct)
///
/// Undo snapshots use the same descriptor shape, so any snapshot is a
/// loadable level.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::GameConfig;
use crate::domain::cell::Dir;
use crate::domain::grid::GridError;

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level map is empty")]
    EmptyMap,
    #[error("no levels to play")]
    NoLevels,
    #[error("unknown cell value {symbol:?} at ({x}, {y})")]
    UnknownCellSymbol { symbol: char, x: i32, y: i32 },
    #[error("unknown color {0:?}")]
    UnknownColor(String),
    #[error(transparent)]
    OutOfBounds(#[from] GridError),
    #[error("anchor at ({x}, {y}) points {dir:?} at an empty cell")]
    AnchorNeighborMissing { x: i32, y: i32, dir: Dir },
    #[error("anchor at ({x}, {y}) sits on a wall")]
    AnchorOnWall { x: i32, y: i32 },
    #[error("grower at ({x}, {y}) has no wall or jelly to live in")]
    GrowerWithoutHost { x: i32, y: i32 },
    #[error("level file parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("level serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("could not read {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
}

fn is_false(b: &bool) -> bool {
    !*b
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorSpec {
    pub x: i32,
    pub y: i32,
    pub dir: Dir,
    #[serde(default, skip_serializing_if = "is_false")]
    pub delayed: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowerSpec {
    pub x: i32,
    pub y: i32,
    pub dir: Dir,
    pub color: String,
}

/// Map rows + anchors + growers. Loaded as a level, produced as an undo snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelDescriptor {
    pub map: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anchors: Vec<AnchorSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub growers: Vec<GrowerSpec>,
}

impl LevelDescriptor {
    pub fn from_rows(rows: &[&str]) -> Self {
        LevelDescriptor {
            map: rows.iter().map(|r| r.to_string()).collect(),
            anchors: vec![],
            growers: vec![],
        }
    }
}

/// A named catalog entry.
#[derive(Clone, Debug)]
pub struct LevelDef {
    pub name: String,
    pub level: LevelDescriptor,
}

#[derive(Serialize, Deserialize)]
struct LevelFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    map: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    anchors: Vec<AnchorSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    growers: Vec<GrowerSpec>,
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Load the catalog: `levels/` directory if it has level files, built-ins otherwise.
pub fn load_catalog(config: &GameConfig) -> Vec<LevelDef> {
    let dir = &config.levels_dir;
    if dir.is_dir() {
        let levels = load_from_directory(dir);
        if !levels.is_empty() {
            tracing::info!(count = levels.len(), dir = %dir.display(), "loaded level directory");
            return levels;
        }
    }
    embedded_levels()
}

/// Parse one level file. `fallback_name` is used when the file has no `name`.
pub fn parse_level_file(content: &str, fallback_name: &str) -> Result<LevelDef, LevelError> {
    let file: LevelFile = toml::from_str(content)?;
    if file.map.is_empty() {
        return Err(LevelError::EmptyMap);
    }
    Ok(LevelDef {
        name: file.name.unwrap_or_else(|| fallback_name.to_string()),
        level: LevelDescriptor { map: file.map, anchors: file.anchors, growers: file.growers },
    })
}

/// Render a named level in the level file format.
pub fn write_level_file(name: &str, level: &LevelDescriptor) -> Result<String, LevelError> {
    let file = LevelFile {
        name: Some(name.to_string()),
        map: level.map.clone(),
        anchors: level.anchors.clone(),
        growers: level.growers.clone(),
    };
    Ok(toml::to_string(&file)?)
}

pub fn read_level_file(path: &Path) -> Result<LevelDef, LevelError> {
    let content = std::fs::read_to_string(path)
        .map_err(|source| LevelError::Io { path: path.to_path_buf(), source })?;
    let stem = path.file_stem().unwrap_or_default().to_string_lossy().to_string();
    parse_level_file(&content, &stem)
}

// ══════════════════════════════════════════════════════════════
// Directory loading (individual .toml files)
// ══════════════════════════════════════════════════════════════

fn load_from_directory(dir: &Path) -> Vec<LevelDef> {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "cannot list level directory");
            return vec![];
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().map_or(false, |e| e == "toml"))
        .collect();
    paths.sort();

    let mut levels = vec![];
    for path in paths {
        match read_level_file(&path) {
            Ok(def) => levels.push(def),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping level file"),
        }
    }
    levels
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback levels
// ══════════════════════════════════════════════════════════════

pub fn embedded_levels() -> Vec<LevelDef> {
    vec![
        make_embedded("Level 1", &[
            "xxxxxxxxxxxxxx",
            "x            x",
            "x            x",
            "x      r     x",
            "x      xx    x",
            "x  g     r b x",
            "xxbxxxg xxxxxx",
            "xxxxxxxxxxxxxx",
        ], &[], &[]),
        make_embedded("Level 2", &[
            "xxxxxxxxxxxxxx",
            "x            x",
            "x            x",
            "x            x",
            "x     g   g  x",
            "x   r r   r  x",
            "xxxxx x x xxxx",
            "xxxxxxxxxxxxxx",
        ], &[], &[]),
        make_embedded("Level 3", &[
            "xxxxxxxxxxxxxx",
            "x            x",
            "x            x",
            "x   bg  x g  x",
            "xxx xxxrxxx  x",
            "x      b     x",
            "xxx xxxrxxxxxx",
            "xxxxxxxxxxxxxx",
        ], &[], &[]),
        make_embedded("Level 5", &[
            "xxxxxxxxxxxxxx",
            "x            x",
            "x            x",
            "xrg  gg      x",
            "xxx xxxx xx  x",
            "xrg          x",
            "xxxxx  xx   xx",
            "xxxxxx xx  xxx",
            "xxxxxxxxxxxxxx",
        ], &[], &[]),
        make_embedded("Level 7", &[
            "xxxxxxxxxxxxxx",
            "x            x",
            "x          r x",
            "x          x x",
            "x     b   b  x",
            "x     x  rr  x",
            "x         x  x",
            "x r  bx x x  x",
            "x x  xx x x  x",
            "xxxxxxxxxxxxxx",
        ], &[(2, 7, Dir::Down), (5, 7, Dir::Down)], &[]),
        make_embedded("Level 21", &[
            "xxxxxxxxxxxxxx",
            "x      x     x",
            "x      x     x",
            "x      x     x",
            "x      g     x",
            "x        gb  x",
            "xxxx     xx  x",
            "xxxr b     r x",
            "xxxx xxxxxxxxx",
            "xxxxxxxxxxxxxx",
        ], &[(7, 4, Dir::Up)], &[(7, 8, Dir::Up, "red")]),
        make_embedded("Level 22", &[
            "xxxxxxxxxxxxxx",
            "x            x",
            "x            x",
            "x            x",
            "x            x",
            "x    g  bgr  x",
            "x x xx  xxx xx",
            "xbx          x",
            "xxxxxxxxxxxxxx",
            "xxxxxxxxxxxxxx",
        ], &[(6, 7, Dir::Down)], &[(6, 8, Dir::Up, "red")]),
        make_embedded("Level 23", &[
            "xxxxxxxxxxxxxx",
            "x            x",
            "x            x",
            "x    g       x",
            "x    b       x",
            "x    x    r  x",
            "x        xx  x",
            "x b          x",
            "xxxx r xxx xgx",
            "xxxxxxxxxxxxxx",
        ], &[], &[(8, 8, Dir::Up, "red")]),
        make_embedded("Level 31", &[
            "xxxxxxxxxxxxxx",
            "xxb xxxxxx bxx",
            "xxx  r  r  xxx",
            "xx   xxxx   xx",
            "xx xxxxxxxx xx",
            "x g   xx   g x",
            "xx11      22xx",
            "xx11      22xx",
            "xxxxxr  rxxxxx",
            "xxxxxxxxxxxxxx",
        ], &[
            (5, 8, Dir::Down), (8, 8, Dir::Down),
            (4, 6, Dir::Left), (9, 6, Dir::Right),
        ], &[
            (3, 6, Dir::Right, "green"), (10, 6, Dir::Left, "green"),
            (2, 2, Dir::Right, "blue"), (11, 2, Dir::Left, "blue"),
        ]),
        make_embedded("Level 35", &[
            "xxxxxxxxxxxxxx",
            "x00    bbbbbrx",
            "x0b        byx",
            "x00        byx",
            "xxxyyy     byx",
            "xxr1b1     xxx",
            "xx 111     xxx",
            "xxxxx      xxx",
            "xxxxxxxx   xxx",
            "xxxxxxxxxxxxxx",
        ], &[
            (2, 2, Dir::Left), (2, 2, Dir::Up), (2, 2, Dir::Down),
            (2, 5, Dir::Up),
            (4, 5, Dir::Down), (4, 5, Dir::Left), (4, 5, Dir::Right),
        ], &[]),
        make_embedded("Level 36", &[
            "xxxxxxxxxxxxxx",
            "x    brgrbg  x",
            "x  xx111111xxx",
            "x  xx1y11r1xxx",
            "x    111122  x",
            "x    112222  x",
            "x    222222  x",
            "x    222222  x",
            "x    222222  x",
            "xxxxxxxxxxxxxx",
        ], &[], &[(4, 9, Dir::Up, "red")]),
    ]
}

fn make_embedded(
    name: &str,
    map: &[&str],
    anchors: &[(i32, i32, Dir)],
    growers: &[(i32, i32, Dir, &str)],
) -> LevelDef {
    LevelDef {
        name: name.to_string(),
        level: LevelDescriptor {
            anchors: anchors.iter()
                .map(|&(x, y, dir)| AnchorSpec { x, y, dir, delayed: false })
                .collect(),
            growers: growers.iter()
                .map(|&(x, y, dir, color)| GrowerSpec { x, y, dir, color: color.to_string() })
                .collect(),
            ..LevelDescriptor::from_rows(map)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_level_file() {
        let text = r#"
name = "Hook"
map = [
  "xxxx",
  "xr x",
  "xxxx",
]

[[anchors]]
x = 1
y = 1
dir = "down"

[[growers]]
x = 2
y = 2
dir = "up"
color = "red"
"#;
        let def = parse_level_file(text, "fallback").expect("valid level");
        assert_eq!(def.name, "Hook");
        assert_eq!(def.level.map.len(), 3);
        assert_eq!(def.level.anchors, vec![AnchorSpec { x: 1, y: 1, dir: Dir::Down, delayed: false }]);
        assert_eq!(def.level.growers[0].color, "red");
    }

    #[test]
    fn missing_name_uses_fallback() {
        let def = parse_level_file("map = [\"xrx\"]", "07-tiny").expect("valid level");
        assert_eq!(def.name, "07-tiny");
        assert!(def.level.anchors.is_empty());
    }

    #[test]
    fn empty_map_rejected() {
        assert!(matches!(parse_level_file("map = []", "e"), Err(LevelError::EmptyMap)));
    }

    #[test]
    fn bad_direction_is_parse_error() {
        let text = "map = [\"xrx\"]\n[[anchors]]\nx = 1\ny = 0\ndir = \"sideways\"\n";
        assert!(matches!(parse_level_file(text, "bad"), Err(LevelError::Parse(_))));
    }

    #[test]
    fn descriptor_toml_roundtrip_keeps_delayed_flag() {
        let mut level = LevelDescriptor::from_rows(&["xxx", "xrx"]);
        level.anchors.push(AnchorSpec { x: 1, y: 1, dir: Dir::Up, delayed: true });
        let text = write_level_file("held", &level).expect("serialize");
        assert!(text.contains("delayed = true"));
        let back = parse_level_file(&text, "unused").expect("parse");
        assert_eq!(back.level, level);
    }

    #[test]
    fn written_level_file_parses_back() {
        let def = &embedded_levels()[5];
        let text = write_level_file(&def.name, &def.level).expect("serialize");
        let back = parse_level_file(&text, "unused").expect("parse");
        assert_eq!(back.name, def.name);
        assert_eq!(back.level, def.level);
    }

    #[test]
    fn embedded_levels_are_rectangular() {
        for def in embedded_levels() {
            let w = def.level.map[0].len();
            assert!(def.level.map.iter().all(|r| r.len() == w), "{}", def.name);
        }
    }
}
