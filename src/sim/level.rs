/// Level loader.
///
/// ## Sources (priority order):
///   1. `general.level_file` from the config
///   2. The built-in embedded level
///
/// ## Format (`.txt`):
///   Optional: `# Level Name`
///   `@ player x,y`  spawn cell of the character
///   `@ trophy x,y`  cell holding the goal trophy
///   Lines: map rows
///
/// ## Tile legend:
///   '=' = Wall           '.' = Plain floor
///   'r' = Red floor      'g' = Green floor
///   'b' = Blue floor     'y' = Yellow floor
///
/// Short rows are padded with walls. Marker coordinates are tile cells and
/// must name floor tiles.

use glam::Vec2;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::GameConfig;
use crate::domain::physics::cell_center;
use crate::domain::tile::Tile;
use super::map::TILE_SIZE;

#[derive(Clone, Debug)]
pub struct LevelDef {
    pub name: String,
    pub tiles: Vec<Vec<Tile>>,
    pub player_spawn: (usize, usize),
    pub trophy: (usize, usize),
}

impl LevelDef {
    pub fn width(&self) -> usize {
        self.tiles.first().map_or(0, Vec::len)
    }

    pub fn height(&self) -> usize {
        self.tiles.len()
    }

    pub fn player_spawn_world(&self) -> Vec2 {
        cell_center(self.player_spawn.0 as i64, self.player_spawn.1 as i64, TILE_SIZE)
    }

    pub fn trophy_world(&self) -> Vec2 {
        cell_center(self.trophy.0 as i64, self.trophy.1 as i64, TILE_SIZE)
    }
}

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("could not read level file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: unknown tile '{glyph}'")]
    UnknownTile { line: usize, glyph: char },
    #[error("line {line}: malformed marker '{text}'")]
    BadMarker { line: usize, text: String },
    #[error("level has no {0} marker")]
    MissingMarker(&'static str),
    #[error("{0} marker at {1},{2} is not on a floor tile")]
    MarkerBlocked(&'static str, usize, usize),
    #[error("level has no rows")]
    Empty,
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Load the configured level file, or the built-in level when none is set.
pub fn load_level(config: &GameConfig) -> Result<LevelDef, LevelError> {
    let Some(path) = &config.level_file else {
        return builtin_level();
    };
    let text = std::fs::read_to_string(path).map_err(|source| LevelError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let def = parse_level(&text).inspect_err(|e| warn!("rejected level {}: {e}", path.display()))?;
    info!("loaded level '{}' from {}", def.name, path.display());
    Ok(def)
}

pub fn builtin_level() -> Result<LevelDef, LevelError> {
    parse_level(BUILTIN_LEVEL)
}

/// Parse a single level from text content.
pub fn parse_level(content: &str) -> Result<LevelDef, LevelError> {
    let mut name = String::new();
    let mut rows: Vec<Vec<Tile>> = vec![];
    let mut player = None;
    let mut trophy = None;

    for (idx, raw) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim_end();
        if let Some(rest) = line.strip_prefix('#') {
            if name.is_empty() {
                name = rest.trim().to_string();
            }
        } else if let Some(rest) = line.strip_prefix("@ ") {
            let bad = || LevelError::BadMarker { line: line_no, text: line.to_string() };
            let (kind, coords) = rest.trim().split_once(' ').ok_or_else(bad)?;
            let cell = parse_cell(coords).ok_or_else(bad)?;
            match kind {
                "player" => player = Some(cell),
                "trophy" => trophy = Some(cell),
                _ => return Err(bad()),
            }
        } else if line.is_empty() {
            continue;
        } else {
            let row = line
                .chars()
                .map(|ch| Tile::from_glyph(ch).ok_or(LevelError::UnknownTile { line: line_no, glyph: ch }))
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(row);
        }
    }

    if rows.is_empty() {
        return Err(LevelError::Empty);
    }

    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    for row in &mut rows {
        row.resize(width, Tile::Wall);
    }

    let player_spawn = player.ok_or(LevelError::MissingMarker("player"))?;
    let trophy = trophy.ok_or(LevelError::MissingMarker("trophy"))?;
    for (label, (x, y)) in [("player", player_spawn), ("trophy", trophy)] {
        let open = rows.get(y).and_then(|r| r.get(x)).is_some_and(|t| !t.is_solid());
        if !open {
            return Err(LevelError::MarkerBlocked(label, x, y));
        }
    }

    if name.is_empty() {
        name = "Unnamed Habitat".to_string();
    }

    Ok(LevelDef { name, tiles: rows, player_spawn, trophy })
}

fn parse_cell(text: &str) -> Option<(usize, usize)> {
    let (x, y) = text.trim().split_once(',')?;
    Some((x.trim().parse().ok()?, y.trim().parse().ok()?))
}

// ══════════════════════════════════════════════════════════════
// Embedded level
// ══════════════════════════════════════════════════════════════

const BUILTIN_LEVEL: &str = "\
# Habitat 1 - The Garden
@ player 1,7
@ trophy 22,7
========================
=ggggggbbbbbbbbbbbyyyyy=
=gg...................y=
=gg..rrrrrr....bbbb...y=
=gg..rr..........bb...y=
=....rr..====....bb....=
=yy..rr..====..gg......=
=yy.....ggggggggg....rr=
=yy.....ggg==gggg....rr=
=......bbbb==bbbb......=
=..rr..bbbb..bbbbyy....=
=..rr............yy....=
=gg..................bb=
=ggggggrrrrrrrrbbbbbbbb=
=ggggggrrrrrrrrbbbbbbbb=
========================
";
