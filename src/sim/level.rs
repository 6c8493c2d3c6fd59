/// Level loader.
///
/// ## Sources (priority order):
///   1. `levels/` directory (individual `.txt` files, sorted by file name)
///   2. Built-in embedded levels
///
/// ## Level format (`.txt`):
///   Lines starting with `;` are metadata. The first one that is not a
///   `key=value` pair is the level name; `;time=SECONDS` sets the countdown
///   (0 = untimed). Every other line is a map row.
///
/// ## Tile legend:
///   '#' = Wall                  ' ' / '.' = Floor
///   '@' = Player start          '+' = Player point
///   'r' 'g' 'b' 'y' = Box of that color
///   'R' 'G' 'B' 'Y' = Box point requiring that color
///
/// Short rows are padded with floor on the right.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::domain::entity::{BoxColor, BoxPoint, Crate, Player, PlayerPoint};
use crate::domain::grid::{Direction, GridPos};
use crate::domain::tile::Tile;
use crate::error::{GameError, Result};
use super::boosters::{Boosters, LevelTimer};
use super::world::{Phase, WorldState};

/// Runtime level data (owned strings, loaded from file or embedded).
#[derive(Clone, Debug)]
pub struct LevelDef {
    pub name: String,
    pub rows: Vec<String>,
    pub time_limit: Option<f32>,
}

/// A level turned into terrain and entities, ready to install.
#[derive(Clone, Debug)]
pub struct LevelLayout {
    pub tiles: Vec<Vec<Tile>>,
    pub width: usize,
    pub height: usize,
    pub player: GridPos,
    pub crates: Vec<Crate>,
    pub box_points: Vec<BoxPoint>,
    pub player_points: Vec<PlayerPoint>,
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Load a level into the world state. Past the last level the phase
/// becomes `GameComplete` and nothing else changes.
pub fn load_level(world: &mut WorldState, level_idx: usize) -> Result<()> {
    let (layout, name, limit) = match world.levels.get(level_idx) {
        Some(def) => (def.layout()?, def.name.clone(), def.time_limit),
        None => {
            world.phase = Phase::GameComplete;
            return Ok(());
        }
    };

    world.current_level = level_idx;
    world.total_levels = world.levels.len();
    world.level_name = name;

    world.tiles = layout.tiles;
    world.width = layout.width;
    world.height = layout.height;
    world.player = Player::new(layout.player);
    world.crates = layout.crates;
    world.box_points = layout.box_points;
    world.player_points = layout.player_points;

    world.mover.reset_state();
    world.grabber.reset_state();
    world.mover.set_last_direction(Some(Direction::Right));
    world.set_move_duration(world.speed.move_duration);
    world.history.clear();
    world.tracker.rearm();
    world.timer = LevelTimer::new(limit.unwrap_or(world.default_time_limit));
    world.boosters = Boosters::default();
    world.checkpoint = None;
    world.input.clear_commands();
    world.clock = 0.0;
    world.tick = 0;
    world.phase = Phase::Playing;
    world.refresh_occupancy(&mut Vec::new());

    info!(level = level_idx + 1, name = %world.level_name, "level loaded");
    let msg = world.level_name.clone();
    world.set_message(&msg, 120);
    Ok(())
}

/// All playable levels: the levels directory when it holds any valid
/// level, the embedded set otherwise.
pub fn load_levels(levels_dir: &Path) -> Vec<LevelDef> {
    if levels_dir.is_dir() {
        match load_from_directory(levels_dir) {
            Ok(levels) if !levels.is_empty() => {
                info!(dir = %levels_dir.display(), count = levels.len(), "using level directory");
                return levels;
            }
            Ok(_) => debug!(dir = %levels_dir.display(), "no usable levels in directory"),
            Err(e) => warn!(error = %e, "level directory unreadable"),
        }
    }
    embedded_levels()
}

impl LevelDef {
    /// Build terrain and entities, validating the map.
    pub fn layout(&self) -> Result<LevelLayout> {
        let height = self.rows.len();
        let width = self.rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        if height == 0 || width == 0 {
            return Err(GameError::EmptyLevel { level: self.name.clone() });
        }

        let mut tiles = vec![vec![Tile::Floor; width]; height];
        let mut player = None;
        let mut crates = vec![];
        let mut box_points = vec![];
        let mut player_points = vec![];

        for (y, row) in self.rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let cell = GridPos::new(x as i32, y as i32);
                match ch {
                    '#' => tiles[y][x] = Tile::Wall,
                    ' ' | '.' => {}
                    '@' => {
                        if player.is_some() {
                            return Err(GameError::MultiplePlayers { level: self.name.clone(), x, y });
                        }
                        player = Some(cell);
                    }
                    '+' => player_points.push(PlayerPoint::new(cell)),
                    c => match color_for(c) {
                        Some((color, true)) => crates.push(Crate::new(cell, color)),
                        Some((color, false)) => box_points.push(BoxPoint::new(cell, color)),
                        None => {
                            return Err(GameError::UnknownTile { level: self.name.clone(), ch: c, x, y });
                        }
                    },
                }
            }
        }

        let player = player.ok_or_else(|| GameError::MissingPlayer { level: self.name.clone() })?;
        if let Some(p) = box_points.iter().find(|p| !crates.iter().any(|c| c.color == p.required)) {
            return Err(GameError::UnmatchedPoint { level: self.name.clone(), color: p.required.name() });
        }

        Ok(LevelLayout { tiles, width, height, player, crates, box_points, player_points })
    }
}

/// `(color, is_crate)` for a color letter.
fn color_for(ch: char) -> Option<(BoxColor, bool)> {
    BoxColor::ALL.iter().find_map(|&c| {
        if ch == c.crate_char() {
            Some((c, true))
        } else if ch == c.point_char() {
            Some((c, false))
        } else {
            None
        }
    })
}

// ══════════════════════════════════════════════════════════════
// Single-level file parsing
// ══════════════════════════════════════════════════════════════

/// Parse a single level from text content.
pub fn parse_level_file(content: &str) -> Result<LevelDef> {
    let mut name = String::new();
    let mut rows: Vec<String> = vec![];
    let mut time_limit = None;

    for line in content.lines() {
        let line = line.trim_end_matches('\r');
        if let Some(meta) = line.strip_prefix(';') {
            let meta = meta.trim();
            match meta.split_once('=') {
                Some(("time", value)) => {
                    let secs = value
                        .trim()
                        .parse::<f32>()
                        .ok()
                        .filter(|s| s.is_finite() && *s >= 0.0)
                        .ok_or_else(|| GameError::BadMetadata { line: line.to_string() })?;
                    time_limit = Some(secs);
                }
                Some((key, _)) => debug!(key, "ignoring unknown level metadata"),
                None if name.is_empty() => name = meta.to_string(),
                None => {}
            }
        } else {
            rows.push(line.to_string());
        }
    }

    while rows.first().map_or(false, |r| r.trim().is_empty()) {
        rows.remove(0);
    }
    while rows.last().map_or(false, |r| r.trim().is_empty()) {
        rows.pop();
    }

    let max_width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
    for row in &mut rows {
        let len = row.chars().count();
        if len < max_width {
            row.extend(std::iter::repeat(' ').take(max_width - len));
        }
    }

    if name.is_empty() {
        name = "Unnamed Room".to_string();
    }
    if rows.is_empty() {
        return Err(GameError::EmptyLevel { level: name });
    }

    Ok(LevelDef { name, rows, time_limit })
}

// ══════════════════════════════════════════════════════════════
// Directory loading (individual .txt files)
// ══════════════════════════════════════════════════════════════

fn load_from_directory(dir: &Path) -> Result<Vec<LevelDef>> {
    let entries = std::fs::read_dir(dir).map_err(|source| GameError::ReadLevel {
        path: dir.display().to_string(),
        source,
    })?;

    let mut paths: Vec<_> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().map_or(false, |e| e == "txt"))
        .collect();
    paths.sort();

    let mut levels = vec![];
    for path in paths {
        let parsed = std::fs::read_to_string(&path)
            .map_err(|source| GameError::ReadLevel { path: path.display().to_string(), source })
            .and_then(|text| parse_level_file(&text))
            .and_then(|def| def.layout().map(|_| def));
        match parsed {
            Ok(def) => levels.push(def),
            Err(e) => warn!(file = %path.display(), error = %e, "skipping level"),
        }
    }
    Ok(levels)
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback levels
// ══════════════════════════════════════════════════════════════

pub fn embedded_levels() -> Vec<LevelDef> {
    vec![
        make_embedded("Room 1 - First Pull", Some(90.0), &[
            "###########",
            "#         #",
            "# @  r  R #",
            "#         #",
            "#    +    #",
            "###########",
        ]),
        make_embedded("Room 2 - Two Tones", Some(120.0), &[
            "###########",
            "#         #",
            "#  r   b  #",
            "#         #",
            "#    @    #",
            "#  R   B  #",
            "#         #",
            "#    +    #",
            "###########",
        ]),
        make_embedded("Room 3 - The Gap", Some(150.0), &[
            "#############",
            "#     #     #",
            "# y   #   Y #",
            "#     #     #",
            "#           #",
            "#  @     +  #",
            "#############",
        ]),
        make_embedded("Room 4 - Split Hall", Some(240.0), &[
            "###############",
            "#             #",
            "# g    #    b #",
            "#      #      #",
            "#   ###+###   #",
            "#      @      #",
            "#   G     B   #",
            "#             #",
            "###############",
        ]),
    ]
}

fn make_embedded(name: &str, time_limit: Option<f32>, map: &[&str]) -> LevelDef {
    LevelDef {
        name: name.to_string(),
        rows: map.iter().map(|s| s.to_string()).collect(),
        time_limit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_levels_are_valid() {
        let levels = embedded_levels();
        assert!(!levels.is_empty());
        for def in &levels {
            let layout = def.layout().unwrap_or_else(|e| panic!("{}: {e}", def.name));
            assert!(!layout.box_points.is_empty() || !layout.player_points.is_empty());
            for row in &def.rows {
                assert_eq!(row.len(), layout.width, "{}: ragged row", def.name);
            }
        }
    }

    #[test]
    fn parses_metadata_and_rows() {
        let def = parse_level_file(";Hello\n;time=45\n#####\n#@rR#\n#####\n\n").unwrap();
        assert_eq!(def.name, "Hello");
        assert_eq!(def.time_limit, Some(45.0));
        assert_eq!(def.rows.len(), 3);
        let layout = def.layout().unwrap();
        assert_eq!(layout.player, GridPos::new(1, 1));
        assert_eq!(layout.crates.len(), 1);
        assert_eq!(layout.box_points[0].required, BoxColor::Red);
        assert!(layout.tiles[0][0].is_wall());
    }

    #[test]
    fn short_rows_are_padded() {
        let def = parse_level_file("#####\n#@\n#####").unwrap();
        assert!(def.rows.iter().all(|r| r.len() == 5));
        assert_eq!(def.name, "Unnamed Room");
    }

    #[test]
    fn bad_time_is_rejected() {
        let err = parse_level_file(";time=soon\n#@#").unwrap_err();
        assert!(matches!(err, GameError::BadMetadata { .. }));
    }

    #[test]
    fn layout_errors() {
        let no_player = parse_level_file("###\n# #\n###").unwrap();
        assert!(matches!(no_player.layout(), Err(GameError::MissingPlayer { .. })));

        let two = parse_level_file("#@@#").unwrap();
        assert!(matches!(two.layout(), Err(GameError::MultiplePlayers { x: 2, y: 0, .. })));

        let odd = parse_level_file("#@?#").unwrap();
        assert!(matches!(odd.layout(), Err(GameError::UnknownTile { ch: '?', .. })));

        let unmatched = parse_level_file("#@rB#").unwrap();
        assert!(matches!(unmatched.layout(), Err(GameError::UnmatchedPoint { color: "blue", .. })));

        assert!(matches!(parse_level_file(";only a name\n\n"), Err(GameError::EmptyLevel { .. })));
    }

    #[test]
    fn missing_directory_falls_back_to_embedded() {
        let levels = load_levels(Path::new("/definitely/not/a/levels/dir"));
        assert_eq!(levels.len(), embedded_levels().len());
    }
}
