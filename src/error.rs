/// Error types for the things that can genuinely fail: reading and parsing
/// level definitions. Gameplay rejections (blocked moves, invalid grabs,
/// empty undo) are never errors; they surface as events at most.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("level {level:?} has no player start ('@')")]
    MissingPlayer { level: String },

    #[error("level {level:?} has more than one player start (second at {x},{y})")]
    MultiplePlayers { level: String, x: usize, y: usize },

    #[error("level {level:?}: unknown tile character {ch:?} at {x},{y}")]
    UnknownTile { level: String, ch: char, x: usize, y: usize },

    #[error("level {level:?} has no map rows")]
    EmptyLevel { level: String },

    #[error("level {level:?}: {color} box point has no {color} box")]
    UnmatchedPoint { level: String, color: &'static str },

    #[error("invalid metadata line {line:?}")]
    BadMetadata { line: String },

    #[error("no levels available")]
    NoLevels,

    #[error("failed to read level file '{path}': {source}")]
    ReadLevel {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, GameError>;
