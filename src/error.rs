/// Error types. Initialization failures are fatal; a spawn failure aborts
/// the frame that hit it.

use thiserror::Error;

use crate::backend::BackendError;
use crate::domain::enemy::EnemyKind;
use crate::sim::level::LevelError;

#[derive(Debug, Error)]
pub enum InitError {
    #[error("terminal setup failed: {0}")]
    Terminal(#[from] std::io::Error),
    #[error("audio device unavailable: {0}")]
    Audio(String),
    #[error(transparent)]
    Sprite(#[from] BackendError),
    #[error("level: {0}")]
    Level(#[from] LevelError),
    #[error("log file {path}: {reason}")]
    Logging { path: String, reason: String },
}

#[derive(Debug, Error)]
#[error("could not spawn {kind:?}")]
pub struct SpawnError {
    pub kind: EnemyKind,
    #[source]
    pub source: BackendError,
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Init(#[from] InitError),
    #[error(transparent)]
    Spawn(#[from] SpawnError),
    #[error("rendering failed: {0}")]
    Render(#[from] std::io::Error),
}
