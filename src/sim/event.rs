/// Events emitted by input handling and the simulation step.
/// The frame loop consumes these for sound and logging.

use crate::domain::color::Color;
use crate::domain::enemy::EnemyKind;
use super::world::GameState;

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    StateChanged { from: GameState, to: GameState },
    CharacterDetected { by: EnemyKind },
    TrophyReached,
    ColorShifted(Color),
    DashCancelled,
    FlashEnded,
    SpotterSpawned,
    WandererSpawned,
    LevelReset,
}
