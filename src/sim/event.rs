/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound and HUD messages.
/// Each fires at most once per committed occurrence.

use crate::domain::entity::{ActorId, BoxId, TargetId};
use crate::domain::grid::Direction;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Booster {
    FreezeTime,
    SpeedUp,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    /// A move was validated and its motion started. `dragged` is the box
    /// pulled along with the player, if any.
    MoveSucceeded { actor: ActorId, direction: Direction, dragged: Option<BoxId> },
    /// A move was rejected by a wall or box; a bounce motion started.
    MoveBlocked { actor: ActorId, direction: Direction, dragged: Option<BoxId> },
    BoxGrabbed { id: BoxId },
    /// Grab requested with no direction or no box in front.
    GrabFailed,
    BoxReleased { id: BoxId },
    UndoPerformed,
    TargetOccupancyChanged { target: TargetId, occupied: bool },
    LevelCompleted { elapsed: f32, reward: u32, new_best: bool },
    TimedOut,
    LevelReset,
    CheckpointCreated,
    CheckpointRestored,
    BoosterActivated(Booster),
    BoosterExpired(Booster),
}
