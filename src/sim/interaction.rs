/// BoxInteractionController: highlight, grab, drag, release and undo.
///
/// ## States
///
///   Detecting ──grab──▶ Dragging-Idle ──pull──▶ Dragging-Moving
///       ▲                  │      ▲                  │
///       └─────release──────┘      └───motion done────┘
///
/// While a box is held, the only legal move is directly away from it
/// (the opposite of the grab direction). Player and box then share one
/// Motion so neither can drift from the other. Every other direction is
/// ignored outright, without even a bounce.
///
/// Grab and release requests made while anything is mid-motion are parked
/// in a one-slot buffer and fire once the motion ends, if still fresh.

use tracing::{debug, info};

use crate::config::{InteractionConfig, SpeedConfig};
use crate::domain::collision::{self, MapView};
use crate::domain::entity::{ActorId, BoxId, Crate, Facing, Player};
use crate::domain::grid::{world_to_grid, Direction};
use crate::domain::history::{UndoHistory, UndoRecord};
use crate::domain::input_buffer::{BufferedKind, Dispatch, InputBuffer};
use crate::domain::motion::{Motion, MotionKind, Track};
use super::event::GameEvent;
use super::player::PlayerMotionController;

/// An active grab.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Grab {
    pub id: BoxId,
    /// Direction from the player toward the box at grab time.
    pub direction: Direction,
    /// Player mirror at grab time, restored on release.
    pub facing: Facing,
}

impl Grab {
    /// The only direction a drag may move in.
    pub fn pull_direction(&self) -> Direction {
        self.direction.opposite()
    }
}

pub struct BoxInteractionController {
    highlighted: Option<BoxId>,
    grab: Option<Grab>,
    motion: Option<Motion>,
    requests: InputBuffer,
    move_duration: f32,
    bounce_distance: f32,
    bounce_duration: f32,
    grab_window: f32,
    release_window: f32,
    detection_distance: f32,
    detection_radius: f32,
}

impl BoxInteractionController {
    pub fn new(speed: &SpeedConfig, interaction: &InteractionConfig) -> Self {
        BoxInteractionController {
            highlighted: None,
            grab: None,
            motion: None,
            requests: InputBuffer::default(),
            move_duration: speed.move_duration,
            bounce_distance: speed.bounce_distance,
            bounce_duration: speed.bounce_duration,
            grab_window: speed.grab_buffer_window,
            release_window: speed.release_buffer_window,
            detection_distance: interaction.detection_distance,
            detection_radius: interaction.detection_radius,
        }
    }

    // ── Queries ──

    pub fn is_dragging(&self) -> bool {
        self.grab.is_some()
    }

    /// A drag step or drag bounce is in flight.
    pub fn is_drag_moving(&self) -> bool {
        self.motion.is_some()
    }

    pub fn grabbed(&self) -> Option<BoxId> {
        self.grab.map(|g| g.id)
    }

    pub fn is_highlighted(&self, id: BoxId) -> bool {
        self.highlighted == Some(id)
    }

    pub fn motion(&self) -> Option<&Motion> {
        self.motion.as_ref()
    }

    pub fn set_move_duration(&mut self, duration: f32) {
        self.move_duration = duration.max(0.0);
    }

    // ── Grab / release ──

    /// Toggle: grab when free, release when holding. `busy` defers it.
    pub fn request_toggle(
        &mut self,
        busy: bool,
        now: f32,
        mover: &mut PlayerMotionController,
        player: &mut Player,
        crates: &[Crate],
        history: &mut UndoHistory,
        events: &mut Vec<GameEvent>,
    ) {
        let (kind, window) = if self.is_dragging() {
            (BufferedKind::Release, self.release_window)
        } else {
            (BufferedKind::Grab, self.grab_window)
        };
        match self.requests.request(kind, None, busy, now, window) {
            Dispatch::Now(action) => self.execute(action.kind, mover, player, crates, history, events),
            Dispatch::Deferred => debug!(?kind, "grab toggle buffered"),
        }
    }

    /// Fire a parked grab/release once nothing is moving.
    pub fn resume_buffered(
        &mut self,
        busy: bool,
        now: f32,
        mover: &mut PlayerMotionController,
        player: &mut Player,
        crates: &[Crate],
        history: &mut UndoHistory,
        events: &mut Vec<GameEvent>,
    ) {
        if busy {
            return;
        }
        if let Some(action) = self.requests.try_consume(now) {
            self.execute(action.kind, mover, player, crates, history, events);
        }
    }

    fn execute(
        &mut self,
        kind: BufferedKind,
        mover: &mut PlayerMotionController,
        player: &mut Player,
        crates: &[Crate],
        history: &mut UndoHistory,
        events: &mut Vec<GameEvent>,
    ) {
        match kind {
            BufferedKind::Grab if !self.is_dragging() => self.try_grab(mover, player, crates, history, events),
            BufferedKind::Release if self.is_dragging() => self.release(mover, player, events),
            _ => debug!(?kind, "stale grab toggle ignored"),
        }
    }

    fn try_grab(
        &mut self,
        mover: &mut PlayerMotionController,
        player: &Player,
        crates: &[Crate],
        history: &mut UndoHistory,
        events: &mut Vec<GameEvent>,
    ) {
        let dir = match mover.last_direction() {
            Some(d) => d,
            None => {
                debug!("grab rejected: no direction");
                events.push(GameEvent::GrabFailed);
                return;
            }
        };
        let probe = player.pos + dir.vector() * self.detection_distance;
        let id = match collision::overlap_box(crates, probe, self.detection_radius) {
            Some(id) => id,
            None => {
                debug!(?dir, "grab rejected: nothing in front");
                events.push(GameEvent::GrabFailed);
                return;
            }
        };

        history.push(UndoRecord {
            player_pos: player.pos,
            last_direction: Some(dir),
            facing: player.facing,
            moved_box: None,
        });
        self.grab = Some(Grab { id, direction: dir, facing: player.facing });
        self.highlighted = None;
        mover.set_dragging_mode(true);
        info!(box_id = id.0, ?dir, "box grabbed");
        events.push(GameEvent::BoxGrabbed { id });
    }

    fn release(&mut self, mover: &mut PlayerMotionController, player: &mut Player, events: &mut Vec<GameEvent>) {
        let grab = match self.grab.take() {
            Some(g) => g,
            None => return,
        };
        mover.set_dragging_mode(false);
        mover.set_last_direction(Some(grab.direction));
        player.facing = grab.facing;
        // the released box is immediately highlight-eligible again
        self.highlighted = Some(grab.id);
        info!(box_id = grab.id.0, "box released");
        events.push(GameEvent::BoxReleased { id: grab.id });
    }

    /// Drop the grab without animation or events. In-flight drag motion
    /// is abandoned where it stands.
    pub fn cancel_drag(&mut self, mover: &mut PlayerMotionController) {
        if let Some(grab) = self.grab.take() {
            self.highlighted = Some(grab.id);
        }
        self.motion = None;
        self.requests.clear();
        mover.set_dragging_mode(false);
    }

    // ── Drag movement ──

    /// Move validation while holding a box. Only the pull direction does
    /// anything; it becomes either a synced step or a synced bounce.
    pub fn try_drag(
        &mut self,
        intent: Option<Direction>,
        mover: &PlayerMotionController,
        map: &MapView,
        crates: &[Crate],
        player: &Player,
        history: &mut UndoHistory,
        events: &mut Vec<GameEvent>,
    ) {
        let grab = match self.grab {
            Some(g) => g,
            None => return,
        };
        if self.motion.is_some() || mover.is_moving() {
            return;
        }
        let dir = match intent {
            Some(d) if d == grab.pull_direction() => d,
            _ => return,
        };
        let box_pos = match crates.get(grab.id.0) {
            Some(c) => c.pos,
            None => return,
        };

        let excluding = [grab.id];
        let player_hit = collision::probe(map, crates, player.cell(), dir, &excluding);
        let box_hit = collision::probe(map, crates, world_to_grid(box_pos), dir, &excluding);
        let participants = [(ActorId::Player, player.pos), (ActorId::Box(grab.id), box_pos)];

        if player_hit.is_clear() && box_hit.is_clear() {
            history.push(UndoRecord {
                player_pos: player.pos,
                last_direction: mover.direction_before_intent(),
                facing: player.facing,
                moved_box: Some((grab.id, box_pos)),
            });
            let tracks = participants
                .iter()
                .map(|&(actor, start)| Track { actor, start, end: start + dir.vector() })
                .collect();
            self.motion = Some(Motion::animate(tracks, self.move_duration));
            events.push(GameEvent::MoveSucceeded { actor: ActorId::Player, direction: dir, dragged: Some(grab.id) });
        } else {
            debug!(?dir, ?player_hit, ?box_hit, "drag blocked");
            self.motion = Some(Motion::bounce(&participants, dir, self.bounce_distance, self.bounce_duration));
            events.push(GameEvent::MoveBlocked { actor: ActorId::Player, direction: dir, dragged: Some(grab.id) });
        }
    }

    /// Animation stepping for the shared drag motion.
    pub fn advance(&mut self, dt: f32, player: &mut Player, crates: &mut [Crate]) -> Option<MotionKind> {
        let motion = self.motion.as_mut()?;
        for (actor, pos) in motion.advance(dt) {
            match actor {
                ActorId::Player => player.pos = pos,
                ActorId::Box(id) => {
                    if let Some(c) = crates.get_mut(id.0) {
                        c.pos = pos;
                    }
                }
            }
        }
        if motion.is_finished() {
            let kind = motion.kind();
            self.motion = None;
            Some(kind)
        } else {
            None
        }
    }

    // ── Detection ──

    /// Advisory highlight of the box in front of the player. Only runs
    /// while nothing is held or moving.
    pub fn detect(&mut self, mover: &PlayerMotionController, player: &Player, crates: &[Crate]) {
        if self.is_dragging() || self.is_drag_moving() || mover.is_moving() {
            return;
        }
        self.highlighted = mover.last_direction().and_then(|dir| {
            let probe = player.pos + dir.vector() * self.detection_distance;
            collision::overlap_box(crates, probe, self.detection_radius)
        });
    }

    // ── Undo ──

    /// Pop one record and restore it. A held box is let go first, silently.
    /// Returns false (and does nothing) on an empty history.
    pub fn undo(
        &mut self,
        history: &mut UndoHistory,
        mover: &mut PlayerMotionController,
        player: &mut Player,
        crates: &mut [Crate],
        events: &mut Vec<GameEvent>,
    ) -> bool {
        let record = match history.pop() {
            Some(r) => r,
            None => {
                debug!("undo on empty history");
                return false;
            }
        };
        if self.is_dragging() {
            self.cancel_drag(mover);
        }
        player.pos = record.player_pos;
        player.facing = record.facing;
        mover.set_last_direction(record.last_direction);
        if let Some((id, pos)) = record.moved_box {
            if let Some(c) = crates.get_mut(id.0) {
                c.pos = pos;
            }
        }
        info!(remaining = history.len(), "undo");
        events.push(GameEvent::UndoPerformed);
        true
    }

    /// Forget everything: no grab, no highlight, no motion, no parked request.
    pub fn reset_state(&mut self) {
        self.grab = None;
        self.highlighted = None;
        self.motion = None;
        self.requests.clear();
    }
}
