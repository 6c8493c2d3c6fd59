/// WorldState: the complete snapshot of a running game.
///
/// ## Ownership
///
/// The world owns every actor and target. The two controllers own only
/// their own state machines (motion, buffers, grab); each tick the
/// step function lends them the pieces of the world they act on.
///
/// ## Commands
///
/// Adapters never call controllers directly. They set the held direction
/// or stick vector and latch one-shot requests (`request_*`); the next
/// `step` consumes them in a fixed order.

use crate::config::{GameConfig, InteractionConfig, SpeedConfig};
use crate::domain::collision::MapView;
use crate::domain::entity::{ActorId, BoxColor, BoxId, BoxPoint, Crate, Facing, Player, PlayerPoint, TargetId};
use crate::domain::grid::{dominant_direction, Direction, GridPos, Vec2};
use crate::domain::history::UndoHistory;
use crate::domain::tile::Tile;
use super::boosters::{Boosters, Checkpoint, LevelTimer};
use super::completion::{self, CompletionTracker, Records};
use super::event::GameEvent;
use super::interaction::BoxInteractionController;
use super::level::LevelDef;
use super::player::PlayerMotionController;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Playing,
    LevelComplete,
    TimedOut,
    GameComplete,
}

/// Latched adapter input, consumed by `step`.
#[derive(Clone, Debug, Default)]
pub struct InputLatch {
    held: Option<Direction>,
    stick: Vec2,
    pub(crate) grab_toggle: bool,
    pub(crate) undo: bool,
    pub(crate) reset: bool,
    pub(crate) checkpoint: bool,
    pub(crate) speed_up: bool,
    pub(crate) freeze: bool,
}

impl InputLatch {
    /// Digital direction wins over the stick when both are present.
    pub fn raw(&self) -> Vec2 {
        match self.held {
            Some(d) => d.vector(),
            None => self.stick,
        }
    }

    pub fn clear_commands(&mut self) {
        self.grab_toggle = false;
        self.undo = false;
        self.reset = false;
        self.checkpoint = false;
        self.speed_up = false;
        self.freeze = false;
    }
}

pub struct WorldState {
    // ── Terrain ──
    pub tiles: Vec<Vec<Tile>>,
    pub width: usize,
    pub height: usize,

    // ── Actors and targets ──
    pub player: Player,
    pub crates: Vec<Crate>,
    pub box_points: Vec<BoxPoint>,
    pub player_points: Vec<PlayerPoint>,

    // ── Controllers ──
    pub mover: PlayerMotionController,
    pub grabber: BoxInteractionController,
    pub history: UndoHistory,
    pub tracker: CompletionTracker,

    // ── Timer / boosters ──
    pub timer: LevelTimer,
    pub boosters: Boosters,
    pub checkpoint: Option<Checkpoint>,

    // ── Input ──
    pub input: InputLatch,

    // ── Tuning ──
    pub speed: SpeedConfig,
    pub interaction: InteractionConfig,
    pub default_time_limit: f32,

    // ── Meta ──
    pub phase: Phase,
    pub paused: bool,
    /// Seconds of play on this level attempt; drives buffer windows.
    pub clock: f32,
    pub tick: u64,
    pub current_level: usize,
    pub total_levels: usize,
    pub level_name: String,
    pub levels: Vec<LevelDef>,
    pub records: Records,

    // ── UI ──
    pub message: String,
    pub message_timer: u32,
}

// ── Construction ──

impl WorldState {
    /// An empty world. `level::load_level` fills in the terrain.
    pub fn new(config: &GameConfig, levels: Vec<LevelDef>) -> Self {
        WorldState {
            tiles: vec![],
            width: 0,
            height: 0,
            player: Player::new(GridPos::new(0, 0)),
            crates: vec![],
            box_points: vec![],
            player_points: vec![],
            mover: PlayerMotionController::new(&config.speed),
            grabber: BoxInteractionController::new(&config.speed, &config.interaction),
            history: UndoHistory::new(),
            tracker: CompletionTracker::new(config.interaction.target_tolerance),
            timer: LevelTimer::new(0.0),
            boosters: Boosters::default(),
            checkpoint: None,
            input: InputLatch::default(),
            speed: config.speed.clone(),
            interaction: config.interaction.clone(),
            default_time_limit: config.default_time_limit,
            phase: Phase::Playing,
            paused: false,
            clock: 0.0,
            tick: 0,
            current_level: 0,
            total_levels: levels.len(),
            level_name: String::new(),
            levels,
            records: Records::default(),
            message: String::new(),
            message_timer: 0,
        }
    }

    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }

    pub fn map(&self) -> MapView<'_> {
        MapView { tiles: &self.tiles, width: self.width, height: self.height }
    }
}

// ── Commands ──

impl WorldState {
    pub fn set_directional_input(&mut self, dir: Direction, pressed: bool) {
        if pressed {
            self.input.held = Some(dir);
        } else if self.input.held == Some(dir) {
            self.input.held = None;
        }
    }

    /// Analog vector in grid space (+y down).
    pub fn set_stick(&mut self, raw: Vec2) {
        self.input.stick = raw;
    }

    pub fn request_grab_toggle(&mut self) {
        self.input.grab_toggle = true;
    }

    pub fn request_undo(&mut self) {
        self.input.undo = true;
    }

    pub fn request_reset(&mut self) {
        self.input.reset = true;
    }

    pub fn request_checkpoint(&mut self) {
        self.input.checkpoint = true;
    }

    pub fn request_speed_up(&mut self) {
        self.input.speed_up = true;
    }

    pub fn request_freeze_time(&mut self) {
        self.input.freeze = true;
    }

    /// Takes effect on the next motion either controller starts.
    pub fn set_move_duration(&mut self, duration: f32) {
        self.mover.set_move_duration(duration);
        self.grabber.set_move_duration(duration);
    }

    /// This tick's movement intent.
    pub fn intent(&self) -> Option<Direction> {
        dominant_direction(self.input.raw(), self.interaction.stick_deadzone)
    }

    /// Recompute occupancy of every target from resting positions.
    pub fn refresh_occupancy(&mut self, events: &mut Vec<GameEvent>) {
        self.tracker.notify_box_moved(&self.crates, &mut self.box_points, events);
        self.tracker.notify_player_moved(&self.player, &mut self.player_points, events);
    }
}

// ── Queries ──

impl WorldState {
    /// Player or drag motion in flight.
    pub fn busy(&self) -> bool {
        self.mover.is_moving() || self.grabber.is_drag_moving()
    }

    pub fn is_busy(&self, actor: ActorId) -> bool {
        let in_drag = self.grabber.motion().map_or(false, |m| m.involves(actor));
        match actor {
            ActorId::Player => self.mover.is_moving() || in_drag,
            ActorId::Box(_) => in_drag,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.grabber.is_dragging()
    }

    pub fn is_highlighted(&self, id: BoxId) -> bool {
        self.grabber.is_highlighted(id)
    }

    pub fn is_grabbed(&self, id: BoxId) -> bool {
        self.grabber.grabbed() == Some(id)
    }

    pub fn facing(&self) -> Facing {
        self.player.facing
    }

    pub fn last_direction(&self) -> Option<Direction> {
        self.mover.last_direction()
    }

    pub fn player_pos(&self) -> Vec2 {
        self.player.pos
    }

    pub fn box_pos(&self, id: BoxId) -> Option<Vec2> {
        self.crates.get(id.0).map(|c| c.pos)
    }

    pub fn box_color(&self, id: BoxId) -> Option<BoxColor> {
        self.crates.get(id.0).map(|c| c.color)
    }

    pub fn target_occupied(&self, target: TargetId) -> bool {
        match target {
            TargetId::Box(i) => self.box_points.get(i).map_or(false, |p| p.occupied),
            TargetId::Player(i) => self.player_points.get(i).map_or(false, |p| p.occupied),
        }
    }

    pub fn undo_depth(&self) -> usize {
        self.history.len()
    }

    /// `(occupied, total)` box points.
    pub fn box_counts(&self) -> (usize, usize) {
        completion::box_point_counts(&self.box_points)
    }

    /// `(occupied, total)` player points.
    pub fn player_counts(&self) -> (usize, usize) {
        completion::player_point_counts(&self.player_points)
    }

    pub fn time_remaining(&self) -> Option<f32> {
        self.timer.remaining()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> WorldState {
        WorldState::new(&GameConfig::default(), vec![])
    }

    #[test]
    fn releasing_other_direction_keeps_held() {
        let mut w = world();
        w.set_directional_input(Direction::Left, true);
        w.set_directional_input(Direction::Up, false);
        assert_eq!(w.intent(), Some(Direction::Left));
        w.set_directional_input(Direction::Left, false);
        assert_eq!(w.intent(), None);
    }

    #[test]
    fn digital_input_overrides_stick() {
        let mut w = world();
        w.set_stick(Vec2::new(0.0, 0.9));
        assert_eq!(w.intent(), Some(Direction::Down));
        w.set_directional_input(Direction::Right, true);
        assert_eq!(w.intent(), Some(Direction::Right));
        w.set_stick(Vec2::new(0.05, 0.0));
        w.set_directional_input(Direction::Right, false);
        assert_eq!(w.intent(), None);
    }

    #[test]
    fn requests_latch_until_cleared() {
        let mut w = world();
        w.request_undo();
        w.request_checkpoint();
        assert!(w.input.undo && w.input.checkpoint);
        w.input.clear_commands();
        assert!(!w.input.undo && !w.input.checkpoint);
    }
}
