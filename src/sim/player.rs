/// PlayerMotionController: the player's discrete-move state machine.
///
/// ## States
///
///   Idle ──intent──▶ Moving(Step | Bounce) ──motion done──▶ Idle
///
/// Moving is just "a Motion is in flight"; nothing else is persisted.
/// While Moving, intents are parked in the input buffer and replayed on the
/// first idle tick if still inside `move_buffer_window`. While the box
/// controller holds a grab (dragging mode) this controller never starts a
/// motion of its own.
///
/// Facing is cosmetic and is recomputed every tick, independent of state.

use tracing::debug;

use crate::config::SpeedConfig;
use crate::domain::collision::{self, MapView, ProbeHit};
use crate::domain::entity::{ActorId, Crate, Facing, Player};
use crate::domain::grid::{Direction, Vec2};
use crate::domain::history::{UndoHistory, UndoRecord};
use crate::domain::input_buffer::{BufferedKind, InputBuffer};
use crate::domain::motion::{Motion, MotionKind, Track};
use super::event::GameEvent;

pub struct PlayerMotionController {
    input: InputBuffer,
    /// Sticky direction as it was before this tick's intent was recorded.
    /// Undo records snapshot this, not the freshly pressed direction.
    direction_before_intent: Option<Direction>,
    motion: Option<Motion>,
    pub(crate) dragging: bool,
    move_duration: f32,
    bounce_distance: f32,
    bounce_duration: f32,
    buffer_window: f32,
}

impl PlayerMotionController {
    pub fn new(speed: &SpeedConfig) -> Self {
        PlayerMotionController {
            input: InputBuffer::new(Some(Direction::Right)),
            direction_before_intent: Some(Direction::Right),
            motion: None,
            dragging: false,
            move_duration: speed.move_duration,
            bounce_distance: speed.bounce_distance,
            bounce_duration: speed.bounce_duration,
            buffer_window: speed.move_buffer_window,
        }
    }

    // ── Queries ──

    pub fn is_moving(&self) -> bool {
        self.motion.is_some()
    }

    pub fn last_direction(&self) -> Option<Direction> {
        self.input.last_direction()
    }

    pub fn direction_before_intent(&self) -> Option<Direction> {
        self.direction_before_intent
    }

    // ── Commands from the box controller / world ──

    /// Suppress (or restore) independent movement while a box is held.
    pub fn set_dragging_mode(&mut self, dragging: bool) {
        self.dragging = dragging;
        if dragging {
            self.input.clear();
        }
    }

    pub fn set_last_direction(&mut self, dir: Option<Direction>) {
        self.input.set_last_direction(dir);
        self.direction_before_intent = dir;
    }

    /// Applies to the next motion started; an in-flight one keeps its timing.
    pub fn set_move_duration(&mut self, duration: f32) {
        self.move_duration = duration.max(0.0);
    }

    // ── Tick phases ──

    /// Input capture. Updates the sticky direction, and parks the intent in
    /// the buffer when a step is already in flight.
    pub fn capture(&mut self, intent: Option<Direction>, now: f32) {
        self.direction_before_intent = self.input.last_direction();
        self.input.record_intent(intent);
        if self.is_moving() && !self.dragging && intent.is_some() {
            self.input.request(BufferedKind::Move, intent, true, now, self.buffer_window);
        }
    }

    /// Move validation. When idle and free, the held intent (or else a
    /// still-live buffered one) is probed and becomes a step or a bounce.
    pub fn try_start(
        &mut self,
        intent: Option<Direction>,
        now: f32,
        map: &MapView,
        crates: &[Crate],
        player: &Player,
        history: &mut UndoHistory,
        events: &mut Vec<GameEvent>,
    ) {
        if self.dragging || self.is_moving() {
            return;
        }
        let buffered = self.input.try_consume(now).and_then(|a| a.direction);
        let dir = match intent.or(buffered) {
            Some(d) => d,
            None => return,
        };

        let start = player.pos;
        match collision::probe(map, crates, player.cell(), dir, &[]) {
            ProbeHit::Clear => {
                history.push(UndoRecord {
                    player_pos: start,
                    last_direction: self.direction_before_intent,
                    facing: player.facing,
                    moved_box: None,
                });
                let track = Track { actor: ActorId::Player, start, end: start + dir.vector() };
                self.motion = Some(Motion::animate(vec![track], self.move_duration));
                events.push(GameEvent::MoveSucceeded { actor: ActorId::Player, direction: dir, dragged: None });
            }
            hit => {
                debug!(?dir, ?hit, "player move blocked");
                self.motion = Some(Motion::bounce(
                    &[(ActorId::Player, start)],
                    dir,
                    self.bounce_distance,
                    self.bounce_duration,
                ));
                events.push(GameEvent::MoveBlocked { actor: ActorId::Player, direction: dir, dragged: None });
            }
        }
    }

    /// Animation stepping. Returns the motion's kind on the tick it completes.
    pub fn advance(&mut self, dt: f32, player: &mut Player) -> Option<MotionKind> {
        let motion = self.motion.as_mut()?;
        for (actor, pos) in motion.advance(dt) {
            if actor == ActorId::Player {
                player.pos = pos;
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

    /// Mirror the sprite toward the live input, or toward the sticky
    /// direction when there is none. Vertical input leaves facing alone.
    pub fn update_facing(&self, player: &mut Player, raw_input: Vec2, deadzone: f32) {
        let facing = if raw_input.length() <= deadzone {
            self.last_direction().and_then(|d| Facing::from_x(d.vector().x))
        } else if raw_input.x.abs() > deadzone {
            Facing::from_x(raw_input.x)
        } else {
            None
        };
        if let Some(f) = facing {
            player.facing = f;
        }
    }

    /// Abandon any motion where it stands and return to a clean Idle.
    pub fn reset_state(&mut self) {
        self.motion = None;
        self.dragging = false;
        self.input.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::GridPos;
    use crate::domain::tile::Tile;

    fn open_map(w: usize, h: usize) -> Vec<Vec<Tile>> {
        vec![vec![Tile::Floor; w]; h]
    }

    struct Rig {
        tiles: Vec<Vec<Tile>>,
        crates: Vec<Crate>,
        player: Player,
        ctl: PlayerMotionController,
        history: UndoHistory,
        events: Vec<GameEvent>,
        now: f32,
    }

    impl Rig {
        fn new(tiles: Vec<Vec<Tile>>, at: GridPos) -> Self {
            Rig {
                tiles,
                crates: vec![],
                player: Player::new(at),
                ctl: PlayerMotionController::new(&SpeedConfig::default()),
                history: UndoHistory::new(),
                events: vec![],
                now: 0.0,
            }
        }

        fn tick(&mut self, intent: Option<Direction>, dt: f32) -> Option<MotionKind> {
            self.now += dt;
            let map = MapView { tiles: &self.tiles, width: self.tiles[0].len(), height: self.tiles.len() };
            self.ctl.capture(intent, self.now);
            self.ctl.try_start(intent, self.now, &map, &self.crates, &self.player, &mut self.history, &mut self.events);
            self.ctl.advance(dt, &mut self.player)
        }

        fn ticks_until_idle(&mut self, dt: f32) -> usize {
            let mut n = 0;
            while self.ctl.is_moving() && n < 500 {
                self.tick(None, dt);
                n += 1;
            }
            n
        }
    }

    #[test]
    fn step_right_on_open_floor() {
        let mut rig = Rig::new(open_map(3, 1), GridPos::new(0, 0));
        let mut done = None;
        for _ in 0..20 {
            done = done.or(rig.tick(Some(Direction::Right), 0.016));
            if done.is_some() {
                break;
            }
        }
        assert_eq!(done, Some(MotionKind::Step));
        assert_eq!(rig.player.pos, Vec2::new(1.0, 0.0));
        assert_eq!(rig.history.len(), 1);
    }

    #[test]
    fn wall_bounce_pushes_no_undo() {
        let mut tiles = open_map(2, 1);
        tiles[0][1] = Tile::Wall;
        let mut rig = Rig::new(tiles, GridPos::new(0, 0));
        rig.tick(Some(Direction::Right), 0.016);
        assert!(matches!(rig.events[0], GameEvent::MoveBlocked { .. }));
        for _ in 0..20 {
            rig.tick(None, 0.016);
        }
        assert!(!rig.ctl.is_moving());
        assert_eq!(rig.player.pos, Vec2::new(0.0, 0.0));
        assert!(rig.history.is_empty());
    }

    #[test]
    fn intent_while_moving_is_replayed_if_fresh() {
        let mut rig = Rig::new(open_map(4, 1), GridPos::new(0, 0));
        rig.tick(Some(Direction::Right), 0.016);
        // tap Right again near the end of the step, then let go
        for _ in 0..6 {
            rig.tick(None, 0.016);
        }
        rig.tick(Some(Direction::Right), 0.016);
        for _ in 0..30 {
            rig.tick(None, 0.016);
        }
        assert_eq!(rig.player.pos, Vec2::new(2.0, 0.0));
        assert_eq!(rig.history.len(), 2);
    }

    #[test]
    fn stale_buffered_intent_is_dropped() {
        let mut rig = Rig::new(open_map(4, 1), GridPos::new(0, 0));
        rig.ctl.set_move_duration(0.5);
        rig.tick(Some(Direction::Right), 0.016);
        rig.tick(Some(Direction::Right), 0.016); // buffered at ~0.032, window 0.065
        for _ in 0..60 {
            rig.tick(None, 0.016);
        }
        assert_eq!(rig.player.pos, Vec2::new(1.0, 0.0));
        assert_eq!(rig.history.len(), 1);
    }

    #[test]
    fn dragging_mode_suppresses_moves() {
        let mut rig = Rig::new(open_map(3, 1), GridPos::new(1, 0));
        rig.ctl.set_dragging_mode(true);
        rig.tick(Some(Direction::Left), 0.016);
        assert!(!rig.ctl.is_moving());
        assert!(rig.events.is_empty());
        // the sticky direction still follows input
        assert_eq!(rig.ctl.last_direction(), Some(Direction::Left));
    }

    #[test]
    fn move_duration_change_waits_for_next_motion() {
        let mut rig = Rig::new(open_map(4, 1), GridPos::new(0, 0));
        rig.tick(Some(Direction::Right), 0.0);
        rig.ctl.set_move_duration(0.5);
        // the step in flight keeps 0.135 s
        assert_eq!(rig.ticks_until_idle(0.016), 9);
        rig.tick(Some(Direction::Right), 0.0);
        assert_eq!(rig.ticks_until_idle(0.016), 32);
    }

    #[test]
    fn facing_follows_input_then_sticky_direction() {
        let mut ctl = PlayerMotionController::new(&SpeedConfig::default());
        let mut p = Player::new(GridPos::new(0, 0));
        ctl.update_facing(&mut p, Vec2::new(-1.0, 0.0), 0.1);
        assert_eq!(p.facing, Facing::Left);
        // no input: sticky direction (initially Right) decides
        ctl.update_facing(&mut p, Vec2::ZERO, 0.1);
        assert_eq!(p.facing, Facing::Right);
        ctl.capture(Some(Direction::Left), 0.0);
        ctl.update_facing(&mut p, Vec2::ZERO, 0.1);
        assert_eq!(p.facing, Facing::Left);
        // vertical input keeps the current mirror
        ctl.update_facing(&mut p, Vec2::new(0.0, 1.0), 0.1);
        assert_eq!(p.facing, Facing::Left);
    }

    #[test]
    fn reset_state_abandons_motion() {
        let mut rig = Rig::new(open_map(3, 1), GridPos::new(0, 0));
        rig.tick(Some(Direction::Right), 0.05);
        assert!(rig.ctl.is_moving());
        let mid = rig.player.pos;
        rig.ctl.reset_state();
        assert!(!rig.ctl.is_moving());
        assert_eq!(rig.player.pos, mid);
    }
}
