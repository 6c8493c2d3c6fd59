/// The step function: advances the world by one tick of `dt` seconds.
///
/// Processing order:
///   1. Clock advance (+ message timer)
///   2. Reset (short-circuits the rest of the tick)
///   3. Intent capture (sticky direction, move buffer)
///   4. Commands: buffered grab/release, grab toggle, undo, checkpoint, boosters
///   5. Move validation (drag if holding a box, else a player step)
///   6. Motion stepping
///   7. Completion notifications and win check
///   8. Advisory detection and facing
///   9. Timers (countdown, freeze, speed boost)
///
/// Undo and checkpoints only act while nothing is mid-motion. Grab and
/// release requests made mid-motion are buffered by the box controller.

use std::mem;

use tracing::{debug, info, warn};

use crate::domain::collision::MapView;
use crate::domain::grid::Direction;
use crate::domain::motion::MotionKind;
use super::boosters::Checkpoint;
use super::event::{Booster, GameEvent};
use super::level;
use super::world::{Phase, WorldState};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, dt: f32) -> Vec<GameEvent> {
    let mut events: Vec<GameEvent> = Vec::new();
    if world.phase != Phase::Playing || world.paused {
        world.input.clear_commands();
        return events;
    }

    world.tick += 1;
    world.clock += dt;
    let now = world.clock;

    if world.message_timer > 0 {
        world.message_timer -= 1;
        if world.message_timer == 0 { world.message.clear(); }
    }

    if mem::take(&mut world.input.reset) {
        restart_level(world, &mut events);
        return events;
    }

    let raw = world.input.raw();
    let intent = world.intent();
    world.mover.capture(intent, now);

    resolve_grab(world, now, &mut events);
    if mem::take(&mut world.input.undo) { resolve_undo(world, &mut events); }
    if mem::take(&mut world.input.checkpoint) { resolve_checkpoint(world, &mut events); }
    resolve_boosters(world, &mut events);

    resolve_moves(world, intent, now, &mut events);
    resolve_motion(world, dt, &mut events);
    debug_assert!(
        world.busy()
            || (world.player.pos.is_grid_aligned() && world.crates.iter().all(|c| c.pos.is_grid_aligned())),
        "actor at rest off the grid"
    );
    resolve_win(world, &mut events);
    if world.phase != Phase::Playing { return events; }

    world.grabber.detect(&world.mover, &world.player, &world.crates);
    world.mover.update_facing(&mut world.player, raw, world.interaction.stick_deadzone);

    resolve_timers(world, dt, &mut events);
    events
}

// ══════════════════════════════════════════════════════════════
// Commands
// ══════════════════════════════════════════════════════════════

fn resolve_grab(world: &mut WorldState, now: f32, events: &mut Vec<GameEvent>) {
    let busy = world.busy();
    world.grabber.resume_buffered(
        busy, now, &mut world.mover, &mut world.player, &world.crates, &mut world.history, events,
    );

    if mem::take(&mut world.input.grab_toggle) {
        let busy = world.busy();
        world.grabber.request_toggle(
            busy, now, &mut world.mover, &mut world.player, &world.crates, &mut world.history, events,
        );
    }
}

fn resolve_undo(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.busy() {
        debug!("undo ignored mid-motion");
        return;
    }
    if world.history.is_empty() {
        debug!("nothing to undo");
        return;
    }
    let undone = world.grabber.undo(
        &mut world.history, &mut world.mover, &mut world.player, &mut world.crates, events,
    );
    if undone {
        world.refresh_occupancy(events);
    }
}

/// First request saves, the next one restores and forgets.
fn resolve_checkpoint(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.busy() {
        debug!("checkpoint ignored mid-motion");
        return;
    }
    match world.checkpoint.take() {
        Some(cp) => {
            world.grabber.cancel_drag(&mut world.mover);
            world.player.pos = cp.player_pos;
            world.player.facing = cp.facing;
            world.mover.set_last_direction(cp.last_direction);
            for (c, pos) in world.crates.iter_mut().zip(cp.crates) {
                c.pos = pos;
            }
            // older records may refer to positions that no longer hold
            world.history.clear();
            world.refresh_occupancy(events);
            info!("checkpoint restored");
            events.push(GameEvent::CheckpointRestored);
            world.set_message("Checkpoint restored", 60);
        }
        None => {
            world.checkpoint = Some(Checkpoint {
                player_pos: world.player.pos,
                facing: world.player.facing,
                last_direction: world.mover.last_direction(),
                crates: world.crates.iter().map(|c| c.pos).collect(),
            });
            info!("checkpoint saved");
            events.push(GameEvent::CheckpointCreated);
            world.set_message("Checkpoint saved", 60);
        }
    }
}

fn resolve_boosters(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if mem::take(&mut world.input.speed_up) {
        if world.boosters.use_speed_up(world.speed.booster_duration) {
            let boosted = world.speed.boosted_move_duration;
            world.set_move_duration(boosted);
            info!(move_duration = boosted, "speed-up active");
            events.push(GameEvent::BoosterActivated(Booster::SpeedUp));
            world.set_message("Speed up!", 60);
        } else {
            debug!("speed-up already used");
        }
    }

    if mem::take(&mut world.input.freeze) {
        if !world.timer.is_timed() {
            debug!("freeze ignored: untimed level");
        } else if world.boosters.use_freeze(&mut world.timer, world.speed.booster_duration) {
            info!(secs = world.speed.booster_duration, "time frozen");
            events.push(GameEvent::BoosterActivated(Booster::FreezeTime));
            world.set_message("Time frozen!", 60);
        } else {
            debug!("freeze already used");
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Movement
// ══════════════════════════════════════════════════════════════

fn resolve_moves(world: &mut WorldState, intent: Option<Direction>, now: f32, events: &mut Vec<GameEvent>) {
    let map = MapView { tiles: &world.tiles, width: world.width, height: world.height };
    if world.grabber.is_dragging() {
        world.grabber.try_drag(
            intent, &world.mover, &map, &world.crates, &world.player, &mut world.history, events,
        );
    } else {
        world.mover.try_start(
            intent, now, &map, &world.crates, &world.player, &mut world.history, events,
        );
    }
}

/// Advance whichever motion is in flight. Targets are re-evaluated only
/// once a committed step has settled.
fn resolve_motion(world: &mut WorldState, dt: f32, events: &mut Vec<GameEvent>) {
    if let Some(MotionKind::Step) = world.grabber.advance(dt, &mut world.player, &mut world.crates) {
        world.tracker.notify_box_moved(&world.crates, &mut world.box_points, events);
        world.tracker.notify_player_moved(&world.player, &mut world.player_points, events);
    }
    if let Some(MotionKind::Step) = world.mover.advance(dt, &mut world.player) {
        world.tracker.notify_player_moved(&world.player, &mut world.player_points, events);
    }
}

// ══════════════════════════════════════════════════════════════
// Win check
// ══════════════════════════════════════════════════════════════

fn resolve_win(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if !world.tracker.check_complete(&world.box_points, &world.player_points) {
        return;
    }
    let elapsed = world.timer.elapsed();
    let (reward, new_best) = world.records.record_clear(world.current_level, elapsed);
    world.phase = Phase::LevelComplete;
    events.push(GameEvent::LevelCompleted { elapsed, reward, new_best });
    let best = if new_best { " New best!" } else { "" };
    world.set_message(&format!("Room {} clear! +{} coins.{}", world.current_level + 1, reward, best), 0);
}

// ══════════════════════════════════════════════════════════════
// Timers
// ══════════════════════════════════════════════════════════════

fn resolve_timers(world: &mut WorldState, dt: f32, events: &mut Vec<GameEvent>) {
    if world.boosters.tick(dt) {
        let normal = world.speed.move_duration;
        world.set_move_duration(normal);
        debug!("speed-up expired");
        events.push(GameEvent::BoosterExpired(Booster::SpeedUp));
    }

    let was_frozen = world.timer.is_frozen();
    let ran_out = world.timer.tick(dt);
    if was_frozen && !world.timer.is_frozen() {
        debug!("freeze expired");
        events.push(GameEvent::BoosterExpired(Booster::FreezeTime));
    }
    if ran_out {
        warn!(level = world.current_level + 1, "time up");
        world.phase = Phase::TimedOut;
        events.push(GameEvent::TimedOut);
        world.set_message("Time up!", 0);
    }
}

// ══════════════════════════════════════════════════════════════
// Level transitions
// ══════════════════════════════════════════════════════════════

/// Reload the current level from its definition. Session records survive.
pub fn restart_level(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if let Err(e) = level::load_level(world, world.current_level) {
        warn!(error = %e, "restart failed");
        return;
    }
    info!(level = world.current_level + 1, "level reset");
    events.push(GameEvent::LevelReset);
}

/// Move on to the next level, or to `GameComplete` after the last one.
pub fn next_level(world: &mut WorldState) -> crate::error::Result<()> {
    level::load_level(world, world.current_level + 1)
}

// ══════════════════════════════════════════════════════════════
// Scenario tests
// ══════════════════════════════════════════════════════════════
