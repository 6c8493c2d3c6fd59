/// Level completion tracking.
///
/// The controllers call `notify_box_moved` / `notify_player_moved` once a
/// committed motion has settled (never mid-interpolation). The tracker
/// recomputes occupancy for the affected kind of target, reports every
/// flip, and latches completion the first time every target is satisfied.
///
/// A box point is satisfied by a box of its color resting within
/// `tolerance` of its center; a player point by the player likewise.

use std::collections::HashMap;

use tracing::info;

use crate::domain::entity::{BoxPoint, Crate, Player, PlayerPoint, TargetId};
use crate::domain::grid::within_tolerance;
use super::event::GameEvent;

/// Flat per-level reward when no specific value is listed.
const DEFAULT_REWARD: u32 = 5;
/// Extra reward for beating the session-best time on a level.
const BEST_TIME_BONUS: u32 = 5;

#[derive(Clone, Debug)]
pub struct CompletionTracker {
    tolerance: f32,
    completed: bool,
}

impl CompletionTracker {
    pub fn new(tolerance: f32) -> Self {
        CompletionTracker { tolerance, completed: false }
    }

    /// Forget the completion latch (level load / reset).
    pub fn rearm(&mut self) {
        self.completed = false;
    }

    pub fn notify_box_moved(&self, crates: &[Crate], points: &mut [BoxPoint], events: &mut Vec<GameEvent>) {
        for (i, point) in points.iter_mut().enumerate() {
            let center = point.cell.to_world();
            let occupied = crates
                .iter()
                .any(|c| c.color == point.required && within_tolerance(c.pos, center, self.tolerance));
            if occupied != point.occupied {
                point.occupied = occupied;
                events.push(GameEvent::TargetOccupancyChanged { target: TargetId::Box(i), occupied });
            }
        }
    }

    pub fn notify_player_moved(&self, player: &Player, points: &mut [PlayerPoint], events: &mut Vec<GameEvent>) {
        for (i, point) in points.iter_mut().enumerate() {
            let occupied = within_tolerance(player.pos, point.cell.to_world(), self.tolerance);
            if occupied != point.occupied {
                point.occupied = occupied;
                events.push(GameEvent::TargetOccupancyChanged { target: TargetId::Player(i), occupied });
            }
        }
    }

    /// True exactly once: the first call on which every target is occupied.
    pub fn check_complete(&mut self, box_points: &[BoxPoint], player_points: &[PlayerPoint]) -> bool {
        if self.completed || !all_occupied(box_points, player_points) {
            return false;
        }
        self.completed = true;
        true
    }
}

/// Every target occupied, and there is at least one target.
pub fn all_occupied(box_points: &[BoxPoint], player_points: &[PlayerPoint]) -> bool {
    let any = !box_points.is_empty() || !player_points.is_empty();
    any && box_points.iter().all(|p| p.occupied) && player_points.iter().all(|p| p.occupied)
}

/// `(occupied, total)` for the HUD.
pub fn box_point_counts(points: &[BoxPoint]) -> (usize, usize) {
    (points.iter().filter(|p| p.occupied).count(), points.len())
}

pub fn player_point_counts(points: &[PlayerPoint]) -> (usize, usize) {
    (points.iter().filter(|p| p.occupied).count(), points.len())
}

/// Base reward for clearing the level at `level_idx` (0-based).
pub fn base_reward(level_idx: usize) -> u32 {
    match level_idx + 1 {
        1 => 10,
        2 => 15,
        3 => 20,
        _ => DEFAULT_REWARD,
    }
}

/// Session-only record of best clear times and coins earned.
#[derive(Clone, Debug, Default)]
pub struct Records {
    best_times: HashMap<usize, f32>,
    pub coins: u32,
}

impl Records {
    pub fn best_time(&self, level_idx: usize) -> Option<f32> {
        self.best_times.get(&level_idx).copied()
    }

    /// Record a clear. Returns `(reward, new_best)`. The first clear of a
    /// level always counts as a new best.
    pub fn record_clear(&mut self, level_idx: usize, elapsed: f32) -> (u32, bool) {
        let new_best = self.best_time(level_idx).map_or(true, |best| elapsed < best);
        if new_best {
            self.best_times.insert(level_idx, elapsed);
        }
        let reward = base_reward(level_idx) + if new_best { BEST_TIME_BONUS } else { 0 };
        self.coins += reward;
        info!(level = level_idx + 1, elapsed, reward, new_best, "level cleared");
        (reward, new_best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::BoxColor;
    use crate::domain::grid::{GridPos, Vec2};

    fn red_at(x: f32, y: f32) -> Crate {
        let mut c = Crate::new(GridPos::new(0, 0), BoxColor::Red);
        c.pos = Vec2::new(x, y);
        c
    }

    #[test]
    fn box_point_needs_matching_color_within_tolerance() {
        let t = CompletionTracker::new(0.1);
        let mut points = vec![BoxPoint::new(GridPos::new(1, 1), BoxColor::Red)];
        let mut events = vec![];

        let blue = vec![Crate::new(GridPos::new(1, 1), BoxColor::Blue)];
        t.notify_box_moved(&blue, &mut points, &mut events);
        assert!(!points[0].occupied);
        assert!(events.is_empty());

        t.notify_box_moved(&[red_at(1.2, 1.0)], &mut points, &mut events);
        assert!(!points[0].occupied);

        t.notify_box_moved(&[red_at(1.05, 1.0)], &mut points, &mut events);
        assert!(points[0].occupied);
        assert_eq!(
            events,
            vec![GameEvent::TargetOccupancyChanged { target: TargetId::Box(0), occupied: true }]
        );
    }

    #[test]
    fn occupancy_change_reported_once_per_flip() {
        let t = CompletionTracker::new(0.1);
        let mut points = vec![PlayerPoint::new(GridPos::new(2, 0))];
        let mut events = vec![];
        let mut p = Player::new(GridPos::new(2, 0));
        t.notify_player_moved(&p, &mut points, &mut events);
        t.notify_player_moved(&p, &mut points, &mut events);
        p.pos = Vec2::new(3.0, 0.0);
        t.notify_player_moved(&p, &mut points, &mut events);
        assert_eq!(
            events,
            vec![
                GameEvent::TargetOccupancyChanged { target: TargetId::Player(0), occupied: true },
                GameEvent::TargetOccupancyChanged { target: TargetId::Player(0), occupied: false },
            ]
        );
    }

    #[test]
    fn completion_latches() {
        let mut t = CompletionTracker::new(0.1);
        let mut bp = vec![BoxPoint::new(GridPos::new(0, 0), BoxColor::Red)];
        let mut pp = vec![PlayerPoint::new(GridPos::new(1, 0))];
        assert!(!t.check_complete(&bp, &pp));
        bp[0].occupied = true;
        assert!(!t.check_complete(&bp, &pp));
        pp[0].occupied = true;
        assert!(t.check_complete(&bp, &pp));
        assert!(!t.check_complete(&bp, &pp));
        t.rearm();
        assert!(t.check_complete(&bp, &pp));
    }

    #[test]
    fn level_without_targets_never_completes() {
        assert!(!all_occupied(&[], &[]));
    }

    #[test]
    fn reward_rule() {
        let mut r = Records::default();
        assert_eq!(r.record_clear(0, 30.0), (15, true));
        assert_eq!(r.record_clear(0, 40.0), (10, false));
        assert_eq!(r.record_clear(0, 20.0), (15, true));
        assert_eq!(r.record_clear(2, 50.0), (25, true));
        assert_eq!(r.record_clear(7, 50.0), (10, true));
        assert_eq!(r.best_time(0), Some(20.0));
        assert_eq!(r.coins, 15 + 10 + 15 + 25 + 10);
    }
}
