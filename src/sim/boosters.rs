/// Level timer, one-shot boosters and the checkpoint snapshot.
///
/// The countdown only runs while the level is being played. Freeze-time
/// stops the countdown (not the clock used for best times) for a while;
/// speed-up temporarily shortens the move duration. Each booster can be
/// used once per level attempt.

use crate::domain::entity::Facing;
use crate::domain::grid::{Direction, Vec2};

// ── Timer ──

#[derive(Clone, Debug)]
pub struct LevelTimer {
    /// Countdown length in seconds; 0 means untimed.
    limit: f32,
    /// Total play time, for best-time records.
    elapsed: f32,
    /// Play time charged against the countdown (excludes frozen time).
    charged: f32,
    frozen_for: f32,
    timed_out: bool,
}

impl LevelTimer {
    pub fn new(limit: f32) -> Self {
        LevelTimer { limit: limit.max(0.0), elapsed: 0.0, charged: 0.0, frozen_for: 0.0, timed_out: false }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn is_timed(&self) -> bool {
        self.limit > 0.0
    }

    /// Seconds left on the countdown, `None` when untimed.
    pub fn remaining(&self) -> Option<f32> {
        self.is_timed().then(|| (self.limit - self.charged).max(0.0))
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen_for > 0.0
    }

    pub fn frozen_for(&self) -> f32 {
        self.frozen_for
    }

    pub fn freeze(&mut self, duration: f32) {
        self.frozen_for = self.frozen_for.max(duration);
    }

    /// Advance by `dt`. Returns true on the tick the countdown runs out.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.elapsed += dt;
        if self.frozen_for > 0.0 {
            let frozen = self.frozen_for.min(dt);
            self.frozen_for -= frozen;
            self.charged += dt - frozen;
        } else {
            self.charged += dt;
        }
        if self.is_timed() && !self.timed_out && self.charged >= self.limit {
            self.timed_out = true;
            return true;
        }
        false
    }
}

// ── Boosters ──

#[derive(Clone, Debug, Default)]
pub struct Boosters {
    freeze_used: bool,
    speed_used: bool,
    speed_left: f32,
}

impl Boosters {
    pub fn freeze_available(&self) -> bool {
        !self.freeze_used
    }

    pub fn speed_available(&self) -> bool {
        !self.speed_used
    }

    pub fn speed_active(&self) -> bool {
        self.speed_left > 0.0
    }

    pub fn speed_left(&self) -> f32 {
        self.speed_left
    }

    /// Spend the freeze booster on `timer`. False if already used.
    pub fn use_freeze(&mut self, timer: &mut LevelTimer, duration: f32) -> bool {
        if self.freeze_used {
            return false;
        }
        self.freeze_used = true;
        timer.freeze(duration);
        true
    }

    /// Spend the speed booster. The caller applies the faster duration.
    pub fn use_speed_up(&mut self, duration: f32) -> bool {
        if self.speed_used {
            return false;
        }
        self.speed_used = true;
        self.speed_left = duration;
        true
    }

    /// Returns true on the tick the speed boost runs out.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.speed_left <= 0.0 {
            return false;
        }
        self.speed_left -= dt;
        if self.speed_left <= 0.0 {
            self.speed_left = 0.0;
            return true;
        }
        false
    }
}

// ── Checkpoint ──

/// Snapshot of every resting position, restored wholesale.
#[derive(Clone, Debug, PartialEq)]
pub struct Checkpoint {
    pub player_pos: Vec2,
    pub facing: Facing,
    pub last_direction: Option<Direction>,
    pub crates: Vec<Vec2>,
}
