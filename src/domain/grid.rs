/// Grid math: world positions, cells and directions.
///
/// World space and grid space share axes: +x right, +y **down**, one tile
/// = 1.0 unit. Resting actors sit exactly on integer coordinates; only an
/// in-flight motion may leave them fractional.
///
/// Raw analog vectors handed to `dominant_direction` use the same axes, so
/// input adapters flip a stick's "up is positive" y before calling.

use std::ops::{Add, Mul, Neg, Sub};

// ── Vec2 ──

/// Continuous world position (or offset).
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Vec2 { x, y }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (self - other).length()
    }

    /// Linear interpolation; `t` is clamped to [0, 1].
    pub fn lerp(self, end: Vec2, t: f32) -> Vec2 {
        let t = t.clamp(0.0, 1.0);
        self + (end - self) * t
    }

    /// True when both coordinates are whole numbers.
    pub fn is_grid_aligned(self) -> bool {
        self.x.fract() == 0.0 && self.y.fract() == 0.0
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

// ── GridPos ──

/// A tile coordinate.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const fn new(x: i32, y: i32) -> Self {
        GridPos { x, y }
    }

    /// The neighbouring cell in `dir`.
    pub fn offset(self, dir: Direction) -> GridPos {
        let (dx, dy) = dir.delta();
        GridPos::new(self.x + dx, self.y + dy)
    }

    /// Center of this cell in world space.
    pub fn to_world(self) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32)
    }
}

/// Snap a world position to the nearest cell (per-axis rounding).
pub fn world_to_grid(pos: Vec2) -> GridPos {
    GridPos::new(pos.x.round() as i32, pos.y.round() as i32)
}

/// Is `pos` within `tolerance` of `center`?
pub fn within_tolerance(pos: Vec2, center: Vec2, tolerance: f32) -> bool {
    pos.distance(center) <= tolerance
}

// ── Direction ──

/// One of the four grid directions. "No direction" is `Option::None`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    /// Cell delta (grid space, +y down).
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// Unit vector in world space.
    pub fn vector(self) -> Vec2 {
        let (dx, dy) = self.delta();
        Vec2::new(dx as f32, dy as f32)
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// Pick the dominant axis of a raw input vector.
///
/// Returns `None` when neither axis exceeds `deadzone`. Otherwise the axis
/// with the larger magnitude wins; on a tie the horizontal axis wins.
pub fn dominant_direction(raw: Vec2, deadzone: f32) -> Option<Direction> {
    if raw.x.abs() <= deadzone && raw.y.abs() <= deadzone {
        return None;
    }
    if raw.x.abs() >= raw.y.abs() {
        Some(if raw.x > 0.0 { Direction::Right } else { Direction::Left })
    } else {
        Some(if raw.y > 0.0 { Direction::Down } else { Direction::Up })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_to_grid_rounds_each_axis() {
        assert_eq!(world_to_grid(Vec2::new(1.4, 2.6)), GridPos::new(1, 3));
        assert_eq!(world_to_grid(Vec2::new(-0.4, 0.49)), GridPos::new(0, 0));
        assert_eq!(world_to_grid(Vec2::new(3.0, -2.0)), GridPos::new(3, -2));
    }

    #[test]
    fn dominant_direction_deadzone() {
        assert_eq!(dominant_direction(Vec2::new(0.05, -0.09), 0.1), None);
        assert_eq!(dominant_direction(Vec2::new(0.1, 0.1), 0.1), None);
        assert_eq!(dominant_direction(Vec2::new(0.11, 0.0), 0.1), Some(Direction::Right));
    }

    #[test]
    fn dominant_direction_picks_larger_axis() {
        assert_eq!(dominant_direction(Vec2::new(0.3, 0.8), 0.1), Some(Direction::Down));
        assert_eq!(dominant_direction(Vec2::new(0.3, -0.8), 0.1), Some(Direction::Up));
        assert_eq!(dominant_direction(Vec2::new(-0.9, 0.8), 0.1), Some(Direction::Left));
    }

    #[test]
    fn dominant_direction_tie_prefers_horizontal() {
        assert_eq!(dominant_direction(Vec2::new(0.5, 0.5), 0.1), Some(Direction::Right));
        assert_eq!(dominant_direction(Vec2::new(-0.5, -0.5), 0.1), Some(Direction::Left));
    }

    #[test]
    fn opposite_is_an_involution() {
        for d in Direction::ALL {
            assert_ne!(d.opposite(), d);
            assert_eq!(d.opposite().opposite(), d);
            assert_eq!(d.vector() + d.opposite().vector(), Vec2::ZERO);
        }
    }

    #[test]
    fn offset_matches_vector() {
        let p = GridPos::new(2, 2);
        for d in Direction::ALL {
            assert_eq!(p.offset(d).to_world(), p.to_world() + d.vector());
        }
    }

    #[test]
    fn lerp_clamps() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(2.0, -4.0);
        assert_eq!(a.lerp(b, 0.5), Vec2::new(1.0, -2.0));
        assert_eq!(a.lerp(b, 1.7), b);
        assert_eq!(a.lerp(b, -1.0), a);
    }

    #[test]
    fn tolerance_check() {
        let c = Vec2::new(3.0, 3.0);
        assert!(within_tolerance(Vec2::new(3.05, 3.0), c, 0.1));
        assert!(!within_tolerance(Vec2::new(3.2, 3.0), c, 0.1));
    }
}
