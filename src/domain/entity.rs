/// Entities: Player, Crate (pullable box), and the two kinds of target point.
///
/// Positions are world-space `Vec2`s. At rest they are integer-aligned; a
/// controller owns an actor's position for the duration of its motion.

use super::grid::{world_to_grid, GridPos, Vec2};

/// Left/right sprite mirror. Purely cosmetic, but also read back when a
/// released box restores the grab-time facing.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    /// Facing implied by a horizontal component, if any.
    pub fn from_x(x: f32) -> Option<Facing> {
        if x < 0.0 {
            Some(Facing::Left)
        } else if x > 0.0 {
            Some(Facing::Right)
        } else {
            None
        }
    }
}

/// Index into the level's crate list.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct BoxId(pub usize);

/// Who a motion, event or query is about.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ActorId {
    Player,
    Box(BoxId),
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum BoxColor {
    Red,
    Green,
    Blue,
    Yellow,
}

impl BoxColor {
    pub const ALL: [BoxColor; 4] = [BoxColor::Red, BoxColor::Green, BoxColor::Blue, BoxColor::Yellow];

    /// Lowercase letter used for crates in level files.
    pub fn crate_char(self) -> char {
        match self {
            BoxColor::Red => 'r',
            BoxColor::Green => 'g',
            BoxColor::Blue => 'b',
            BoxColor::Yellow => 'y',
        }
    }

    /// Uppercase letter used for box points in level files.
    pub fn point_char(self) -> char {
        self.crate_char().to_ascii_uppercase()
    }

    pub fn name(self) -> &'static str {
        match self {
            BoxColor::Red => "red",
            BoxColor::Green => "green",
            BoxColor::Blue => "blue",
            BoxColor::Yellow => "yellow",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Player {
    pub pos: Vec2,
    pub facing: Facing,
}

impl Player {
    pub fn new(cell: GridPos) -> Self {
        Player {
            pos: cell.to_world(),
            facing: Facing::Right,
        }
    }

    pub fn cell(&self) -> GridPos {
        world_to_grid(self.pos)
    }
}

/// A pullable box.
#[derive(Clone, Debug)]
pub struct Crate {
    pub pos: Vec2,
    pub color: BoxColor,
}

impl Crate {
    pub fn new(cell: GridPos, color: BoxColor) -> Self {
        Crate { pos: cell.to_world(), color }
    }

    pub fn cell(&self) -> GridPos {
        world_to_grid(self.pos)
    }
}

/// Which target point an occupancy notification refers to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TargetId {
    Box(usize),
    Player(usize),
}

/// Needs a crate of `required` color resting on its center.
#[derive(Clone, Debug)]
pub struct BoxPoint {
    pub cell: GridPos,
    pub required: BoxColor,
    pub occupied: bool,
}

impl BoxPoint {
    pub fn new(cell: GridPos, required: BoxColor) -> Self {
        BoxPoint { cell, required, occupied: false }
    }
}

/// Needs the player resting on its center.
#[derive(Clone, Debug)]
pub struct PlayerPoint {
    pub cell: GridPos,
    pub occupied: bool,
}

impl PlayerPoint {
    pub fn new(cell: GridPos) -> Self {
        PlayerPoint { cell, occupied: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facing_from_horizontal_component() {
        assert_eq!(Facing::from_x(-0.3), Some(Facing::Left));
        assert_eq!(Facing::from_x(1.0), Some(Facing::Right));
        assert_eq!(Facing::from_x(0.0), None);
    }

    #[test]
    fn color_chars_round_trip() {
        for c in BoxColor::ALL {
            assert!(c.crate_char().is_ascii_lowercase());
            assert_eq!(c.point_char(), c.crate_char().to_ascii_uppercase());
        }
    }

    #[test]
    fn crate_cell_rounds_fractional_position() {
        let mut c = Crate::new(GridPos::new(4, 1), BoxColor::Blue);
        assert_eq!(c.cell(), GridPos::new(4, 1));
        c.pos = Vec2::new(4.3, 1.0);
        assert_eq!(c.cell(), GridPos::new(4, 1));
        c.pos = Vec2::new(4.6, 1.0);
        assert_eq!(c.cell(), GridPos::new(5, 1));
    }
}
