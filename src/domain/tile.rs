/// Tile types and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.
///
/// Target points are not tiles: they live on top of floor as entities
/// (see `entity::BoxPoint` / `entity::PlayerPoint`).

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Tile {
    #[default]
    Floor,
    Wall,
}

impl Tile {
    /// Does this tile stop a probe (and therefore any mover)?
    pub fn is_wall(self) -> bool {
        matches!(self, Tile::Wall)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tile_is_open_floor() {
        assert_eq!(Tile::default(), Tile::Floor);
        assert!(!Tile::default().is_wall());
        assert!(Tile::Wall.is_wall());
    }
}
