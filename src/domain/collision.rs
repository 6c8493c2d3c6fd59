/// Collision probe: single source of truth for "can this move happen".
///
/// ## Architecture
///
/// Two distinct blockers:
///   1. TERRAIN: walls (and everything outside the map)
///   2. OCCUPANCY: crates, located by the cell their position rounds to
///
/// A probe is cast one cell from `from` along a direction. It is blocked by
/// a wall in the destination cell, or by any crate there that is not in the
/// caller's exclusion set. During a drag the dragged crate is excluded from
/// both the player's probe and its own.
///
/// The player is never a blocker: nothing can move into the player's cell
/// except the crate being pulled behind it.

use super::entity::{BoxId, Crate};
use super::grid::{GridPos, Direction, Vec2};
use super::tile::Tile;

/// Half-size of a crate's square collider, slightly under half a tile so
/// diagonal neighbours never touch a detection circle.
pub const BOX_HALF_EXTENT: f32 = 0.45;

/// Immutable view of the tile map for probe queries.
pub struct MapView<'a> {
    pub tiles: &'a [Vec<Tile>],
    pub width: usize,
    pub height: usize,
}

impl<'a> MapView<'a> {
    /// Tile at `cell`; outside the map reads as wall.
    pub fn tile_at(&self, cell: GridPos) -> Tile {
        if cell.x < 0 || cell.y < 0 {
            return Tile::Wall;
        }
        let (x, y) = (cell.x as usize, cell.y as usize);
        if x < self.width && y < self.height {
            self.tiles[y][x]
        } else {
            Tile::Wall
        }
    }

    pub fn is_wall(&self, cell: GridPos) -> bool {
        self.tile_at(cell).is_wall()
    }
}

/// What a probe ran into.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ProbeHit {
    Clear,
    Wall,
    Box(BoxId),
}

impl ProbeHit {
    pub fn is_clear(self) -> bool {
        self == ProbeHit::Clear
    }
}

/// Crate resting in `cell`, ignoring any in `excluding`.
pub fn box_at(crates: &[Crate], cell: GridPos, excluding: &[BoxId]) -> Option<BoxId> {
    crates
        .iter()
        .enumerate()
        .map(|(i, c)| (BoxId(i), c))
        .find(|(id, c)| c.cell() == cell && !excluding.contains(id))
        .map(|(id, _)| id)
}

/// Cast a unit probe from `from` along `dir`.
///
/// Walls win over crates so callers can tell "hit the level" from
/// "hit another box" in logs.
pub fn probe(
    map: &MapView,
    crates: &[Crate],
    from: GridPos,
    dir: Direction,
    excluding: &[BoxId],
) -> ProbeHit {
    let target = from.offset(dir);
    if map.is_wall(target) {
        return ProbeHit::Wall;
    }
    match box_at(crates, target, excluding) {
        Some(id) => ProbeHit::Box(id),
        None => ProbeHit::Clear,
    }
}

/// Does a circle overlap a crate's square collider centered on `box_pos`?
pub fn circle_hits_box(center: Vec2, radius: f32, box_pos: Vec2) -> bool {
    let nearest = Vec2::new(
        center.x.clamp(box_pos.x - BOX_HALF_EXTENT, box_pos.x + BOX_HALF_EXTENT),
        center.y.clamp(box_pos.y - BOX_HALF_EXTENT, box_pos.y + BOX_HALF_EXTENT),
    );
    center.distance(nearest) <= radius
}

/// Small-radius overlap query against crate colliders.
///
/// When several crates overlap, the one whose center is nearest wins.
pub fn overlap_box(crates: &[Crate], center: Vec2, radius: f32) -> Option<BoxId> {
    crates
        .iter()
        .enumerate()
        .filter(|(_, c)| circle_hits_box(center, radius, c.pos))
        .min_by(|(_, a), (_, b)| {
            center
                .distance(a.pos)
                .partial_cmp(&center.distance(b.pos))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(i, _)| BoxId(i))
}
