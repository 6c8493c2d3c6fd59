/// Undo history: a stack of pre-action snapshots.
///
/// One record is pushed per committed discrete action (a step, a drag step,
/// a grab). Bounces never push. Popping every record returns the level to
/// the state it was in when the history was last cleared.

use super::entity::{BoxId, Facing};
use super::grid::{Direction, Vec2};

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct UndoRecord {
    pub player_pos: Vec2,
    /// Sticky movement direction at the time of the snapshot.
    pub last_direction: Option<Direction>,
    pub facing: Facing,
    /// Box moved by the action, with its position before the action.
    pub moved_box: Option<(BoxId, Vec2)>,
}

#[derive(Clone, Debug, Default)]
pub struct UndoHistory {
    records: Vec<UndoRecord>,
}

impl UndoHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: UndoRecord) {
        self.records.push(record);
    }

    /// Most recent record; `None` on an empty stack.
    pub fn pop(&mut self) -> Option<UndoRecord> {
        self.records.pop()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(x: f32) -> UndoRecord {
        UndoRecord {
            player_pos: Vec2::new(x, 0.0),
            last_direction: Some(Direction::Right),
            facing: Facing::Right,
            moved_box: None,
        }
    }

    #[test]
    fn lifo_order() {
        let mut h = UndoHistory::new();
        h.push(rec(1.0));
        h.push(rec(2.0));
        assert_eq!(h.len(), 2);
        assert_eq!(h.pop().map(|r| r.player_pos.x), Some(2.0));
        assert_eq!(h.pop().map(|r| r.player_pos.x), Some(1.0));
        assert!(h.is_empty());
    }

    #[test]
    fn pop_empty_is_none() {
        let mut h = UndoHistory::new();
        assert!(h.pop().is_none());
        assert_eq!(h.len(), 0);
    }
}
