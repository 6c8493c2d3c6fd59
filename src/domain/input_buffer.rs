/// Input buffer: sticky last direction + one short-lived deferred action.
///
/// A request made while the owning actor is busy is parked with the time
/// it was made. When the actor frees up, the parked action fires once if
/// it is still inside its validity window; otherwise it is dropped. Nothing
/// is ever retried or queued beyond that single slot.

use super::grid::Direction;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BufferedKind {
    Move,
    Grab,
    Release,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct BufferedAction {
    pub kind: BufferedKind,
    pub direction: Option<Direction>,
    /// Clock time (seconds) at which the request was made.
    pub activated_at: f32,
    /// How long the request stays valid.
    pub window: f32,
}

impl BufferedAction {
    /// Valid for `activated_at <= now < activated_at + window`.
    pub fn is_live(&self, now: f32) -> bool {
        now >= self.activated_at && now < self.activated_at + self.window
    }
}

/// Outcome of `InputBuffer::request`.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Dispatch {
    /// Actor is free: caller performs the action right away.
    Now(BufferedAction),
    /// Actor is busy: the action is parked.
    Deferred,
}

#[derive(Clone, Debug, Default)]
pub struct InputBuffer {
    last_direction: Option<Direction>,
    pending: Option<BufferedAction>,
}

impl InputBuffer {
    pub fn new(initial: Option<Direction>) -> Self {
        InputBuffer { last_direction: initial, pending: None }
    }

    /// Most recent non-empty direction. Survives key release.
    pub fn last_direction(&self) -> Option<Direction> {
        self.last_direction
    }

    /// Overwrite the sticky direction (release / undo restore it).
    pub fn set_last_direction(&mut self, dir: Option<Direction>) {
        self.last_direction = dir;
    }

    /// Update the sticky direction; `None` leaves it unchanged.
    pub fn record_intent(&mut self, dir: Option<Direction>) {
        if let Some(d) = dir {
            self.last_direction = Some(d);
        }
    }

    /// Request an action. Fires now when `busy` is false, otherwise parks it
    /// (replacing any older parked action).
    pub fn request(
        &mut self,
        kind: BufferedKind,
        direction: Option<Direction>,
        busy: bool,
        now: f32,
        window: f32,
    ) -> Dispatch {
        let action = BufferedAction { kind, direction, activated_at: now, window };
        if busy {
            self.pending = Some(action);
            Dispatch::Deferred
        } else {
            Dispatch::Now(action)
        }
    }

    /// Take the parked action if it is still live. Either way the slot is
    /// empty afterwards.
    pub fn try_consume(&mut self, now: f32) -> Option<BufferedAction> {
        self.pending.take().filter(|a| a.is_live(now))
    }

    /// Drop the parked action without firing it.
    pub fn clear(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn sticky_direction_ignores_none() {
        let mut b = InputBuffer::new(Some(Direction::Right));
        b.record_intent(None);
        assert_eq!(b.last_direction(), Some(Direction::Right));
        b.record_intent(Some(Direction::Up));
        b.record_intent(None);
        assert_eq!(b.last_direction(), Some(Direction::Up));
    }

    #[test]
    fn free_actor_fires_immediately() {
        let mut b = InputBuffer::default();
        let d = b.request(BufferedKind::Grab, None, false, 1.0, 0.1);
        assert!(matches!(d, Dispatch::Now(a) if a.kind == BufferedKind::Grab));
        assert!(b.try_consume(1.0).is_none(), "nothing parked");
    }

    #[test]
    fn busy_actor_parks_action() {
        let mut b = InputBuffer::default();
        let d = b.request(BufferedKind::Move, Some(Direction::Left), true, 2.0, 0.065);
        assert_eq!(d, Dispatch::Deferred);
        let a = b.try_consume(2.05).expect("still live");
        assert_eq!(a.direction, Some(Direction::Left));
        assert!(b.try_consume(2.05).is_none(), "fires once");
    }

    #[test]
    fn expired_action_is_dropped() {
        let mut b = InputBuffer::default();
        b.request(BufferedKind::Release, None, true, 0.0, 0.135);
        assert!(b.try_consume(0.2).is_none());
        assert!(b.try_consume(0.0).is_none(), "slot emptied");
    }

    #[test]
    fn newer_request_replaces_older() {
        let mut b = InputBuffer::default();
        b.request(BufferedKind::Move, Some(Direction::Left), true, 0.0, 0.1);
        b.request(BufferedKind::Move, Some(Direction::Down), true, 0.05, 0.1);
        assert_eq!(b.try_consume(0.12).and_then(|a| a.direction), Some(Direction::Down));
    }

    proptest! {
        #[test]
        fn fires_inside_window_only(t in 0.0f32..1000.0, w in 0.001f32..1.0, frac in 0.0f32..2.0) {
            let mut b = InputBuffer::default();
            b.request(BufferedKind::Grab, None, true, t, w);
            let consumed_at = t + w * frac;
            let fired = b.try_consume(consumed_at).is_some();
            prop_assert_eq!(fired, consumed_at >= t && consumed_at < t + w);
            prop_assert!(b.try_consume(t).is_none());
        }
    }
}
