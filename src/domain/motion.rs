/// Motion: a time-bounded interpolation of one or more actors.
///
/// A plain value the tick loop advances by `dt` until it reports
/// completion. A motion is a sequence of legs; every participant in a leg
/// moves in lockstep using the same normalized time fraction, and is
/// snapped exactly to the leg's end position when the leg's duration has
/// elapsed.
///
/// Two constructors cover every positional transition in the game:
///   - `animate`: one leg from start to end (a committed move)
///   - `bounce`: two legs, partway toward the blocked direction, then
///     back to the exact start (a rejected move)

use super::entity::ActorId;
use super::grid::{Direction, Vec2};

/// One participant's path through a leg.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Track {
    pub actor: ActorId,
    pub start: Vec2,
    pub end: Vec2,
}

#[derive(Clone, Debug)]
struct Leg {
    tracks: Vec<Track>,
    duration: f32,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MotionKind {
    /// Committed move: participants end one tile further along.
    Step,
    /// Rejected move: participants end where they started.
    Bounce,
}

#[derive(Clone, Debug)]
pub struct Motion {
    kind: MotionKind,
    legs: Vec<Leg>,
    leg: usize,
    /// Time spent in the current leg.
    elapsed: f32,
}

impl Motion {
    /// Linear move of every track from `start` to `end` over `duration` seconds.
    pub fn animate(tracks: Vec<Track>, duration: f32) -> Motion {
        Motion {
            kind: MotionKind::Step,
            legs: vec![Leg { tracks, duration: duration.max(0.0) }],
            leg: 0,
            elapsed: 0.0,
        }
    }

    /// Advance every participant `distance` toward `dir` over `duration`,
    /// then return to the exact start over another `duration`.
    pub fn bounce(participants: &[(ActorId, Vec2)], dir: Direction, distance: f32, duration: f32) -> Motion {
        let offset = dir.vector() * distance;
        let out: Vec<Track> = participants
            .iter()
            .map(|&(actor, start)| Track { actor, start, end: start + offset })
            .collect();
        let back: Vec<Track> = out
            .iter()
            .map(|t| Track { actor: t.actor, start: t.end, end: t.start })
            .collect();
        let duration = duration.max(0.0);
        Motion {
            kind: MotionKind::Bounce,
            legs: vec![Leg { tracks: out, duration }, Leg { tracks: back, duration }],
            leg: 0,
            elapsed: 0.0,
        }
    }

    pub fn kind(&self) -> MotionKind {
        self.kind
    }

    /// Actors this motion owns, in track order.
    pub fn participants(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.legs
            .first()
            .into_iter()
            .flat_map(|leg| leg.tracks.iter().map(|t| t.actor))
    }

    pub fn involves(&self, actor: ActorId) -> bool {
        self.participants().any(|a| a == actor)
    }

    pub fn is_finished(&self) -> bool {
        self.leg >= self.legs.len()
    }

    /// Advance by `dt` seconds and return the positions every participant
    /// should now hold. Leftover time from a finished leg carries into the
    /// next one. Returns an empty list once the motion has finished.
    pub fn advance(&mut self, dt: f32) -> Vec<(ActorId, Vec2)> {
        let mut budget = dt.max(0.0);
        while let Some(leg) = self.legs.get(self.leg) {
            self.elapsed += budget;
            if self.elapsed >= leg.duration {
                budget = self.elapsed - leg.duration;
                self.elapsed = 0.0;
                self.leg += 1;
                if self.leg >= self.legs.len() {
                    return leg.tracks.iter().map(|t| (t.actor, t.end)).collect();
                }
            } else {
                let t = self.elapsed / leg.duration;
                return leg
                    .tracks
                    .iter()
                    .map(|tr| (tr.actor, tr.start.lerp(tr.end, t)))
                    .collect();
            }
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::BoxId;
    use proptest::prelude::*;

    fn run_to_end(m: &mut Motion, dt: f32) -> Vec<(ActorId, Vec2)> {
        let mut last = Vec::new();
        for _ in 0..10_000 {
            if m.is_finished() {
                break;
            }
            last = m.advance(dt);
        }
        assert!(m.is_finished(), "motion never finished");
        last
    }

    #[test]
    fn animate_interpolates_then_snaps() {
        let mut m = Motion::animate(
            vec![Track { actor: ActorId::Player, start: Vec2::new(0.0, 0.0), end: Vec2::new(1.0, 0.0) }],
            0.1,
        );
        let mid = m.advance(0.05);
        assert_eq!(mid.len(), 1);
        assert!((mid[0].1.x - 0.5).abs() < 1e-5);
        assert!(!m.is_finished());

        let end = m.advance(0.07);
        assert_eq!(end, vec![(ActorId::Player, Vec2::new(1.0, 0.0))]);
        assert!(m.is_finished());
        assert!(m.advance(0.1).is_empty());
    }

    #[test]
    fn lockstep_tracks_share_fraction() {
        let mut m = Motion::animate(
            vec![
                Track { actor: ActorId::Player, start: Vec2::new(2.0, 2.0), end: Vec2::new(3.0, 2.0) },
                Track { actor: ActorId::Box(BoxId(0)), start: Vec2::new(1.0, 2.0), end: Vec2::new(2.0, 2.0) },
            ],
            0.2,
        );
        let p = m.advance(0.05);
        let dp = p[0].1.x - 2.0;
        let db = p[1].1.x - 1.0;
        assert!((dp - db).abs() < 1e-6);
        assert!((dp - 0.25).abs() < 1e-5);
    }

    #[test]
    fn zero_duration_finishes_immediately() {
        let mut m = Motion::animate(
            vec![Track { actor: ActorId::Player, start: Vec2::ZERO, end: Vec2::new(0.0, 1.0) }],
            0.0,
        );
        assert_eq!(m.advance(0.0), vec![(ActorId::Player, Vec2::new(0.0, 1.0))]);
        assert!(m.is_finished());
    }

    #[test]
    fn bounce_peaks_then_returns() {
        let start = Vec2::new(2.0, 2.0);
        let mut m = Motion::bounce(&[(ActorId::Player, start)], Direction::Right, 0.25, 0.05);
        assert_eq!(m.kind(), MotionKind::Bounce);

        let peak = m.advance(0.05);
        // Exactly at the end of the first leg: snapped to the peak, then the
        // zero leftover starts the return leg at t = 0.
        assert!((peak[0].1.x - 2.25).abs() < 1e-6);
        let end = run_to_end(&mut m, 0.016);
        assert_eq!(end, vec![(ActorId::Player, start)]);
    }

    #[test]
    fn leftover_time_carries_into_next_leg() {
        let start = Vec2::new(0.0, 0.0);
        let mut m = Motion::bounce(&[(ActorId::Player, start)], Direction::Down, 0.5, 0.1);
        let p = m.advance(0.15); // 0.1 out + 0.05 back
        assert!((p[0].1.y - 0.25).abs() < 1e-5);
    }

    #[test]
    fn bounce_involves_every_participant() {
        let m = Motion::bounce(
            &[(ActorId::Player, Vec2::new(2.0, 2.0)), (ActorId::Box(BoxId(3)), Vec2::new(1.0, 2.0))],
            Direction::Right,
            0.25,
            0.05,
        );
        assert!(m.involves(ActorId::Player));
        assert!(m.involves(ActorId::Box(BoxId(3))));
        assert!(!m.involves(ActorId::Box(BoxId(0))));
        assert_eq!(m.participants().collect::<Vec<_>>(), vec![ActorId::Player, ActorId::Box(BoxId(3))]);
    }

    fn any_direction() -> impl Strategy<Value = Direction> {
        prop::sample::select(Direction::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn bounce_always_returns_to_start(
            x in -50i32..50, y in -50i32..50,
            dir in any_direction(),
            distance in 0.0f32..0.9,
            duration in 0.0f32..0.5,
            dt in 0.001f32..0.1,
        ) {
            let start = Vec2::new(x as f32, y as f32);
            let mut m = Motion::bounce(&[(ActorId::Player, start)], dir, distance, duration);
            let end = run_to_end(&mut m, dt);
            prop_assert_eq!(end, vec![(ActorId::Player, start)]);
        }

        #[test]
        fn step_ends_grid_aligned(
            x in -50i32..50, y in -50i32..50,
            dir in any_direction(),
            duration in 0.0f32..0.5,
            dt in 0.001f32..0.1,
        ) {
            let start = Vec2::new(x as f32, y as f32);
            let end = start + dir.vector();
            let mut m = Motion::animate(vec![Track { actor: ActorId::Player, start, end }], duration);
            let last = run_to_end(&mut m, dt);
            prop_assert_eq!(last.len(), 1);
            prop_assert!(last[0].1.is_grid_aligned());
            prop_assert_eq!(last[0].1, end);
        }
    }
}
