/// Sound engine: procedural chiptune sound effects via rodio.
///
/// Every effect is synthesized once into an in-memory WAV buffer at init
/// time. Playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// Compile without the "sound" feature to disable audio entirely
/// (the stub SoundEngine does nothing).

use crate::sim::event::GameEvent;

/// One effect per kind of game notification.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Sfx {
    Step,
    Drag,
    Bump,
    Grab,
    Release,
    Fail,
    Undo,
    Point,
    Clear,
    Reset,
    TimeUp,
    Booster,
    Checkpoint,
}

impl Sfx {
    #[cfg_attr(not(feature = "sound"), allow(dead_code))]
    pub const ALL: [Sfx; 13] = [
        Sfx::Step, Sfx::Drag, Sfx::Bump, Sfx::Grab, Sfx::Release, Sfx::Fail, Sfx::Undo,
        Sfx::Point, Sfx::Clear, Sfx::Reset, Sfx::TimeUp, Sfx::Booster, Sfx::Checkpoint,
    ];
}

/// Which effect (if any) a notification plays. Targets only chime when
/// they become occupied.
pub fn sfx_for(event: &GameEvent) -> Option<Sfx> {
    let sfx = match event {
        GameEvent::MoveSucceeded { dragged: Some(_), .. } => Sfx::Drag,
        GameEvent::MoveSucceeded { .. } => Sfx::Step,
        GameEvent::MoveBlocked { .. } => Sfx::Bump,
        GameEvent::BoxGrabbed { .. } => Sfx::Grab,
        GameEvent::GrabFailed => Sfx::Fail,
        GameEvent::BoxReleased { .. } => Sfx::Release,
        GameEvent::UndoPerformed => Sfx::Undo,
        GameEvent::TargetOccupancyChanged { occupied: true, .. } => Sfx::Point,
        GameEvent::TargetOccupancyChanged { .. } => return None,
        GameEvent::LevelCompleted { .. } => Sfx::Clear,
        GameEvent::TimedOut => Sfx::TimeUp,
        GameEvent::LevelReset => Sfx::Reset,
        GameEvent::CheckpointCreated | GameEvent::CheckpointRestored => Sfx::Checkpoint,
        GameEvent::BoosterActivated(_) => Sfx::Booster,
        GameEvent::BoosterExpired(_) => return None,
    };
    Some(sfx)
}

#[cfg(feature = "sound")]
mod inner {
    use std::collections::HashMap;
    use std::f32::consts::TAU;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::Sfx;

    const SAMPLE_RATE: u32 = 22050;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        buffers: HashMap<Sfx, Arc<Vec<u8>>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;
            let buffers = Sfx::ALL
                .iter()
                .map(|&sfx| (sfx, Arc::new(make_wav(&synth(sfx)))))
                .collect();
            Some(SoundEngine { _stream: stream, handle, buffers })
        }

        pub fn play(&self, sfx: Sfx) {
            let buf = match self.buffers.get(&sfx) {
                Some(b) => b,
                None => return,
            };
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Synthesis: all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    fn synth(sfx: Sfx) -> Vec<f32> {
        match sfx {
            Sfx::Step => sweep(330.0, 290.0, 0.04, 0.12),
            Sfx::Drag => {
                let mut s = sweep(180.0, 140.0, 0.09, 0.2);
                mix_noise(&mut s, 0.25, 7);
                s
            }
            Sfx::Bump => {
                let mut s = sweep(140.0, 90.0, 0.07, 0.3);
                mix_noise(&mut s, 0.4, 99);
                s
            }
            Sfx::Grab => notes(&[(523.0, 0.04), (784.0, 0.06)], 0.25),
            Sfx::Release => notes(&[(784.0, 0.04), (523.0, 0.06)], 0.2),
            Sfx::Fail => notes(&[(220.0, 0.06), (196.0, 0.08)], 0.25),
            Sfx::Undo => sweep(700.0, 350.0, 0.08, 0.2),
            Sfx::Point => notes(&[(1047.0, 0.05), (1319.0, 0.05), (1568.0, 0.08)], 0.25),
            Sfx::Clear => notes(&[(523.0, 0.1), (659.0, 0.1), (784.0, 0.1), (1047.0, 0.3)], 0.3),
            Sfx::Reset => sweep(200.0, 600.0, 0.15, 0.2),
            Sfx::TimeUp => notes(&[(440.0, 0.12), (370.0, 0.12), (311.0, 0.12), (261.0, 0.3)], 0.3),
            Sfx::Booster => sweep(400.0, 1600.0, 0.2, 0.2),
            Sfx::Checkpoint => notes(&[(880.0, 0.05), (880.0, 0.05)], 0.2),
        }
    }

    /// Sequence of square-ish tones, each fading out.
    fn notes(seq: &[(f32, f32)], volume: f32) -> Vec<f32> {
        let mut samples = Vec::new();
        for &(freq, dur) in seq {
            let n = (SAMPLE_RATE as f32 * dur) as usize;
            samples.extend((0..n).map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.5);
                let wave = (t * freq * TAU).sin() * 0.7 + (t * freq * 3.0 * TAU).sin() * 0.3;
                wave * env * volume
            }));
        }
        samples
    }

    /// Linear pitch glide from `from` to `to` Hz.
    fn sweep(from: f32, to: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                phase += (from + (to - from) * t) * TAU / SAMPLE_RATE as f32;
                phase.sin() * (1.0 - t).powf(0.7) * volume
            })
            .collect()
    }

    /// Blend LCG noise into `samples`, following their envelope.
    fn mix_noise(samples: &mut [f32], amount: f32, seed: u32) {
        let mut rng = seed;
        for s in samples.iter_mut() {
            rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
            let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
            *s = *s * (1.0 - amount) + noise * s.abs() * amount;
        }
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder (16-bit mono PCM)
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let data_size = samples.len() as u32 * 2;
        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&1u16.to_le_bytes()); // mono
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&(SAMPLE_RATE * 2).to_le_bytes()); // byte rate
        buf.extend_from_slice(&2u16.to_le_bytes()); // block align
        buf.extend_from_slice(&16u16.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }
        buf
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn every_effect_encodes_to_a_wav() {
            for sfx in Sfx::ALL {
                let wav = make_wav(&synth(sfx));
                assert_eq!(&wav[0..4], b"RIFF");
                assert!(wav.len() > 44, "{sfx:?} is silent");
            }
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _sfx: Sfx) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::{ActorId, BoxId, TargetId};
    use crate::domain::grid::Direction;

    #[test]
    fn drag_and_step_sound_differently() {
        let step = GameEvent::MoveSucceeded { actor: ActorId::Player, direction: Direction::Up, dragged: None };
        let drag = GameEvent::MoveSucceeded { actor: ActorId::Player, direction: Direction::Up, dragged: Some(BoxId(0)) };
        assert_eq!(sfx_for(&step), Some(Sfx::Step));
        assert_eq!(sfx_for(&drag), Some(Sfx::Drag));
    }

    #[test]
    fn only_newly_occupied_targets_chime() {
        let on = GameEvent::TargetOccupancyChanged { target: TargetId::Box(0), occupied: true };
        let off = GameEvent::TargetOccupancyChanged { target: TargetId::Box(0), occupied: false };
        assert_eq!(sfx_for(&on), Some(Sfx::Point));
        assert_eq!(sfx_for(&off), None);
    }
}
