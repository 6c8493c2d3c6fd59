/// Keyboard state tracker and key bindings.
///
/// Tracks which keys are currently held down, enabling:
///   - Continuous movement while an arrow / WASD key is held
///   - Edge-triggered commands (grab, undo, checkpoint...) on initial press
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't support it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::grid::Direction;

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

// ── Bindings ──

/// One-shot commands the keyboard can issue.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum KeyCommand {
    GrabToggle,
    Undo,
    Reset,
    Checkpoint,
    FreezeTime,
    SpeedUp,
    Pause,
    Confirm,
    Quit,
}

/// Checked in order; the first held direction wins.
const DIRECTION_KEYS: [(Direction, &[KeyCode]); 4] = [
    (Direction::Up, &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')]),
    (Direction::Down, &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')]),
    (Direction::Left, &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')]),
    (Direction::Right, &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')]),
];

pub fn command_for(code: KeyCode) -> Option<KeyCommand> {
    let cmd = match code {
        KeyCode::Char(' ') | KeyCode::Char('h') | KeyCode::Char('H') => KeyCommand::GrabToggle,
        KeyCode::Char('u') | KeyCode::Char('U') | KeyCode::Char('z') | KeyCode::Char('Z') => KeyCommand::Undo,
        KeyCode::Char('r') | KeyCode::Char('R') => KeyCommand::Reset,
        KeyCode::Char('c') | KeyCode::Char('C') => KeyCommand::Checkpoint,
        KeyCode::Char('f') | KeyCode::Char('F') => KeyCommand::FreezeTime,
        KeyCode::Char('t') | KeyCode::Char('T') => KeyCommand::SpeedUp,
        KeyCode::Char('p') | KeyCode::Char('P') => KeyCommand::Pause,
        KeyCode::Enter => KeyCommand::Confirm,
        KeyCode::Esc => KeyCommand::Quit,
        _ => return None,
    };
    Some(cmd)
}

// ── Tracker ──

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that transitioned from "not held" → "held" during the
    /// most recent drain_events() call.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for Ctrl+C detection.
    raw_events: Vec<KeyEvent>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame, before the simulation tick.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.raw_events.push(key);
                self.apply(key.code, key.kind, Instant::now());
            }
        }

        // Expire keys that have timed out (fallback for terminals without Release)
        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn apply(&mut self, code: KeyCode, kind: KeyEventKind, at: Instant) {
        match kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&code);
            }
            // no enhancement: rely on timeout-based expiry
            KeyEventKind::Release => {}
            _ => {
                let was_held = self.is_held(code);
                self.last_active.insert(code, at);
                if !was_held {
                    self.fresh_presses.push(code);
                }
            }
        }
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.last_active
            .get(&code)
            .map_or(false, |t| t.elapsed() < HOLD_TIMEOUT)
    }

    /// First held movement direction, in Up, Down, Left, Right order.
    pub fn held_direction(&self) -> Option<Direction> {
        DIRECTION_KEYS
            .iter()
            .find(|(_, keys)| keys.iter().any(|k| self.is_held(*k)))
            .map(|(dir, _)| *dir)
    }

    /// Commands freshly pressed this frame, in press order.
    pub fn commands(&self) -> Vec<KeyCommand> {
        self.fresh_presses.iter().filter_map(|c| command_for(*c)).collect()
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bindings() {
        let mut kb = InputState::new();
        kb.apply(KeyCode::Char('a'), KeyEventKind::Press, Instant::now());
        assert_eq!(kb.held_direction(), Some(Direction::Left));
        kb.apply(KeyCode::Char('x'), KeyEventKind::Press, Instant::now());
        assert_eq!(kb.held_direction(), Some(Direction::Left));
        assert_eq!(command_for(KeyCode::Char(' ')), Some(KeyCommand::GrabToggle));
        assert_eq!(command_for(KeyCode::Char('Z')), Some(KeyCommand::Undo));
        assert_eq!(command_for(KeyCode::Esc), Some(KeyCommand::Quit));
        assert_eq!(command_for(KeyCode::Char('w')), None);
    }

    #[test]
    fn press_is_fresh_once_then_held() {
        let mut kb = InputState::new();
        let now = Instant::now();
        kb.apply(KeyCode::Char('h'), KeyEventKind::Press, now);
        kb.apply(KeyCode::Left, KeyEventKind::Press, now);
        assert_eq!(kb.commands(), vec![KeyCommand::GrabToggle]);
        assert_eq!(kb.held_direction(), Some(Direction::Left));

        kb.fresh_presses.clear();
        kb.apply(KeyCode::Char('h'), KeyEventKind::Repeat, now);
        assert!(kb.commands().is_empty());
    }

    #[test]
    fn release_honored_only_with_enhancement() {
        let mut kb = InputState::new();
        let now = Instant::now();
        kb.apply(KeyCode::Up, KeyEventKind::Press, now);
        kb.apply(KeyCode::Up, KeyEventKind::Release, now);
        assert_eq!(kb.held_direction(), Some(Direction::Up));

        kb.honor_release = true;
        kb.apply(KeyCode::Up, KeyEventKind::Release, now);
        assert_eq!(kb.held_direction(), None);
    }
}
