/// Gamepad input tracker using gilrs.
///
/// Button mapping is loaded from config.toml via `load_button_config()`.
/// Default mapping:
///   D-pad                 →  Movement (digital)
///   Left Stick            →  Movement (analog, thresholded by the world)
///   A / X                 →  Grab / Release
///   B / L1                →  Undo
///   Y / R1                →  Checkpoint
///   Select                →  Reset / Quit
///   Start                 →  Confirm

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;
use crate::domain::grid::{Direction, Vec2};

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,      // LeftTrigger
    R1,      // RightTrigger
    L2,      // LeftTrigger2
    R2,      // RightTrigger2
    Start,
    Select,
}

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH"  => Some(Btn::A),
            "B" | "EAST"   => Some(Btn::B),
            "X" | "WEST"   => Some(Btn::X),
            "Y" | "NORTH"  => Some(Btn::Y),
            "L1" | "LB" | "LEFTTRIGGER"  => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "L2" | "LT" | "LEFTTRIGGER2"  => Some(Btn::L2),
            "R2" | "RT" | "RIGHTTRIGGER2" => Some(Btn::R2),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South     => Some(Btn::A),
            Button::East      => Some(Btn::B),
            Button::West      => Some(Btn::X),
            Button::North     => Some(Btn::Y),
            Button::LeftTrigger  => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::LeftTrigger2  => Some(Btn::L2),
            Button::RightTrigger2 => Some(Btn::R2),
            Button::Start     => Some(Btn::Start),
            Button::Select    => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Per-button state: held (continuous) and just_pressed (edge).
#[derive(Clone, Copy, Debug, Default)]
struct BtnState {
    held: bool,
    just_pressed: bool,
}

/// Gameplay actions a button can be bound to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PadAction {
    Grab,
    Undo,
    Reset,
    Checkpoint,
    Confirm,
    Cancel,
}

/// Action-to-button mapping (loaded from config).
#[derive(Debug)]
struct ActionMap {
    grab: Vec<Btn>,
    undo: Vec<Btn>,
    reset: Vec<Btn>,
    checkpoint: Vec<Btn>,
    confirm: Vec<Btn>,
    cancel: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            grab:       vec![Btn::A, Btn::X],
            undo:       vec![Btn::B, Btn::L1],
            reset:      vec![Btn::Select],
            checkpoint: vec![Btn::Y, Btn::R1],
            confirm:    vec![Btn::Start],
            cancel:     vec![Btn::Select],
        }
    }
}

impl ActionMap {
    fn buttons(&self, action: PadAction) -> &[Btn] {
        match action {
            PadAction::Grab => &self.grab,
            PadAction::Undo => &self.undo,
            PadAction::Reset => &self.reset,
            PadAction::Checkpoint => &self.checkpoint,
            PadAction::Confirm => &self.confirm,
            PadAction::Cancel => &self.cancel,
        }
    }

    /// Overwrite each action whose configured list names at least one
    /// known button; unknown names are skipped.
    fn apply(&mut self, cfg: &GamepadConfig) {
        fn parse_list(names: &[String]) -> Vec<Btn> {
            names.iter().filter_map(|s| Btn::from_name(s)).collect()
        }
        let slots: [(&mut Vec<Btn>, &[String]); 6] = [
            (&mut self.grab, &cfg.grab),
            (&mut self.undo, &cfg.undo),
            (&mut self.reset, &cfg.reset),
            (&mut self.checkpoint, &cfg.checkpoint),
            (&mut self.confirm, &cfg.confirm),
            (&mut self.cancel, &cfg.cancel),
        ];
        for (slot, names) in slots {
            let btns = parse_list(names);
            if !btns.is_empty() {
                *slot = btns;
            }
        }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    // All tracked buttons (indexed by Btn)
    buttons: [BtnState; 10],

    // D-pad (Up, Down, Left, Right)
    dpad: [bool; 4],

    // Left stick, raw gilrs values (+y up)
    stick_x: f32,
    stick_y: f32,

    action_map: ActionMap,

    pub connected: bool,
}

fn btn_index(btn: Btn) -> usize {
    btn as usize
}

fn dpad_index(dir: Direction) -> usize {
    match dir {
        Direction::Up => 0,
        Direction::Down => 1,
        Direction::Left => 2,
        Direction::Right => 3,
    }
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = {
            match Gilrs::new() {
                Ok(g) => {
                    let has_pad = g.gamepads().next().is_some();
                    (Some(g), has_pad)
                }
                Err(_) => (None, false),
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            buttons: [BtnState::default(); 10],
            dpad: [false; 4],
            stick_x: 0.0,
            stick_y: 0.0,
            action_map: ActionMap::default(),
            connected,
        }
    }

    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        self.action_map.apply(cfg);
    }

    pub fn update(&mut self) {
        for b in &mut self.buttons { b.just_pressed = false; }

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, true);
                }
                EventType::ButtonReleased(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, false);
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    match axis {
                        Axis::LeftStickX => self.stick_x = value,
                        Axis::LeftStickY => self.stick_y = value,
                        _ => {}
                    }
                }
                EventType::Connected => { self.connected = true; }
                EventType::Disconnected => {
                    self.connected = false;
                    self.release_all();
                }
                _ => {}
            }
        }
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, gilrs_btn: Button, held: bool) {
        let dpad = match gilrs_btn {
            Button::DPadUp    => Some(Direction::Up),
            Button::DPadDown  => Some(Direction::Down),
            Button::DPadLeft  => Some(Direction::Left),
            Button::DPadRight => Some(Direction::Right),
            _ => None,
        };
        if let Some(dir) = dpad {
            self.dpad[dpad_index(dir)] = held;
            return;
        }

        if let Some(btn) = Btn::from_gilrs(gilrs_btn) {
            self.press(btn, held);
        }
    }

    fn press(&mut self, btn: Btn, held: bool) {
        let state = &mut self.buttons[btn_index(btn)];
        if held && !state.held {
            state.just_pressed = true;
        }
        state.held = held;
    }

    // ── Queries ──

    pub fn pressed(&self, action: PadAction) -> bool {
        self.action_map
            .buttons(action)
            .iter()
            .any(|&b| self.buttons[btn_index(b)].just_pressed)
    }

    /// First held d-pad direction, in Up, Down, Left, Right order.
    pub fn dpad_direction(&self) -> Option<Direction> {
        Direction::ALL.into_iter().find(|&d| self.dpad[dpad_index(d)])
    }

    /// Left stick in grid space (+y down).
    pub fn stick(&self) -> Vec2 {
        Vec2::new(self.stick_x, -self.stick_y)
    }

    fn release_all(&mut self) {
        for b in &mut self.buttons { *b = BtnState::default(); }
        self.dpad = [false; 4];
        self.stick_x = 0.0;
        self.stick_y = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn button_names_are_case_insensitive() {
        assert_eq!(Btn::from_name("south"), Some(Btn::A));
        assert_eq!(Btn::from_name("Rb"), Some(Btn::R1));
        assert_eq!(Btn::from_name("back"), Some(Btn::Select));
        assert_eq!(Btn::from_name("turbo"), None);
    }

    #[test]
    fn config_overrides_only_known_buttons() {
        let cfg = GamepadConfig {
            grab: names(&["Y"]),
            undo: names(&["nope"]),
            reset: vec![],
            checkpoint: names(&["L2", "R2"]),
            confirm: names(&["A"]),
            cancel: names(&["B"]),
        };
        let mut map = ActionMap::default();
        map.apply(&cfg);
        assert_eq!(map.grab, vec![Btn::Y]);
        assert_eq!(map.undo, vec![Btn::B, Btn::L1]);
        assert_eq!(map.reset, vec![Btn::Select]);
        assert_eq!(map.checkpoint, vec![Btn::L2, Btn::R2]);
    }

    #[test]
    fn press_edges_and_stick_flip() {
        let mut gp = GamepadState::new();
        gp.press(Btn::A, true);
        assert!(gp.pressed(PadAction::Grab));
        gp.buttons[btn_index(Btn::A)].just_pressed = false;
        gp.press(Btn::A, true);
        assert!(!gp.pressed(PadAction::Grab));

        gp.stick_y = 0.8;
        assert_eq!(gp.stick(), Vec2::new(0.0, -0.8));
        gp.dpad[dpad_index(Direction::Left)] = true;
        assert_eq!(gp.dpad_direction(), Some(Direction::Left));
    }
}
