/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
/// Durations are in seconds unless the key says otherwise.

use serde::Deserialize;
use std::path::PathBuf;
use tracing::{info, warn};

// ── Public Config Structs ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub speed: SpeedConfig,
    pub interaction: InteractionConfig,
    pub gamepad: GamepadConfig,
    pub levels_dir: PathBuf,
    /// Countdown for levels whose file sets no `;time=`. 0 disables it.
    pub default_time_limit: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SpeedConfig {
    pub tick_rate_ms: u64,
    pub move_duration: f32,
    pub bounce_distance: f32,
    pub bounce_duration: f32,   // per leg (out, then back)
    pub move_buffer_window: f32,
    pub grab_buffer_window: f32,
    pub release_buffer_window: f32,
    pub boosted_move_duration: f32,
    pub booster_duration: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InteractionConfig {
    pub detection_distance: f32,
    pub detection_radius: f32,
    pub target_tolerance: f32,
    pub stick_deadzone: f32,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub grab: Vec<String>,
    pub undo: Vec<String>,
    pub reset: Vec<String>,
    pub checkpoint: Vec<String>,
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    speed: TomlSpeed,
    #[serde(default)]
    interaction: TomlInteraction,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_move_duration")]
    move_duration: f32,
    #[serde(default = "default_bounce_distance")]
    bounce_distance: f32,
    #[serde(default = "default_bounce_duration")]
    bounce_duration: f32,
    #[serde(default = "default_move_buffer")]
    move_buffer_window: f32,
    #[serde(default = "default_grab_buffer")]
    grab_buffer_window: f32,
    #[serde(default = "default_release_buffer")]
    release_buffer_window: f32,
    #[serde(default = "default_boosted_move")]
    boosted_move_duration: f32,
    #[serde(default = "default_booster_duration")]
    booster_duration: f32,
}

#[derive(Deserialize, Debug)]
struct TomlInteraction {
    #[serde(default = "default_detection_distance")]
    detection_distance: f32,
    #[serde(default = "default_detection_radius")]
    detection_radius: f32,
    #[serde(default = "default_target_tolerance")]
    target_tolerance: f32,
    #[serde(default = "default_stick_deadzone")]
    stick_deadzone: f32,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_grab")]
    grab: Vec<String>,
    #[serde(default = "default_undo")]
    undo: Vec<String>,
    #[serde(default = "default_reset")]
    reset: Vec<String>,
    #[serde(default = "default_checkpoint")]
    checkpoint: Vec<String>,
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
    #[serde(default = "default_time_limit")]
    default_time_limit: f32,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 16 }
fn default_move_duration() -> f32 { 0.135 }
fn default_bounce_distance() -> f32 { 0.25 }
fn default_bounce_duration() -> f32 { 0.05 }
fn default_move_buffer() -> f32 { 0.065 }
fn default_grab_buffer() -> f32 { 0.135 }
fn default_release_buffer() -> f32 { 0.135 }
fn default_boosted_move() -> f32 { 0.1 }
fn default_booster_duration() -> f32 { 60.0 }

fn default_detection_distance() -> f32 { 0.6 }
fn default_detection_radius() -> f32 { 0.3 }
fn default_target_tolerance() -> f32 { 0.1 }
fn default_stick_deadzone() -> f32 { 0.1 }

fn default_grab() -> Vec<String> { vec!["A".into(), "X".into()] }
fn default_undo() -> Vec<String> { vec!["B".into(), "L1".into()] }
fn default_reset() -> Vec<String> { vec!["Select".into()] }
fn default_checkpoint() -> Vec<String> { vec!["Y".into(), "R1".into()] }
fn default_confirm() -> Vec<String> { vec!["Start".into()] }
fn default_cancel() -> Vec<String> { vec!["Select".into()] }

fn default_levels_dir() -> String { "levels".into() }
fn default_time_limit() -> f32 { 120.0 }

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed {
            tick_rate_ms: default_tick_rate(),
            move_duration: default_move_duration(),
            bounce_distance: default_bounce_distance(),
            bounce_duration: default_bounce_duration(),
            move_buffer_window: default_move_buffer(),
            grab_buffer_window: default_grab_buffer(),
            release_buffer_window: default_release_buffer(),
            boosted_move_duration: default_boosted_move(),
            booster_duration: default_booster_duration(),
        }
    }
}

impl Default for TomlInteraction {
    fn default() -> Self {
        TomlInteraction {
            detection_distance: default_detection_distance(),
            detection_radius: default_detection_radius(),
            target_tolerance: default_target_tolerance(),
            stick_deadzone: default_stick_deadzone(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            grab: default_grab(),
            undo: default_undo(),
            reset: default_reset(),
            checkpoint: default_checkpoint(),
            confirm: default_confirm(),
            cancel: default_cancel(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
            default_time_limit: default_time_limit(),
        }
    }
}

impl Default for SpeedConfig {
    fn default() -> Self {
        TomlSpeed::default().into()
    }
}

impl Default for InteractionConfig {
    fn default() -> Self {
        TomlInteraction::default().into()
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), &[])
    }
}

impl From<TomlSpeed> for SpeedConfig {
    fn from(t: TomlSpeed) -> Self {
        SpeedConfig {
            tick_rate_ms: t.tick_rate_ms.max(1),
            move_duration: t.move_duration.max(0.0),
            bounce_distance: t.bounce_distance.clamp(0.0, 0.9),
            bounce_duration: t.bounce_duration.max(0.0),
            move_buffer_window: t.move_buffer_window.max(0.0),
            grab_buffer_window: t.grab_buffer_window.max(0.0),
            release_buffer_window: t.release_buffer_window.max(0.0),
            boosted_move_duration: t.boosted_move_duration.max(0.0),
            booster_duration: t.booster_duration.max(0.0),
        }
    }
}

impl From<TomlInteraction> for InteractionConfig {
    fn from(t: TomlInteraction) -> Self {
        InteractionConfig {
            detection_distance: t.detection_distance,
            detection_radius: t.detection_radius.max(0.0),
            target_tolerance: t.target_tolerance.max(0.0),
            stick_deadzone: t.stick_deadzone.clamp(0.0, 1.0),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        GameConfig::from_toml(toml_cfg, &search_dirs)
    }

    fn from_toml(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        // Resolve levels directory
        let levels_dir_str = &toml_cfg.general.levels_dir;
        let levels_dir = if PathBuf::from(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        GameConfig {
            speed: toml_cfg.speed.into(),
            interaction: toml_cfg.interaction.into(),
            gamepad: GamepadConfig {
                grab: toml_cfg.gamepad.grab,
                undo: toml_cfg.gamepad.undo,
                reset: toml_cfg.gamepad.reset,
                checkpoint: toml_cfg.gamepad.checkpoint,
                confirm: toml_cfg.gamepad.confirm,
                cancel: toml_cfg.gamepad.cancel,
            },
            levels_dir,
            default_time_limit: toml_cfg.general.default_time_limit.max(0.0),
        }
    }
}

/// Candidate directories to search: exe dir + CWD + user data dir (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // XDG data home (~/.local/share/pullbox)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/pullbox");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                Ok(cfg) => {
                    info!(path = %path.display(), "loaded config");
                    return cfg;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "config parse error, using defaults");
                    eprintln!("Warning: config.toml parse error: {e}");
                    eprintln!("Using default settings.");
                    return TomlConfig::default();
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read config");
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg: TomlConfig = toml::from_str("").unwrap();
        let speed: SpeedConfig = cfg.speed.into();
        assert_eq!(speed, SpeedConfig::default());
        assert_eq!(speed.tick_rate_ms, 16);
        assert!((speed.move_duration - 0.135).abs() < 1e-6);
        assert!((cfg.general.default_time_limit - 120.0).abs() < 1e-6);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let cfg: TomlConfig = toml::from_str(
            "[speed]\nmove_duration = 0.2\n\n[interaction]\nstick_deadzone = 0.25\n",
        )
        .unwrap();
        let speed: SpeedConfig = cfg.speed.into();
        let inter: InteractionConfig = cfg.interaction.into();
        assert!((speed.move_duration - 0.2).abs() < 1e-6);
        assert!((speed.bounce_distance - 0.25).abs() < 1e-6);
        assert!((inter.stick_deadzone - 0.25).abs() < 1e-6);
        assert!((inter.detection_distance - 0.6).abs() < 1e-6);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let cfg: TomlConfig = toml::from_str(
            "[speed]\nbounce_distance = 3.0\ntick_rate_ms = 0\nmove_duration = -1.0\n",
        )
        .unwrap();
        let speed: SpeedConfig = cfg.speed.into();
        assert!(speed.bounce_distance < 1.0);
        assert_eq!(speed.tick_rate_ms, 1);
        assert_eq!(speed.move_duration, 0.0);
    }

    #[test]
    fn gamepad_lists_override() {
        let cfg: TomlConfig = toml::from_str("[gamepad]\ngrab = [\"B\"]\n").unwrap();
        let built = GameConfig::from_toml(cfg, &[]);
        assert_eq!(built.gamepad.grab, vec!["B".to_string()]);
        assert_eq!(built.gamepad.confirm, vec!["Start".to_string()]);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(toml::from_str::<TomlConfig>("[speed\nmove_duration = ").is_err());
    }
}
