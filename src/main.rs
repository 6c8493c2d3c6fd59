/// Entry point and game loop.

mod config;
mod domain;
mod error;
mod sim;
mod ui;

use std::fs::File;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::GameConfig;
use domain::grid::Direction;
use error::GameError;
use sim::event::GameEvent;
use sim::level::{load_level, load_levels};
use sim::step;
use sim::world::{Phase, WorldState};
use ui::gamepad::{GamepadState, PadAction};
use ui::input::{InputState, KeyCommand};
use ui::renderer::Renderer;
use ui::sound::{sfx_for, SoundEngine};

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    if let Err(e) = init_logging() {
        eprintln!("Log file setup failed: {e}");
    }

    let config = GameConfig::load();

    let mut world = match start_world(&config) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("Could not start: {e}");
            return;
        }
    };

    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();

    let result = game_loop(&mut world, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Pullbox!");
    println!("Coins: {}", world.records.coins);
}

/// The terminal is in raw mode while playing, so logs only go to the
/// file named by `PULLBOX_LOG`.
fn init_logging() -> std::io::Result<()> {
    let Some(path) = std::env::var_os("PULLBOX_LOG") else {
        return Ok(());
    };
    let file = File::create(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn start_world(config: &GameConfig) -> error::Result<WorldState> {
    let levels = load_levels(&config.levels_dir);
    if levels.is_empty() {
        return Err(GameError::NoLevels);
    }
    info!(count = levels.len(), "levels loaded");
    let mut world = WorldState::new(config, levels);
    load_level(&mut world, 0)?;
    Ok(world)
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.speed.tick_rate_ms);
    let dt = tick_rate.as_secs_f32();

    let mut held: Option<Direction> = None;

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            break;
        }

        let was_playing = world.phase == Phase::Playing && !world.paused;
        let mut events = Vec::new();
        if handle_meta(world, &kb, &gp, &mut events) {
            break;
        }

        // Feed only transitions: the world keeps its own held state.
        let now_held = kb.held_direction().or_else(|| gp.dpad_direction());
        if now_held != held {
            if let Some(dir) = held {
                world.set_directional_input(dir, false);
            }
            if let Some(dir) = now_held {
                world.set_directional_input(dir, true);
            }
            held = now_held;
        }
        world.set_stick(gp.stick());

        if was_playing && world.phase == Phase::Playing && !world.paused {
            forward_commands(world, &kb, &gp);
        }

        if last_tick.elapsed() >= tick_rate {
            events.extend(step::step(world, dt));
            last_tick = Instant::now();
        }

        process_sound_events(sound, &events);
        renderer.render(world, gp.connected)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// Gameplay commands become latched requests consumed by the next tick.
fn forward_commands(world: &mut WorldState, kb: &InputState, gp: &GamepadState) {
    for cmd in kb.commands() {
        match cmd {
            KeyCommand::GrabToggle => world.request_grab_toggle(),
            KeyCommand::Undo => world.request_undo(),
            KeyCommand::Reset => world.request_reset(),
            KeyCommand::Checkpoint => world.request_checkpoint(),
            KeyCommand::FreezeTime => world.request_freeze_time(),
            KeyCommand::SpeedUp => world.request_speed_up(),
            KeyCommand::Pause | KeyCommand::Confirm | KeyCommand::Quit => {}
        }
    }
    if gp.pressed(PadAction::Grab) { world.request_grab_toggle(); }
    if gp.pressed(PadAction::Undo) { world.request_undo(); }
    if gp.pressed(PadAction::Reset) { world.request_reset(); }
    if gp.pressed(PadAction::Checkpoint) { world.request_checkpoint(); }
}

/// Pause, quit and between-level transitions. Returns true to quit.
fn handle_meta(world: &mut WorldState, kb: &InputState, gp: &GamepadState, events: &mut Vec<GameEvent>) -> bool {
    let cmds = kb.commands();
    let has = |c: KeyCommand| cmds.contains(&c);

    if has(KeyCommand::Quit) {
        return true;
    }

    if world.paused {
        if gp.pressed(PadAction::Cancel) {
            return true;
        }
        if has(KeyCommand::Pause) || gp.pressed(PadAction::Confirm) {
            world.paused = false;
        }
        return false;
    }

    let confirm = has(KeyCommand::Confirm) || gp.pressed(PadAction::Confirm);
    let retry = has(KeyCommand::Reset) || gp.pressed(PadAction::Reset);

    match world.phase {
        Phase::Playing => {
            if has(KeyCommand::Pause) || gp.pressed(PadAction::Confirm) {
                world.paused = true;
                world.input.clear_commands();
            }
        }
        Phase::LevelComplete => {
            if confirm {
                if let Err(e) = step::next_level(world) {
                    warn!(error = %e, "next level failed");
                    world.set_message("That room could not be loaded", 120);
                }
            } else if retry {
                step::restart_level(world, events);
            }
        }
        Phase::TimedOut => {
            if confirm || retry {
                step::restart_level(world, events);
            }
        }
        Phase::GameComplete => {
            if confirm {
                if let Err(e) = load_level(world, 0) {
                    warn!(error = %e, "restart from first room failed");
                }
            }
        }
    }
    false
}

fn process_sound_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    for effect in events.iter().filter_map(sfx_for) {
        sfx.play(effect);
    }
}
