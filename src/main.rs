/// Entry point and frame loop.

mod backend;
mod config;
mod domain;
mod error;
mod sim;
mod ui;

#[cfg(test)]
mod testutil;

use std::fs::File;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use backend::{AudioBackend, Sfx, Silent};
use config::GameConfig;
use domain::color::Color;
use error::{GameError, InitError};
use sim::event::GameEvent;
use sim::level::load_level;
use sim::step::step;
use sim::world::{GameState, World};
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::screens::Screens;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(2);
/// Longest step ever simulated; a stalled terminal must not teleport
/// anything through walls.
const MAX_STEP_MS: f32 = 100.0;

fn main() {
    let config = GameConfig::load();

    if let Err(e) = init_logging(&config) {
        eprintln!("Warning: {e}; continuing without a log file");
    }

    let mut renderer = Renderer::new(config.screen.width);
    let result = run(&config, &mut renderer);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        error!("fatal: {e}");
        eprintln!("Game error: {e}");
        std::process::exit(1);
    }

    info!("clean exit");
}

fn init_logging(config: &GameConfig) -> Result<(), InitError> {
    let path = config.log_file.display().to_string();
    let file = File::create(&config.log_file)
        .map_err(|e| InitError::Logging { path: path.clone(), reason: e.to_string() })?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| InitError::Logging { path, reason: e.to_string() })
}

fn open_audio(config: &GameConfig) -> Result<Box<dyn AudioBackend>, InitError> {
    if !config.audio.enabled {
        info!("audio disabled by config");
        return Ok(Box::new(Silent));
    }
    let engine = SoundEngine::new()?;
    if config.audio.music {
        engine.loop_music();
    }
    Ok(Box::new(engine))
}

fn run(config: &GameConfig, renderer: &mut Renderer) -> Result<(), GameError> {
    let level = load_level(config).map_err(InitError::from)?;
    let key_releases = renderer.init().map_err(InitError::from)?;

    let mut world = World::init(config, level, renderer, StdRng::from_entropy())?;
    let mut screens = Screens::init(renderer).map_err(InitError::from)?;
    let audio = open_audio(config)?;

    let mut kb = InputState::new();
    kb.honor_release = key_releases;
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);

    let frame = Duration::from_millis(config.screen.frame_ms);
    let mut last_frame = Instant::now();

    loop {
        let mut events = vec![];
        for input in kb.drain_events() {
            events.extend(world.on_key(input));
        }
        for (cmd, action) in gp.update() {
            events.extend(world.apply(cmd, action));
        }
        play_sounds(audio.as_ref(), &events);

        if kb.ctrl_c_pressed() || world.close_requested {
            info!("quit requested");
            break;
        }

        if last_frame.elapsed() >= frame {
            let elapsed_ms = (last_frame.elapsed().as_secs_f32() * 1000.0).min(MAX_STEP_MS);
            last_frame = Instant::now();

            let events = step(&mut world, elapsed_ms, renderer).map_err(|e| {
                error!("enemy spawn failed: {e}");
                e
            })?;
            play_sounds(audio.as_ref(), &events);
            screens.update(world.selection);

            renderer.begin_frame()?;
            let projection = world.projection(&*renderer);
            if world.state == GameState::Level1 {
                world.draw(&projection, renderer);
            } else {
                screens.draw(&world, &projection, renderer);
            }
            renderer.draw_status(&status_line(&world, gp.connected));
            renderer.present()?;
        }

        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// Play the sound for each event and note screen changes in the log.
fn play_sounds(audio: &dyn AudioBackend, events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::StateChanged { from, to } => debug!("screen {from:?} -> {to:?}"),
            GameEvent::CharacterDetected { by } => {
                debug!("death sound, seen by {by:?}");
                audio.play(Sfx::Death);
            }
            GameEvent::TrophyReached => audio.play(Sfx::Win),
            GameEvent::ColorShifted(Color::Green) => audio.play(Sfx::GreenShift),
            _ => {}
        }
    }
}

fn status_line(world: &World, pad: bool) -> String {
    let pad = if pad { "  [pad]" } else { "" };
    if world.state != GameState::Level1 {
        return format!("The Chameleon  |  Esc: start screen  Ctrl-C: quit{pad}");
    }
    let life = if world.character.is_alive() { "alive" } else { "caught" };
    format!(
        "{}  |  color {:?}  |  {}  |  enemy speed {:.1}  |  spotters {}  wanderers {}{pad}",
        world.level.name,
        world.character.color(),
        life,
        world.speed,
        world.spotters.len(),
        world.wanderers.len(),
    )
}
