/// World: the complete state of a running game and its input handling.
///
/// ## State machine
///
///   StartScreen --Enter(sel 0, story unseen)--> StoryScreen --Enter--> Level1
///   StartScreen --Enter(sel 0, story seen)----> Level1
///   StartScreen --Enter(sel 1)----------------> ControlScreen --Enter--> StartScreen
///   StartScreen --Enter(sel 2)----------------> close requested
///   Level1      --trophy reached--------------> WinScreen --Enter--> StartScreen
///   any         --Escape----------------------> StartScreen
///
/// States only change here (`on_key`) or in the step function.
/// The per-frame simulation lives in `sim::step`.

use glam::{Mat3, Vec2};
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use crate::backend::{RenderBackend, SpriteLoader, WindowBackend};
use crate::config::{GameConfig, GameplayConfig};
use crate::domain::character::{Character, CharacterTuning};
use crate::domain::color::Color;
use crate::domain::enemy::{Spotter, Wanderer};
use crate::domain::entity::{Direction, Renderable, Trophy};
use crate::domain::geometry::orthographic;
use crate::error::InitError;
use super::controls::{command_for, Command, ControlScheme, KeyAction, KeyInput};
use super::event::GameEvent;
use super::level::LevelDef;
use super::map::Map;

pub const MAX_SPOTTERS: usize = 5;
pub const MAX_WANDERERS: usize = 10;
/// Highest menu index (0 = play, 1 = controls, 2 = quit).
pub const MAX_SELECTION: usize = 2;
pub const SPEED_STEP: f32 = 0.1;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameState {
    StartScreen,
    ControlScreen,
    StoryScreen,
    Level1,
    WinScreen,
}

pub struct World {
    pub state: GameState,
    /// Highlighted start-screen entry.
    pub selection: usize,
    pub story_shown: bool,
    pub scheme: ControlScheme,
    /// Enemy time multiplier, adjusted in steps of 0.1, never negative.
    pub speed: f32,
    /// Logical screen size; spawn anchors and patrols are laid out in it.
    pub screen: Vec2,
    pub level: LevelDef,
    pub map: Map,
    pub character: Character,
    pub trophy: Trophy,
    pub spotters: Vec<Spotter>,
    pub wanderers: Vec<Wanderer>,
    pub next_wanderer_spawn_ms: f32,
    /// Frames left before another color change is accepted.
    pub color_cooldown: u32,
    pub rng: StdRng,
    pub gameplay: GameplayConfig,
    pub close_requested: bool,
}

impl World {
    pub fn init(
        config: &GameConfig,
        level: LevelDef,
        sprites: &mut dyn SpriteLoader,
        rng: StdRng,
    ) -> Result<Self, InitError> {
        let scheme = ControlScheme::from_name(&config.controls.scheme).unwrap_or_else(|| {
            warn!("unknown control scheme '{}', using wasd", config.controls.scheme);
            ControlScheme::Wasd
        });
        let tuning = tuning_from(&config.gameplay);
        let map = Map::init(level.tiles.clone(), sprites)?;
        let character = Character::init(level.player_spawn_world(), tuning, sprites)?;
        let trophy = Trophy::init(level.trophy_world(), sprites)?;
        info!("world ready: level '{}' ({}x{})", level.name, level.width(), level.height());

        Ok(World {
            state: GameState::StartScreen,
            selection: 0,
            story_shown: false,
            scheme,
            speed: 1.0,
            screen: Vec2::new(config.screen.width, config.screen.height),
            level,
            map,
            character,
            trophy,
            spotters: vec![],
            wanderers: vec![],
            next_wanderer_spawn_ms: 0.0,
            color_cooldown: 0,
            rng,
            gameplay: config.gameplay.clone(),
            close_requested: false,
        })
    }

    // ══════════════════════════════════════════════════════════════
    // Queries
    // ══════════════════════════════════════════════════════════════

    /// Enemies can see the character if it moves, or if its skin does not
    /// match the tile it stands on.
    pub fn character_detectable(&self) -> bool {
        self.character.is_moving() || self.map.tile_color_at(&self.character) != self.character.color()
    }

    /// Camera for this frame. Menus see the whole screen; Level1 looks at
    /// a window around the character at twice the zoom.
    pub fn projection(&self, window: &dyn WindowBackend) -> Mat3 {
        let fb = window.framebuffer_size().as_vec2();
        let density = window.pixel_density().max(f32::EPSILON);
        if self.state == GameState::Level1 {
            let half = fb / (4.0 * density);
            let c = self.character.position;
            orthographic(c.x - half.x, c.y - half.y, c.x + half.x, c.y + half.y)
        } else {
            let full = fb / density;
            orthographic(0.0, 0.0, full.x, full.y)
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Input
    // ══════════════════════════════════════════════════════════════

    pub fn on_key(&mut self, input: KeyInput) -> Vec<GameEvent> {
        match command_for(self.scheme, self.state, &input) {
            Some(cmd) => self.apply(cmd, input.action),
            None => vec![],
        }
    }

    /// Apply a command from any input device.
    pub fn apply(&mut self, cmd: Command, action: KeyAction) -> Vec<GameEvent> {
        let mut events = vec![];
        let pressed = action == KeyAction::Press;
        let in_level = self.state == GameState::Level1;

        match cmd {
            Command::Move(dir) if in_level => self.character.set_direction(dir, pressed),
            Command::Move(dir) if pressed => self.move_selection(dir),
            Command::Shift(color) if in_level && pressed => self.shift_color(color, &mut events),
            Command::Confirm if pressed => self.confirm(&mut events),
            Command::Back if pressed => self.go_to_start(&mut events),
            Command::UseScheme(scheme) if pressed => {
                if self.scheme != scheme {
                    info!("control scheme: {scheme:?}");
                }
                self.scheme = scheme;
                self.character.clear_directions();
            }
            Command::Reset if in_level && !pressed => {
                self.reset_level();
                events.push(GameEvent::LevelReset);
            }
            Command::SlowDown if in_level && !pressed => self.adjust_speed(-SPEED_STEP),
            Command::SpeedUp if in_level && !pressed => self.adjust_speed(SPEED_STEP),
            _ => {}
        }
        events
    }

    fn move_selection(&mut self, dir: Direction) {
        match dir {
            Direction::Up => self.selection = self.selection.saturating_sub(1),
            Direction::Down => self.selection = (self.selection + 1).min(MAX_SELECTION),
            Direction::Left | Direction::Right => {}
        }
    }

    fn adjust_speed(&mut self, delta: f32) {
        // keep the multiplier on exact tenths so repeated steps land on 0.0
        self.speed = (((self.speed + delta) * 10.0).round() / 10.0).max(0.0);
        info!("speed multiplier {:.1}", self.speed);
    }

    /// Try to change the character's skin. Rejected while dashing, during
    /// the cooldown, when dead, or when the color is already worn.
    /// Red arms no cooldown; only a dash stopped by a wall does.
    fn shift_color(&mut self, color: Color, events: &mut Vec<GameEvent>) {
        let c = &self.character;
        if !c.is_alive() || c.is_dashing() || self.color_cooldown > 0 || c.color() == color {
            debug!("color shift to {} rejected", color.name());
            return;
        }
        if !self.character.set_color(color) {
            return;
        }
        match color {
            Color::Red => {
                self.character.start_dash();
            }
            Color::Yellow => {
                self.map.set_flash(true);
                self.map.reset_flash_timer();
            }
            Color::Green | Color::Blue | Color::None => {}
        }
        if color != Color::Red {
            self.color_cooldown = self.gameplay.color_cooldown_frames;
        }
        events.push(GameEvent::ColorShifted(color));
    }

    fn confirm(&mut self, events: &mut Vec<GameEvent>) {
        match self.state {
            GameState::StartScreen => match self.selection {
                0 if self.story_shown => self.enter_level(events),
                0 => {
                    self.story_shown = true;
                    self.transition(GameState::StoryScreen, events);
                }
                1 => self.transition(GameState::ControlScreen, events),
                _ => {
                    info!("quit requested");
                    self.close_requested = true;
                }
            },
            GameState::ControlScreen | GameState::WinScreen => self.transition(GameState::StartScreen, events),
            GameState::StoryScreen => self.enter_level(events),
            GameState::Level1 => {}
        }
    }

    fn enter_level(&mut self, events: &mut Vec<GameEvent>) {
        if !self.character.is_alive() {
            self.reset_level();
            events.push(GameEvent::LevelReset);
        }
        self.transition(GameState::Level1, events);
    }

    fn go_to_start(&mut self, events: &mut Vec<GameEvent>) {
        self.selection = 0;
        self.character.clear_directions();
        self.transition(GameState::StartScreen, events);
    }

    pub fn transition(&mut self, to: GameState, events: &mut Vec<GameEvent>) {
        let from = self.state;
        if from == to {
            return;
        }
        info!("state {from:?} -> {to:?}");
        self.state = to;
        events.push(GameEvent::StateChanged { from, to });
    }

    // ══════════════════════════════════════════════════════════════
    // Level lifecycle
    // ══════════════════════════════════════════════════════════════

    /// Restart the level: fresh character and trophy at their spawn cells,
    /// no enemies, timers and speed back to their starting values.
    pub fn reset_level(&mut self) {
        let tuning = tuning_from(&self.gameplay);
        self.character = Character::new(self.level.player_spawn_world(), tuning, self.character.sprite());
        self.trophy = Trophy::new(self.level.trophy_world(), self.trophy.sprite());
        self.spotters.clear();
        self.wanderers.clear();
        self.map.reset_character_dead_timer();
        self.map.set_flash(false);
        self.map.reset_flash_timer();
        self.speed = 1.0;
        self.next_wanderer_spawn_ms = 0.0;
        self.color_cooldown = 0;
        info!("level '{}' reset", self.level.name);
    }

    // ══════════════════════════════════════════════════════════════
    // Drawing
    // ══════════════════════════════════════════════════════════════

    /// Draw the level. While the map flashes only the tiles are shown.
    pub fn draw(&self, projection: &Mat3, gfx: &mut dyn RenderBackend) {
        self.map.draw(projection, gfx);
        if self.map.flash_active() {
            return;
        }
        self.trophy.draw(projection, gfx);
        for spotter in &self.spotters {
            spotter.draw(projection, gfx);
        }
        for wanderer in &self.wanderers {
            wanderer.draw(projection, gfx);
        }
        self.character.draw(projection, gfx);
    }
}

fn tuning_from(gameplay: &GameplayConfig) -> CharacterTuning {
    CharacterTuning {
        speed: gameplay.character_speed,
        dash_speed: gameplay.dash_speed,
        dash_ms: gameplay.dash_ms,
    }
}

/// Fixed spotter posts: the four corners, then one inside the field.
pub fn spotter_anchor(screen: Vec2, index: usize) -> Vec2 {
    match index % MAX_SPOTTERS {
        0 => Vec2::new(100.0, 100.0),
        1 => Vec2::new(screen.x - 100.0, 100.0),
        2 => Vec2::new(100.0, screen.y - 100.0),
        3 => Vec2::new(screen.x - 100.0, screen.y - 100.0),
        _ => Vec2::new(screen.x * 2.0 / 3.0, screen.y * 5.0 / 8.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::UVec2;
    use crate::sim::controls::Key;
    use crate::testutil::{test_world, FixedWindow, RecordingGfx};

    fn press(world: &mut World, key: Key) -> Vec<GameEvent> {
        world.on_key(KeyInput::press(key))
    }

    fn release(world: &mut World, key: Key) -> Vec<GameEvent> {
        world.on_key(KeyInput::release(key))
    }

    #[test]
    fn menu_flow() {
        let mut w = test_world();
        assert_eq!(w.state, GameState::StartScreen);

        press(&mut w, Key::Enter);
        assert_eq!(w.state, GameState::StoryScreen);
        let ev = press(&mut w, Key::Enter);
        assert_eq!(w.state, GameState::Level1);
        assert_eq!(ev, vec![GameEvent::StateChanged { from: GameState::StoryScreen, to: GameState::Level1 }]);

        press(&mut w, Key::Escape);
        assert_eq!(w.state, GameState::StartScreen);
        press(&mut w, Key::Enter);
        assert_eq!(w.state, GameState::Level1, "story is only shown once");

        press(&mut w, Key::Escape);
        press(&mut w, Key::Down);
        press(&mut w, Key::Enter);
        assert_eq!(w.state, GameState::ControlScreen);
        press(&mut w, Key::Enter);
        assert_eq!(w.state, GameState::StartScreen);
    }

    #[test]
    fn selection_is_bounded_and_quit_requests_close() {
        let mut w = test_world();
        for _ in 0..5 {
            press(&mut w, Key::Up);
        }
        assert_eq!(w.selection, 0);
        for _ in 0..5 {
            press(&mut w, Key::S);
        }
        assert_eq!(w.selection, MAX_SELECTION);
        press(&mut w, Key::Enter);
        assert!(w.close_requested);
        assert_eq!(w.state, GameState::StartScreen);

        press(&mut w, Key::Escape);
        assert_eq!(w.selection, 0);
    }

    #[test]
    fn menu_keys_do_not_move_the_character() {
        let mut w = test_world();
        press(&mut w, Key::Down);
        assert!(!w.character.is_moving());
    }

    #[test]
    fn movement_flags_follow_press_and_release() {
        let mut w = test_world();
        w.state = GameState::Level1;
        press(&mut w, Key::D);
        press(&mut w, Key::S);
        assert!(w.character.is_moving());
        release(&mut w, Key::D);
        assert!(w.character.is_moving());
        release(&mut w, Key::S);
        assert!(!w.character.is_moving());
    }

    #[test]
    fn green_shift_emits_event_and_starts_cooldown() {
        let mut w = test_world();
        w.state = GameState::Level1;
        let ev = press(&mut w, Key::Down);
        assert_eq!(ev, vec![GameEvent::ColorShifted(Color::Green)]);
        assert_eq!(w.character.color(), Color::Green);
        assert_eq!(w.color_cooldown, w.gameplay.color_cooldown_frames);

        assert!(press(&mut w, Key::Left).is_empty(), "cooldown blocks");
        w.color_cooldown = 0;
        assert!(press(&mut w, Key::Down).is_empty(), "same color is a no-op");
        assert_eq!(w.color_cooldown, 0);
        assert_eq!(press(&mut w, Key::Left), vec![GameEvent::ColorShifted(Color::Blue)]);
    }

    #[test]
    fn color_change_rejected_while_dashing() {
        let mut w = test_world();
        w.state = GameState::Level1;
        press(&mut w, Key::Up);
        assert!(w.character.is_dashing());
        assert_eq!(w.character.color(), Color::Red);
        assert_eq!(w.color_cooldown, 0, "red arms no cooldown");
        let ev = press(&mut w, Key::Down);
        assert!(ev.is_empty());
        assert_eq!(w.character.color(), Color::Red);
    }

    #[test]
    fn yellow_starts_flash() {
        let mut w = test_world();
        w.state = GameState::Level1;
        press(&mut w, Key::Right);
        assert!(w.map.flash_active());
        assert_eq!(w.character.color(), Color::Yellow);
    }

    #[test]
    fn arrows_scheme_rebinds_colors() {
        let mut w = test_world();
        w.state = GameState::Level1;
        press(&mut w, Key::Two);
        assert_eq!(w.scheme, ControlScheme::Arrows);
        press(&mut w, Key::Up);
        assert!(w.character.is_moving());
        release(&mut w, Key::Up);
        assert_eq!(press(&mut w, Key::S), vec![GameEvent::ColorShifted(Color::Green)]);
    }

    #[test]
    fn repeated_speed_down_stops_at_zero() {
        let mut w = test_world();
        w.state = GameState::Level1;
        let slow = KeyInput::release(Key::Comma).with_shift();
        for _ in 0..25 {
            w.on_key(slow);
        }
        assert_eq!(w.speed, 0.0);
        w.on_key(KeyInput::release(Key::Period).with_shift());
        assert!((w.speed - 0.1).abs() < 1e-6);
        w.on_key(KeyInput::press(Key::Period).with_shift());
        assert!((w.speed - 0.1).abs() < 1e-6, "speed changes on release");
    }

    #[test]
    fn reset_key_acts_on_release() {
        let mut w = test_world();
        w.state = GameState::Level1;
        w.character.position = Vec2::new(500.0, 500.0);
        assert!(press(&mut w, Key::R).is_empty());
        assert_eq!(release(&mut w, Key::R), vec![GameEvent::LevelReset]);
        assert_eq!(w.character.position, w.level.player_spawn_world());
    }

    #[test]
    fn entering_level_with_dead_character_resets_first() {
        let mut w = test_world();
        w.story_shown = true;
        w.character.kill();
        w.speed = 0.3;
        let ev = press(&mut w, Key::Enter);
        assert_eq!(ev[0], GameEvent::LevelReset);
        assert!(w.character.is_alive());
        assert_eq!(w.speed, 1.0);
        assert_eq!(w.state, GameState::Level1);
    }

    #[test]
    fn level_projection_centers_on_character() {
        let mut w = test_world();
        let window = FixedWindow { fb: UVec2::new(2400, 1600), density: 2.0 };
        let full = w.projection(&window);
        assert!((full.transform_point2(Vec2::new(1200.0, 800.0)) - Vec2::new(1.0, -1.0)).length() < 1e-4);

        w.state = GameState::Level1;
        let p = w.projection(&window);
        let c = w.character.position;
        assert!(p.transform_point2(c).length() < 1e-4);
        let corner = p.transform_point2(c + Vec2::new(300.0, 200.0));
        assert!((corner - Vec2::new(1.0, -1.0)).length() < 1e-4);
    }

    #[test]
    fn flash_hides_entities() {
        let mut w = test_world();
        let tiles = w.level.width() * w.level.height();
        let mut gfx = RecordingGfx::default();
        w.draw(&Mat3::IDENTITY, &mut gfx);
        assert_eq!(gfx.quads, tiles + 2);

        w.map.set_flash(true);
        let mut gfx = RecordingGfx::default();
        w.draw(&Mat3::IDENTITY, &mut gfx);
        assert_eq!(gfx.quads, tiles);
    }

    #[test]
    fn anchors_sit_inside_the_screen() {
        let screen = Vec2::new(1200.0, 800.0);
        for i in 0..MAX_SPOTTERS {
            let a = spotter_anchor(screen, i);
            assert!(a.x > 0.0 && a.x < screen.x && a.y > 0.0 && a.y < screen.y);
        }
        assert_eq!(spotter_anchor(screen, 3), Vec2::new(1100.0, 700.0));
    }
}
