/// Menu, controls, story and completion screens.
///
/// Everything is laid out in logical screen coordinates (the menu
/// projection covers the whole screen) and drawn through the render
/// contract, so the screens work with any backend.

use glam::{Mat3, Vec2};

use crate::backend::{palette, BackendError, Quad, RenderBackend, Rgb, Sprite, SpriteKind, SpriteLoader, WHITE};
use crate::domain::color::Color;
use crate::domain::geometry::Transform;
use crate::sim::controls::ControlScheme;
use crate::sim::world::{GameState, World};

const LINE: f32 = 40.0;
const MENU_LEFT: f32 = 0.4;
const MENU_TOP: f32 = 0.45;
const POINTER_SIZE: f32 = 24.0;

const TITLE: Rgb = Rgb::new(225, 200, 60);
const DIM: Rgb = Rgb::new(130, 130, 130);

const MENU: [&str; 3] = ["Play", "Controls", "Quit"];

const STORY: [&str; 6] = [
    "The keepers of the habitat have released their sentries.",
    "Spotters watch from the corners. Wanderers roam the halls.",
    "Neither can see what does not move and matches the ground.",
    "Take on the color of the floor beneath you, stay still when",
    "something looks your way, and reach the golden trophy.",
    "Red is more than a disguise: it sends you dashing forward.",
];

pub struct Screens {
    pointer: Sprite,
    selection: usize,
}

impl Screens {
    pub fn init(loader: &mut dyn SpriteLoader) -> Result<Self, BackendError> {
        Ok(Screens { pointer: loader.load_sprite(SpriteKind::Pointer)?, selection: 0 })
    }

    /// Follow the start-screen selection.
    pub fn update(&mut self, selection: usize) {
        self.selection = selection.min(MENU.len() - 1);
    }

    fn menu_entry(screen: Vec2, index: usize) -> Vec2 {
        Vec2::new(screen.x * MENU_LEFT, screen.y * MENU_TOP + index as f32 * LINE)
    }

    pub fn draw(&self, world: &World, projection: &Mat3, gfx: &mut dyn RenderBackend) {
        let screen = world.screen;
        match world.state {
            GameState::StartScreen => self.draw_start(screen, projection, gfx),
            GameState::ControlScreen => draw_controls(world.scheme, screen, projection, gfx),
            GameState::StoryScreen => draw_story(screen, projection, gfx),
            GameState::WinScreen => draw_win(&world.level.name, screen, projection, gfx),
            GameState::Level1 => {}
        }
    }

    fn draw_start(&self, screen: Vec2, projection: &Mat3, gfx: &mut dyn RenderBackend) {
        gfx.draw_text(projection, Vec2::new(screen.x * MENU_LEFT, screen.y * 0.2), "THE CHAMELEON", TITLE);
        gfx.draw_text(
            projection,
            Vec2::new(screen.x * MENU_LEFT, screen.y * 0.2 + LINE),
            "blend in or be seen",
            DIM,
        );

        for (i, label) in MENU.iter().enumerate() {
            let tint = if i == self.selection { WHITE } else { DIM };
            gfx.draw_text(projection, Self::menu_entry(screen, i), label, tint);
        }

        // pointer sits left of the highlighted entry, centred on its line
        let at = Self::menu_entry(screen, self.selection) + Vec2::new(-POINTER_SIZE * 1.5, LINE * 0.25);
        let transform = Transform::new().translate(at).scale(Vec2::splat(POINTER_SIZE)).matrix();
        gfx.draw_quad(projection, Quad { sprite: Some(&self.pointer), transform, tint: TITLE, flip_x: false });

        gfx.draw_text(
            projection,
            Vec2::new(screen.x * MENU_LEFT, screen.y * 0.85),
            "Up/Down to choose, Enter to confirm",
            DIM,
        );
    }
}

fn scheme_lines(scheme: ControlScheme) -> [(String, Rgb); 6] {
    let (moves, colors) = match scheme {
        ControlScheme::Wasd => ("W A S D", ["Up", "Down", "Left", "Right"]),
        ControlScheme::Arrows => ("Arrow keys", ["W", "S", "A", "D"]),
    };
    [
        (format!("Move          {moves}"), WHITE),
        (format!("Red (dash)    {}", colors[0]), palette(Color::Red)),
        (format!("Green         {}", colors[1]), palette(Color::Green)),
        (format!("Blue          {}", colors[2]), palette(Color::Blue)),
        (format!("Yellow        {}", colors[3]), palette(Color::Yellow)),
        ("Scheme        1 = WASD   2 = Arrows".to_string(), DIM),
    ]
}

fn draw_controls(scheme: ControlScheme, screen: Vec2, projection: &Mat3, gfx: &mut dyn RenderBackend) {
    let left = screen.x * 0.3;
    let mut y = screen.y * 0.2;
    gfx.draw_text(projection, Vec2::new(left, y), "CONTROLS", TITLE);
    y += LINE * 1.5;

    for (line, tint) in scheme_lines(scheme) {
        gfx.draw_text(projection, Vec2::new(left, y), &line, tint);
        y += LINE;
    }

    y += LINE * 0.5;
    for line in ["R             Restart level", "< >           Slower / faster enemies", "Esc           Start screen"] {
        gfx.draw_text(projection, Vec2::new(left, y), line, DIM);
        y += LINE;
    }

    gfx.draw_text(projection, Vec2::new(left, screen.y * 0.9), "Enter to go back", DIM);
}

fn draw_story(screen: Vec2, projection: &Mat3, gfx: &mut dyn RenderBackend) {
    let left = screen.x * 0.15;
    let mut y = screen.y * 0.25;
    for line in STORY {
        gfx.draw_text(projection, Vec2::new(left, y), line, WHITE);
        y += LINE;
    }
    gfx.draw_text(projection, Vec2::new(left, screen.y * 0.85), "Enter to begin", DIM);
}

fn draw_win(level_name: &str, screen: Vec2, projection: &Mat3, gfx: &mut dyn RenderBackend) {
    let left = screen.x * 0.35;
    gfx.draw_text(projection, Vec2::new(left, screen.y * 0.4), "HABITAT CLEARED", TITLE);
    gfx.draw_text(projection, Vec2::new(left, screen.y * 0.4 + LINE), level_name, WHITE);
    gfx.draw_text(projection, Vec2::new(left, screen.y * 0.4 + LINE * 3.0), "Enter to return", DIM);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{test_world, RecordingGfx, StubSprites};

    fn screens() -> Screens {
        Screens::init(&mut StubSprites::default()).unwrap()
    }

    #[test]
    fn start_screen_lists_entries_with_pointer() {
        let world = test_world();
        let mut gfx = RecordingGfx::default();
        screens().draw(&world, &Mat3::IDENTITY, &mut gfx);
        for entry in MENU {
            assert!(gfx.texts.iter().any(|t| t == entry));
        }
        assert_eq!(gfx.quads, 1);
    }

    #[test]
    fn pointer_follows_selection_and_is_clamped() {
        let mut s = screens();
        s.update(1);
        assert_eq!(s.selection, 1);
        s.update(9);
        assert_eq!(s.selection, MENU.len() - 1);
    }

    #[test]
    fn controls_text_follows_scheme() {
        let mut world = test_world();
        world.state = GameState::ControlScreen;
        let mut gfx = RecordingGfx::default();
        screens().draw(&world, &Mat3::IDENTITY, &mut gfx);
        assert!(gfx.texts.iter().any(|t| t.contains("W A S D")));

        world.scheme = ControlScheme::Arrows;
        let mut gfx = RecordingGfx::default();
        screens().draw(&world, &Mat3::IDENTITY, &mut gfx);
        assert!(gfx.texts.iter().any(|t| t.contains("Arrow keys")));
        assert_eq!(gfx.quads, 0);
    }

    #[test]
    fn win_screen_names_the_level() {
        let mut world = test_world();
        world.state = GameState::WinScreen;
        let mut gfx = RecordingGfx::default();
        screens().draw(&world, &Mat3::IDENTITY, &mut gfx);
        assert!(gfx.texts.contains(&world.level.name));
    }

    #[test]
    fn level_draws_nothing() {
        let mut world = test_world();
        world.state = GameState::Level1;
        let mut gfx = RecordingGfx::default();
        screens().draw(&world, &Mat3::IDENTITY, &mut gfx);
        assert!(gfx.texts.is_empty());
        assert_eq!(gfx.quads, 0);
    }
}
