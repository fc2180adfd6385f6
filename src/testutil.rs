/// Headless collaborators for unit tests.

use glam::{Mat3, UVec2, Vec2};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::backend::{BackendError, Quad, RenderBackend, Rgb, Sprite, SpriteKind, SpriteLoader, WindowBackend};
use crate::config::GameConfig;
use crate::sim::level::builtin_level;
use crate::sim::world::{GameState, World};

/// Hands out sequential sprite ids; optionally refuses one kind.
#[derive(Default)]
pub struct StubSprites {
    next_id: u32,
    fail_on: Option<SpriteKind>,
}

impl StubSprites {
    pub fn failing(kind: SpriteKind) -> Self {
        StubSprites { next_id: 0, fail_on: Some(kind) }
    }
}

impl SpriteLoader for StubSprites {
    fn load_sprite(&mut self, kind: SpriteKind) -> Result<Sprite, BackendError> {
        if self.fail_on == Some(kind) {
            return Err(BackendError::Sprite { kind, reason: "stub refused".into() });
        }
        self.next_id += 1;
        Ok(Sprite { id: self.next_id, kind })
    }
}

/// Counts draw calls.
#[derive(Default)]
pub struct RecordingGfx {
    pub quads: usize,
    pub texts: Vec<String>,
    sprites: StubSprites,
}

impl SpriteLoader for RecordingGfx {
    fn load_sprite(&mut self, kind: SpriteKind) -> Result<Sprite, BackendError> {
        self.sprites.load_sprite(kind)
    }
}

impl RenderBackend for RecordingGfx {
    fn draw_quad(&mut self, _projection: &Mat3, _quad: Quad<'_>) {
        self.quads += 1;
    }

    fn draw_text(&mut self, _projection: &Mat3, _at: Vec2, text: &str, _tint: Rgb) {
        self.texts.push(text.to_string());
    }
}

pub struct FixedWindow {
    pub fb: UVec2,
    pub density: f32,
}

impl WindowBackend for FixedWindow {
    fn framebuffer_size(&self) -> UVec2 {
        self.fb
    }

    fn pixel_density(&self) -> f32 {
        self.density
    }
}

/// World on the built-in level with default config and a fixed seed.
pub fn test_world() -> World {
    let level = builtin_level().unwrap();
    World::init(&GameConfig::default(), level, &mut StubSprites::default(), StdRng::seed_from_u64(7)).unwrap()
}

pub fn level_world() -> World {
    let mut world = test_world();
    world.state = GameState::Level1;
    world
}
