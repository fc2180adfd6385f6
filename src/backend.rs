/// Contracts the game core consumes from its collaborators.
///
/// The core never talks to a terminal, audio device or gamepad directly.
/// It draws through `RenderBackend`, asks `WindowBackend` for the framebuffer
/// geometry, and reports sounds as `GameEvent`s that the frame loop forwards
/// to an `AudioBackend`. Every entity that needs graphics resources acquires
/// a `Sprite` handle through `SpriteLoader` when it is created.

use glam::{Mat3, UVec2, Vec2};
use thiserror::Error;

use crate::domain::color::Color;

// ── Sprites ──

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum SpriteKind {
    Character,
    Spotter,
    Wanderer,
    Trophy,
    Tile,
    Pointer,
}

/// Handle to a loaded graphics resource. Cheap to clone.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Sprite {
    pub id: u32,
    pub kind: SpriteKind,
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to acquire {kind:?} sprite: {reason}")]
    Sprite { kind: SpriteKind, reason: String },
}

pub trait SpriteLoader {
    fn load_sprite(&mut self, kind: SpriteKind) -> Result<Sprite, BackendError>;
}

// ── Drawing ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// Blend toward `other` by `t` in [0, 1].
    pub fn mix(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let lerp = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgb::new(lerp(self.r, other.r), lerp(self.g, other.g), lerp(self.b, other.b))
    }
}

pub const WHITE: Rgb = Rgb::new(235, 235, 235);
pub const BLACK: Rgb = Rgb::new(0, 0, 0);
pub const WALL: Rgb = Rgb::new(70, 70, 78);

/// Display color for a game color.
pub fn palette(color: Color) -> Rgb {
    match color {
        Color::None => Rgb::new(150, 150, 140),
        Color::Red => Rgb::new(210, 60, 60),
        Color::Green => Rgb::new(70, 180, 80),
        Color::Blue => Rgb::new(70, 110, 215),
        Color::Yellow => Rgb::new(225, 200, 60),
    }
}

/// A textured quad: the unit square `[-0.5, 0.5]²` mapped through
/// `transform` into world space, then through `projection` into NDC.
#[derive(Clone, Copy, Debug)]
pub struct Quad<'a> {
    pub sprite: Option<&'a Sprite>,
    pub transform: Mat3,
    pub tint: Rgb,
    pub flip_x: bool,
}

pub trait RenderBackend: SpriteLoader {
    fn draw_quad(&mut self, projection: &Mat3, quad: Quad<'_>);

    /// Draw a line of text whose left edge starts at `at` (world space).
    fn draw_text(&mut self, projection: &Mat3, at: Vec2, text: &str, tint: Rgb);
}

// ── Window ──

pub trait WindowBackend {
    fn framebuffer_size(&self) -> UVec2;
    fn pixel_density(&self) -> f32;
}

// ── Audio ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Sfx {
    Death,
    Win,
    GreenShift,
}

pub trait AudioBackend {
    fn play(&self, sfx: Sfx);
    fn loop_music(&self);
}

/// Audio backend that discards everything (used when audio is disabled).
pub struct Silent;

impl AudioBackend for Silent {
    fn play(&self, _sfx: Sfx) {}
    fn loop_music(&self) {}
}
