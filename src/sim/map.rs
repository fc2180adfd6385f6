/// The tile map: wall collision, camouflage lookups, and the two timed
/// overlays (yellow flash and the character-dead fade).

use std::time::Duration;

use glam::{Mat3, Vec2};

use crate::backend::{palette, BackendError, Quad, RenderBackend, Sprite, SpriteKind, SpriteLoader, BLACK, WALL, WHITE};
use crate::domain::color::Color;
use crate::domain::entity::{Body, Renderable};
use crate::domain::geometry::Transform;
use crate::domain::physics;
use crate::domain::tile::Tile;

pub const TILE_SIZE: f32 = 50.0;

/// Seconds for the dead fade to reach full darkness.
const DEAD_FADE_SECS: f32 = 2.0;

#[derive(Clone, Debug)]
pub struct Map {
    pub tiles: Vec<Vec<Tile>>,
    flash: bool,
    flash_elapsed: Duration,
    char_dead: bool,
    dead_elapsed: Duration,
    sprite: Sprite,
}

impl Map {
    pub fn init(tiles: Vec<Vec<Tile>>, loader: &mut dyn SpriteLoader) -> Result<Self, BackendError> {
        let sprite = loader.load_sprite(SpriteKind::Tile)?;
        Ok(Map {
            tiles,
            flash: false,
            flash_elapsed: Duration::ZERO,
            char_dead: false,
            dead_elapsed: Duration::ZERO,
            sprite,
        })
    }

    // ── Tile queries ──

    /// Camouflage color of the tile under the body's center.
    /// Walls and out-of-grid positions have no color.
    pub fn tile_color_at(&self, body: &dyn Body) -> Color {
        let (col, row) = physics::cell_of(body.position(), TILE_SIZE);
        physics::tile_at(&self.tiles, col, row).map_or(Color::None, Tile::camouflage)
    }

    /// Push the body out of any wall it overlaps and report the contact to
    /// it. Returns whether it had to be moved.
    pub fn resolve_wall_collision(&self, body: &mut dyn Body) -> bool {
        let fixed = physics::push_out(&self.tiles, TILE_SIZE, body.bounds());
        if let Some(pos) = fixed {
            body.set_position(pos);
        }
        body.on_wall_contact(fixed.is_some());
        fixed.is_some()
    }

    // ── Timers ──

    pub fn update(&mut self, elapsed_ms: f32) {
        let dt = Duration::from_secs_f32(elapsed_ms.max(0.0) / 1000.0);
        if self.flash {
            self.flash_elapsed += dt;
        }
        if self.char_dead {
            self.dead_elapsed += dt;
        }
    }

    pub fn set_flash(&mut self, on: bool) {
        self.flash = on;
    }

    pub fn flash_active(&self) -> bool {
        self.flash
    }

    pub fn flash_elapsed(&self) -> Duration {
        self.flash_elapsed
    }

    pub fn reset_flash_timer(&mut self) {
        self.flash_elapsed = Duration::ZERO;
    }

    /// Start the dead overlay; its timer restarts from zero.
    pub fn mark_character_dead(&mut self) {
        self.char_dead = true;
        self.dead_elapsed = Duration::ZERO;
    }

    pub fn character_dead(&self) -> bool {
        self.char_dead
    }

    pub fn character_dead_elapsed(&self) -> Duration {
        self.dead_elapsed
    }

    pub fn reset_character_dead_timer(&mut self) {
        self.char_dead = false;
        self.dead_elapsed = Duration::ZERO;
    }
}

impl Renderable for Map {
    fn draw(&self, projection: &Mat3, gfx: &mut dyn RenderBackend) {
        let darkness = if self.char_dead {
            (self.dead_elapsed.as_secs_f32() / DEAD_FADE_SECS).min(1.0) * 0.8
        } else {
            0.0
        };
        for (row, tiles) in self.tiles.iter().enumerate() {
            for (col, tile) in tiles.iter().enumerate() {
                let base = match tile {
                    Tile::Wall => WALL,
                    Tile::Floor(color) => palette(*color),
                };
                let mut tint = if self.flash { base.mix(WHITE, 0.7) } else { base };
                tint = tint.mix(BLACK, darkness);
                let transform = Transform::new()
                    .translate(physics::cell_center(col as i64, row as i64, TILE_SIZE))
                    .scale(Vec2::splat(TILE_SIZE))
                    .matrix();
                gfx.draw_quad(projection, Quad { sprite: Some(&self.sprite), transform, tint, flip_x: false });
            }
        }
    }
}
