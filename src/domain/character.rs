/// The player-controlled chameleon.

use glam::{Mat3, Vec2};

use crate::backend::{palette, BackendError, Quad, RenderBackend, Sprite, SpriteKind, SpriteLoader};
use super::color::Color;
use super::entity::{Body, Direction, DirectionFlags, Renderable};
use super::geometry::Transform;

pub const CHARACTER_HALF_EXTENT: f32 = 18.0;

/// Movement constants, in world units per second and milliseconds.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct CharacterTuning {
    pub speed: f32,
    pub dash_speed: f32,
    pub dash_ms: f32,
}

impl Default for CharacterTuning {
    fn default() -> Self {
        CharacterTuning { speed: 220.0, dash_speed: 900.0, dash_ms: 180.0 }
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
struct Dash {
    heading: Vec2,
    remaining_ms: f32,
}

#[derive(Clone, Debug)]
pub struct Character {
    pub position: Vec2,
    directions: DirectionFlags,
    /// Last non-zero movement direction; dashes go this way.
    heading: Vec2,
    color: Color,
    alive: bool,
    dash: Option<Dash>,
    wall_contact: bool,
    tuning: CharacterTuning,
    sprite: Sprite,
}

impl Character {
    pub fn init(
        spawn: Vec2,
        tuning: CharacterTuning,
        loader: &mut dyn SpriteLoader,
    ) -> Result<Self, BackendError> {
        let sprite = loader.load_sprite(SpriteKind::Character)?;
        Ok(Character::new(spawn, tuning, sprite))
    }

    pub fn new(spawn: Vec2, tuning: CharacterTuning, sprite: Sprite) -> Self {
        Character {
            position: spawn,
            directions: DirectionFlags::default(),
            heading: Vec2::X,
            color: Color::None,
            alive: true,
            dash: None,
            wall_contact: false,
            tuning,
            sprite,
        }
    }

    pub fn sprite(&self) -> Sprite {
        self.sprite
    }

    // ── Movement flags ──

    pub fn set_direction(&mut self, dir: Direction, held: bool) {
        self.directions.set(dir, held);
    }

    pub fn clear_directions(&mut self) {
        self.directions.clear();
    }

    /// True while any movement key is held, even if opposites cancel out.
    pub fn is_moving(&self) -> bool {
        self.directions.any()
    }

    /// Movement direction this frame. Blue skin mirrors the controls.
    pub fn movement(&self) -> Vec2 {
        let v = self.directions.vector();
        if self.color == Color::Blue { -v } else { v }
    }

    // ── Color ──

    pub fn color(&self) -> Color {
        self.color
    }

    /// Returns false (and leaves the color alone) while dashing.
    pub fn set_color(&mut self, color: Color) -> bool {
        if self.is_dashing() {
            return false;
        }
        self.color = color;
        true
    }

    // ── Dash ──

    pub fn start_dash(&mut self) -> bool {
        if self.is_dashing() {
            return false;
        }
        self.dash = Some(Dash { heading: self.heading, remaining_ms: self.tuning.dash_ms });
        true
    }

    pub fn is_dashing(&self) -> bool {
        self.dash.is_some()
    }

    pub fn stop_dash(&mut self) {
        self.dash = None;
    }

    // ── Life ──

    pub fn kill(&mut self) {
        self.alive = false;
        self.dash = None;
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Whether the last wall resolution had to push the character out.
    pub fn wall_contact(&self) -> bool {
        self.wall_contact
    }

    pub fn update(&mut self, elapsed_ms: f32) {
        if !self.alive {
            return;
        }
        let secs = elapsed_ms / 1000.0;
        if let Some(dash) = self.dash.as_mut() {
            self.position += dash.heading * self.tuning.dash_speed * secs;
            dash.remaining_ms -= elapsed_ms;
            if dash.remaining_ms <= 0.0 {
                self.dash = None;
            }
            return;
        }
        let step = self.movement();
        if step != Vec2::ZERO {
            self.heading = step;
            self.position += step * self.tuning.speed * secs;
        }
    }
}

impl Body for Character {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn set_position(&mut self, pos: Vec2) {
        self.position = pos;
    }

    fn half_extents(&self) -> Vec2 {
        Vec2::splat(CHARACTER_HALF_EXTENT)
    }

    fn on_wall_contact(&mut self, touching: bool) {
        self.wall_contact = touching;
    }
}

impl Renderable for Character {
    fn draw(&self, projection: &Mat3, gfx: &mut dyn RenderBackend) {
        let transform = Transform::new()
            .translate(self.position)
            .rotate(self.heading.y.atan2(self.heading.x))
            .scale(self.half_extents() * 2.0)
            .matrix();
        gfx.draw_quad(projection, Quad {
            sprite: Some(&self.sprite),
            transform,
            tint: palette(self.color),
            flip_x: false,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::StubSprites;

    fn character() -> Character {
        Character::init(Vec2::new(100.0, 100.0), CharacterTuning::default(), &mut StubSprites::default())
            .unwrap()
    }

    #[test]
    fn moves_along_held_direction() {
        let mut c = character();
        c.set_direction(Direction::Right, true);
        c.update(1000.0);
        assert!((c.position.x - 320.0).abs() < 1e-3);
        assert_eq!(c.position.y, 100.0);
    }

    #[test]
    fn blue_mirrors_movement() {
        let mut c = character();
        assert!(c.set_color(Color::Blue));
        c.set_direction(Direction::Right, true);
        c.update(500.0);
        assert!(c.position.x < 100.0);
        assert!(c.is_moving());
    }

    #[test]
    fn color_change_rejected_while_dashing() {
        let mut c = character();
        assert!(c.start_dash());
        assert!(!c.set_color(Color::Green));
        assert_eq!(c.color(), Color::None);
        assert!(!c.start_dash());
    }

    #[test]
    fn dash_follows_last_heading_and_expires() {
        let mut c = character();
        c.set_direction(Direction::Down, true);
        c.update(10.0);
        c.set_direction(Direction::Down, false);
        let start = c.position;
        c.start_dash();
        c.update(100.0);
        assert!(c.position.y > start.y + 80.0);
        assert_eq!(c.position.x, start.x);
        c.update(100.0);
        assert!(!c.is_dashing());
        let after = c.position;
        c.update(100.0);
        assert_eq!(c.position, after);
    }

    #[test]
    fn dead_character_does_not_move() {
        let mut c = character();
        c.set_direction(Direction::Left, true);
        c.kill();
        c.update(1000.0);
        assert_eq!(c.position, Vec2::new(100.0, 100.0));
        assert!(!c.is_alive());
    }
}
