/// Shared entity contracts: every game object is a `Body` (position and
/// box bounds) and anything visible is `Renderable`. Direction flags and the
/// Trophy live here too since they have no behavior of their own.

use glam::{Mat3, Vec2};

use crate::backend::{Quad, RenderBackend, Sprite, SpriteKind, SpriteLoader, BackendError, WHITE};
use super::geometry::{Aabb, Transform};

// ══════════════════════════════════════════════════════════════
// Traits
// ══════════════════════════════════════════════════════════════

pub trait Body {
    fn position(&self) -> Vec2;
    fn set_position(&mut self, pos: Vec2);
    fn half_extents(&self) -> Vec2;

    fn bounds(&self) -> Aabb {
        Aabb::from_center(self.position(), self.half_extents())
    }

    fn collides_with(&self, other: &dyn Body) -> bool {
        self.bounds().overlaps(&other.bounds())
    }

    /// Called after wall resolution with whether the body was pushed out.
    fn on_wall_contact(&mut self, _touching: bool) {}
}

pub trait Renderable {
    fn draw(&self, projection: &Mat3, gfx: &mut dyn RenderBackend);
}

// ══════════════════════════════════════════════════════════════
// Direction flags
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Held movement keys. Opposite flags cancel, two perpendicular flags
/// give a diagonal.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct DirectionFlags {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl DirectionFlags {
    pub fn set(&mut self, dir: Direction, held: bool) {
        match dir {
            Direction::Up => self.up = held,
            Direction::Down => self.down = held,
            Direction::Left => self.left = held,
            Direction::Right => self.right = held,
        }
    }

    pub fn any(&self) -> bool {
        self.up || self.down || self.left || self.right
    }

    pub fn clear(&mut self) {
        *self = DirectionFlags::default();
    }

    /// Unit movement vector (zero when nothing or only opposites are held).
    /// World y grows downward.
    pub fn vector(&self) -> Vec2 {
        let axis = |neg: bool, pos: bool| (pos as i32 - neg as i32) as f32;
        Vec2::new(axis(self.left, self.right), axis(self.up, self.down)).normalize_or_zero()
    }
}

// ══════════════════════════════════════════════════════════════
// Trophy
// ══════════════════════════════════════════════════════════════

pub const TROPHY_HALF_EXTENT: f32 = 20.0;

#[derive(Clone, Debug)]
pub struct Trophy {
    pub position: Vec2,
    sprite: Sprite,
}

impl Trophy {
    pub fn init(position: Vec2, loader: &mut dyn SpriteLoader) -> Result<Self, BackendError> {
        let sprite = loader.load_sprite(SpriteKind::Trophy)?;
        Ok(Trophy::new(position, sprite))
    }

    pub fn new(position: Vec2, sprite: Sprite) -> Self {
        Trophy { position, sprite }
    }

    pub fn sprite(&self) -> Sprite {
        self.sprite
    }
}

impl Body for Trophy {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn set_position(&mut self, pos: Vec2) {
        self.position = pos;
    }

    fn half_extents(&self) -> Vec2 {
        Vec2::splat(TROPHY_HALF_EXTENT)
    }
}

impl Renderable for Trophy {
    fn draw(&self, projection: &Mat3, gfx: &mut dyn RenderBackend) {
        let transform = Transform::new()
            .translate(self.position)
            .scale(self.half_extents() * 2.0)
            .matrix();
        gfx.draw_quad(projection, Quad { sprite: Some(&self.sprite), transform, tint: WHITE, flip_x: false });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::StubSprites;

    #[test]
    fn diagonal_is_normalized() {
        let mut f = DirectionFlags::default();
        f.set(Direction::Right, true);
        f.set(Direction::Down, true);
        let v = f.vector();
        assert!((v.length() - 1.0).abs() < 1e-6);
        assert!(v.x > 0.0 && v.y > 0.0);
    }

    #[test]
    fn opposite_flags_cancel_but_still_count_as_held() {
        let mut f = DirectionFlags::default();
        f.set(Direction::Left, true);
        f.set(Direction::Right, true);
        assert_eq!(f.vector(), Vec2::ZERO);
        assert!(f.any());
        f.clear();
        assert!(!f.any());
    }

    #[test]
    fn bodies_touching_edges_do_not_collide() {
        let mut sprites = StubSprites::default();
        let a = Trophy::init(Vec2::new(0.0, 0.0), &mut sprites).unwrap();
        let b = Trophy::init(Vec2::new(TROPHY_HALF_EXTENT * 2.0, 0.0), &mut sprites).unwrap();
        assert!(!a.collides_with(&b));
        let c = Trophy::init(Vec2::new(TROPHY_HALF_EXTENT, 5.0), &mut sprites).unwrap();
        assert!(a.collides_with(&c));
    }

    #[test]
    fn trophy_init_propagates_sprite_failure() {
        let mut sprites = StubSprites::failing(SpriteKind::Trophy);
        assert!(Trophy::init(Vec2::ZERO, &mut sprites).is_err());
    }
}
