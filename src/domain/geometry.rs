/// 2D math on top of glam: model transforms, the orthographic camera
/// projection, and axis-aligned boxes used for every collision test.

use glam::{Mat3, Vec2, Vec3};

/// Model-matrix builder.
///
/// Calls compose in the order written, so
/// `Transform::new().translate(p).rotate(r).scale(s)` scales first,
/// then rotates, then moves the result to `p`.
#[derive(Clone, Copy, Debug)]
pub struct Transform {
    out: Mat3,
}

impl Transform {
    pub fn new() -> Self {
        Transform { out: Mat3::IDENTITY }
    }

    pub fn translate(mut self, offset: Vec2) -> Self {
        self.out *= Mat3::from_translation(offset);
        self
    }

    pub fn rotate(mut self, radians: f32) -> Self {
        self.out *= Mat3::from_angle(radians);
        self
    }

    pub fn scale(mut self, factor: Vec2) -> Self {
        self.out *= Mat3::from_scale(factor);
        self
    }

    pub fn matrix(self) -> Mat3 {
        self.out
    }
}

impl Default for Transform {
    fn default() -> Self {
        Transform::new()
    }
}

/// Orthographic projection mapping the world rectangle
/// `[left, right] × [top, bottom]` onto NDC `[-1, 1]²`.
/// World y grows downward, so `top` maps to NDC +1.
pub fn orthographic(left: f32, top: f32, right: f32, bottom: f32) -> Mat3 {
    let sx = 2.0 / (right - left);
    let sy = 2.0 / (top - bottom);
    let tx = -(right + left) / (right - left);
    let ty = -(top + bottom) / (top - bottom);
    Mat3::from_cols(
        Vec3::new(sx, 0.0, 0.0),
        Vec3::new(0.0, sy, 0.0),
        Vec3::new(tx, ty, 1.0),
    )
}

/// Axis-aligned bounding box.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        Aabb { min: center - half_extents, max: center + half_extents }
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }

    /// Strict overlap: boxes that only share an edge do not overlap.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }

    /// Overlap depth on each axis. Both components are positive
    /// exactly when the boxes overlap.
    pub fn penetration(&self, other: &Aabb) -> Vec2 {
        Vec2::new(
            self.max.x.min(other.max.x) - self.min.x.max(other.min.x),
            self.max.y.min(other.max.y) - self.min.y.max(other.min.y),
        )
    }
}
