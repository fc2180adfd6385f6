pub mod character;
pub mod color;
pub mod enemy;
pub mod entity;
pub mod geometry;
pub mod physics;
pub mod tile;
