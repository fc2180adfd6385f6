pub mod controls;
pub mod event;
pub mod level;
pub mod map;
pub mod step;
pub mod world;
