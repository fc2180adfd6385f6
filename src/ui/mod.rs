pub mod gamepad;
pub mod input;
pub mod renderer;
pub mod screens;
pub mod sound;
