//! Color model shared by shader templates and the scene renderer.

pub mod color;

pub use color::Rgba;
