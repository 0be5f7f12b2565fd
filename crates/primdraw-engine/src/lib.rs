//! Primdraw engine crate.
//!
//! Renders heterogeneous 2D triangles, lines and points through one shader
//! program, configured per object by color and point size uniforms.
//!
//! Setup happens once ([`shader::build_program`]); every frame then feeds a
//! [`render::Scene`] to [`render::render_frame`]. Both are written against the
//! [`device::GraphicsContext`] capability, so the same code drives a real GL
//! context ([`device::GlowContext`]) or the recording
//! [`device::HeadlessContext`].

pub mod device;
pub mod error;
pub mod logging;
pub mod paint;
pub mod render;
pub mod shader;

pub use error::InvalidValue;
