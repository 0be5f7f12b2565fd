//! Graphics context capability and its backends.
//!
//! This module is responsible for:
//! - the `GraphicsContext` trait every engine operation is written against
//! - a `glow` backend for real OpenGL / WebGL contexts
//! - a recording headless backend for tests and dry runs
//!
//! Acquiring a surface and making a context current belong to the host.

mod context;
mod error;
mod gl;
pub mod headless;

pub use context::{DrawMode, GraphicsContext, ShaderStage, VertexAttribLayout};
pub use error::GlErrorCode;
pub use gl::GlowContext;
pub use headless::HeadlessContext;
