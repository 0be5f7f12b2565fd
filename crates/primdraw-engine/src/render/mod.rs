//! Per-object render dispatch.
//!
//! A scene is an ordered list of drawables sharing one program. Each drawable
//! gets its own vertex buffer, color and point size uniforms and exactly one
//! draw call, issued in scene order.
//!
//! Failure policy:
//! - unknown primitive tags, failed uploads and post-draw GL errors are
//!   reported for that drawable and the pass continues
//! - context loss ends the pass; draw calls already issued stay issued

mod buffer;
mod drawable;
mod error;
mod renderer;
mod scene;

pub use buffer::{upload_positions, GpuBuffer, SceneBuffers, MAX_DRAW_VERTICES};
pub use drawable::{classify, Drawable, PrimitiveKind, DEFAULT_POINT_SIZE};
pub use error::{
    ContextLostError, FrameReport, RenderError, RenderWarning, UnknownPrimitiveError, UploadError,
};
pub use renderer::{render_frame, RenderConfig, SceneRenderer};
pub use scene::{Scene, SceneEntry};
