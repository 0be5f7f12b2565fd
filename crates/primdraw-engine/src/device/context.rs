use std::fmt;

use crate::paint::Rgba;

use super::GlErrorCode;

/// Pipeline stage a shader source is compiled for.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        })
    }
}

/// How vertex data is assembled into primitives by a draw call.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DrawMode {
    Triangles,
    Lines,
    Points,
}

/// Layout of one float vertex attribute inside the bound array buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VertexAttribLayout {
    /// Components per vertex (1..=4).
    pub components: i32,
    pub normalized: bool,
    /// Byte stride between vertices; `0` means tightly packed.
    pub stride: i32,
    /// Byte offset of the first component.
    pub offset: i32,
}

impl VertexAttribLayout {
    /// Tightly packed `vec2` of 32-bit floats starting at offset 0.
    pub const POSITION_2D: Self = Self {
        components: 2,
        normalized: false,
        stride: 0,
        offset: 0,
    };
}

/// Graphics context capability consumed by the engine.
///
/// Mirrors the bind-then-operate GL model, but the context is always passed
/// explicitly so that ownership and call order are visible at every call
/// site. State-changing calls take `&mut self`; the caller guarantees a single
/// logical owner and no locking happens here.
///
/// Object creation returns `Err` with a driver message when the context cannot
/// allocate the object (for example after context loss).
pub trait GraphicsContext {
    type Shader: Copy + Eq + fmt::Debug;
    type Program: Copy + Eq + fmt::Debug;
    type Buffer: Copy + Eq + fmt::Debug;
    type UniformLocation: Clone + fmt::Debug;

    // ── stages ────────────────────────────────────────────────────────────

    fn create_shader(&mut self, stage: ShaderStage) -> Result<Self::Shader, String>;
    fn shader_source(&mut self, shader: Self::Shader, source: &str);
    fn compile_shader(&mut self, shader: Self::Shader);
    fn shader_compile_status(&self, shader: Self::Shader) -> bool;
    fn shader_info_log(&self, shader: Self::Shader) -> String;
    fn delete_shader(&mut self, shader: Self::Shader);

    // ── programs ──────────────────────────────────────────────────────────

    fn create_program(&mut self) -> Result<Self::Program, String>;
    fn attach_shader(&mut self, program: Self::Program, shader: Self::Shader);
    fn detach_shader(&mut self, program: Self::Program, shader: Self::Shader);
    fn link_program(&mut self, program: Self::Program);
    fn program_link_status(&self, program: Self::Program) -> bool;
    fn program_info_log(&self, program: Self::Program) -> String;
    fn delete_program(&mut self, program: Self::Program);
    fn use_program(&mut self, program: Option<Self::Program>);

    // ── introspection ─────────────────────────────────────────────────────

    /// Returns `None` when the program has no active attribute `name`.
    fn attrib_location(&self, program: Self::Program, name: &str) -> Option<u32>;

    /// Returns `None` when the program has no active uniform `name`.
    fn uniform_location(&self, program: Self::Program, name: &str)
    -> Option<Self::UniformLocation>;

    // ── buffers ───────────────────────────────────────────────────────────

    fn create_buffer(&mut self) -> Result<Self::Buffer, String>;
    fn bind_array_buffer(&mut self, buffer: Option<Self::Buffer>);

    /// Replaces the whole contents of the bound array buffer with a
    /// write-once, read-many usage hint.
    fn array_buffer_data_static(&mut self, data: &[u8]);
    fn delete_buffer(&mut self, buffer: Self::Buffer);

    // ── vertex input ──────────────────────────────────────────────────────

    fn vertex_attrib_pointer_f32(&mut self, index: u32, layout: VertexAttribLayout);
    fn enable_vertex_attrib_array(&mut self, index: u32);

    // ── uniforms ──────────────────────────────────────────────────────────

    /// Writes a `vec4` uniform of the current program. `None` is a no-op.
    fn uniform_4f(&mut self, location: Option<&Self::UniformLocation>, value: [f32; 4]);

    /// Writes a `float` uniform of the current program. `None` is a no-op.
    fn uniform_1f(&mut self, location: Option<&Self::UniformLocation>, value: f32);

    // ── frame ─────────────────────────────────────────────────────────────

    fn clear_color_buffer(&mut self, color: Rgba);
    /// Draws `count` vertices. A range past `i32::MAX` is not drawn and
    /// raises `INVALID_VALUE`.
    fn draw_arrays(&mut self, mode: DrawMode, first: u32, count: u32);

    /// Pops the oldest pending error, `GlErrorCode::NO_ERROR` when none.
    fn take_error(&mut self) -> GlErrorCode;

    fn is_context_lost(&self) -> bool;
}
