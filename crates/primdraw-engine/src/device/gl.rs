//! OpenGL (ES) / WebGL backend over `glow`.
//!
//! All `unsafe` GL calls live in this file.

use glow::HasContext;

use crate::paint::Rgba;

use super::{DrawMode, GlErrorCode, GraphicsContext, ShaderStage, VertexAttribLayout};

/// `GraphicsContext` backed by a current `glow::Context`.
///
/// # Safety contract
///
/// The wrapped context must be current on the calling thread for every method
/// call. Acquiring and making the context current is the host's job.
pub struct GlowContext {
    gl: glow::Context,
    lost: bool,
    /// Error raised on the Rust side before reaching GL; reported first.
    rejected: Option<GlErrorCode>,
}

impl GlowContext {
    pub fn new(gl: glow::Context) -> Self {
        Self {
            gl,
            lost: false,
            rejected: None,
        }
    }

    /// Flags the context as lost, e.g. from a platform context-loss event.
    pub fn mark_lost(&mut self) {
        if !self.lost {
            log::error!("GL context marked as lost");
        }
        self.lost = true;
    }

    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }

    pub fn into_inner(self) -> glow::Context {
        self.gl
    }
}

fn stage_enum(stage: ShaderStage) -> u32 {
    match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
    }
}

fn mode_enum(mode: DrawMode) -> u32 {
    match mode {
        DrawMode::Triangles => glow::TRIANGLES,
        DrawMode::Lines => glow::LINES,
        DrawMode::Points => glow::POINTS,
    }
}

impl GraphicsContext for GlowContext {
    type Shader = glow::Shader;
    type Program = glow::Program;
    type Buffer = glow::Buffer;
    type UniformLocation = glow::UniformLocation;

    fn create_shader(&mut self, stage: ShaderStage) -> Result<Self::Shader, String> {
        unsafe { self.gl.create_shader(stage_enum(stage)) }
    }

    fn shader_source(&mut self, shader: Self::Shader, source: &str) {
        unsafe { self.gl.shader_source(shader, source) }
    }

    fn compile_shader(&mut self, shader: Self::Shader) {
        unsafe { self.gl.compile_shader(shader) }
    }

    fn shader_compile_status(&self, shader: Self::Shader) -> bool {
        unsafe { self.gl.get_shader_compile_status(shader) }
    }

    fn shader_info_log(&self, shader: Self::Shader) -> String {
        unsafe { self.gl.get_shader_info_log(shader) }
    }

    fn delete_shader(&mut self, shader: Self::Shader) {
        unsafe { self.gl.delete_shader(shader) }
    }

    fn create_program(&mut self) -> Result<Self::Program, String> {
        unsafe { self.gl.create_program() }
    }

    fn attach_shader(&mut self, program: Self::Program, shader: Self::Shader) {
        unsafe { self.gl.attach_shader(program, shader) }
    }

    fn detach_shader(&mut self, program: Self::Program, shader: Self::Shader) {
        unsafe { self.gl.detach_shader(program, shader) }
    }

    fn link_program(&mut self, program: Self::Program) {
        unsafe { self.gl.link_program(program) }
    }

    fn program_link_status(&self, program: Self::Program) -> bool {
        unsafe { self.gl.get_program_link_status(program) }
    }

    fn program_info_log(&self, program: Self::Program) -> String {
        unsafe { self.gl.get_program_info_log(program) }
    }

    fn delete_program(&mut self, program: Self::Program) {
        unsafe { self.gl.delete_program(program) }
    }

    fn use_program(&mut self, program: Option<Self::Program>) {
        unsafe { self.gl.use_program(program) }
    }

    fn attrib_location(&self, program: Self::Program, name: &str) -> Option<u32> {
        unsafe { self.gl.get_attrib_location(program, name) }
    }

    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        unsafe { self.gl.get_uniform_location(program, name) }
    }

    fn create_buffer(&mut self) -> Result<Self::Buffer, String> {
        unsafe { self.gl.create_buffer() }
    }

    fn bind_array_buffer(&mut self, buffer: Option<Self::Buffer>) {
        unsafe { self.gl.bind_buffer(glow::ARRAY_BUFFER, buffer) }
    }

    fn array_buffer_data_static(&mut self, data: &[u8]) {
        unsafe {
            self.gl
                .buffer_data_u8_slice(glow::ARRAY_BUFFER, data, glow::STATIC_DRAW)
        }
    }

    fn delete_buffer(&mut self, buffer: Self::Buffer) {
        unsafe { self.gl.delete_buffer(buffer) }
    }

    fn vertex_attrib_pointer_f32(&mut self, index: u32, layout: VertexAttribLayout) {
        unsafe {
            self.gl.vertex_attrib_pointer_f32(
                index,
                layout.components,
                glow::FLOAT,
                layout.normalized,
                layout.stride,
                layout.offset,
            )
        }
    }

    fn enable_vertex_attrib_array(&mut self, index: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(index) }
    }

    fn uniform_4f(&mut self, location: Option<&Self::UniformLocation>, value: [f32; 4]) {
        let [x, y, z, w] = value;
        unsafe { self.gl.uniform_4_f32(location, x, y, z, w) }
    }

    fn uniform_1f(&mut self, location: Option<&Self::UniformLocation>, value: f32) {
        unsafe { self.gl.uniform_1_f32(location, value) }
    }

    fn clear_color_buffer(&mut self, color: Rgba) {
        unsafe {
            self.gl.clear_color(color.r, color.g, color.b, color.a);
            self.gl.clear(glow::COLOR_BUFFER_BIT);
        }
    }

    fn draw_arrays(&mut self, mode: DrawMode, first: u32, count: u32) {
        // GL takes signed ints; a range it cannot address is not drawn at all.
        let (Ok(first), Ok(count)) = (i32::try_from(first), i32::try_from(count)) else {
            log::warn!("draw range {first}+{count} exceeds the GL limit; draw skipped");
            self.rejected = Some(GlErrorCode::INVALID_VALUE);
            return;
        };
        unsafe { self.gl.draw_arrays(mode_enum(mode), first, count) }
    }

    fn take_error(&mut self) -> GlErrorCode {
        if let Some(code) = self.rejected.take() {
            return code;
        }
        let code = GlErrorCode(unsafe { self.gl.get_error() });
        if code == GlErrorCode::CONTEXT_LOST || code == GlErrorCode::CONTEXT_LOST_WEBGL {
            self.mark_lost();
        }
        code
    }

    fn is_context_lost(&self) -> bool {
        self.lost
    }
}
