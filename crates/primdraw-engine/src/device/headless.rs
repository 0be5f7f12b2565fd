//! In-memory graphics context.
//!
//! Records every call, tracks object lifetimes and emulates just enough of a
//! GLSL front end to make compile, link and introspection meaningful:
//! - compilation fails on unbalanced delimiters or a missing `main`
//! - `attribute`/`uniform` declarations become active only when the name is
//!   referenced again in the source, like an optimizing driver would do
//!
//! Faults (link failure, post-draw errors, context loss) can be injected to
//! drive the renderer's failure paths without a GPU.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::paint::Rgba;

use super::{DrawMode, GlErrorCode, GraphicsContext, ShaderStage, VertexAttribLayout};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct HeadlessShader(u32);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct HeadlessProgram(u32);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct HeadlessBuffer(u32);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct HeadlessUniform {
    program: u32,
    slot: u32,
}

/// Value last written to a uniform.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec4([f32; 4]),
}

/// One recorded call, in issue order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateShader(ShaderStage),
    CompileShader(HeadlessShader),
    DeleteShader(HeadlessShader),
    CreateProgram,
    AttachShader(HeadlessProgram, HeadlessShader),
    DetachShader(HeadlessProgram, HeadlessShader),
    LinkProgram(HeadlessProgram),
    DeleteProgram(HeadlessProgram),
    UseProgram(Option<HeadlessProgram>),
    CreateBuffer,
    BindArrayBuffer(Option<HeadlessBuffer>),
    BufferDataStatic { len: usize },
    DeleteBuffer(HeadlessBuffer),
    VertexAttribPointer { index: u32, layout: VertexAttribLayout },
    EnableVertexAttribArray(u32),
    Uniform4f(Option<HeadlessUniform>, [f32; 4]),
    Uniform1f(Option<HeadlessUniform>, f32),
    Clear(Rgba),
    DrawArrays { mode: DrawMode, first: u32, count: u32 },
}

/// Snapshot of pipeline state at the moment a draw call was accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub mode: DrawMode,
    pub first: u32,
    pub count: u32,
    pub program: HeadlessProgram,
    pub buffer: Option<HeadlessBuffer>,
    /// Uniform values of the current program, keyed by uniform name.
    pub uniforms: HashMap<String, UniformValue>,
}

impl DrawRecord {
    pub fn float(&self, name: &str) -> Option<f32> {
        match self.uniforms.get(name)? {
            UniformValue::Float(v) => Some(*v),
            UniformValue::Vec4(_) => None,
        }
    }

    pub fn vec4(&self, name: &str) -> Option<[f32; 4]> {
        match self.uniforms.get(name)? {
            UniformValue::Vec4(v) => Some(*v),
            UniformValue::Float(_) => None,
        }
    }
}

#[derive(Debug)]
struct ShaderObject {
    stage: ShaderStage,
    source: String,
    compiled: bool,
    info_log: String,
}

#[derive(Debug, Default)]
struct ProgramObject {
    attached: Vec<u32>,
    linked: bool,
    info_log: String,
    attributes: Vec<String>,
    uniforms: Vec<String>,
    values: HashMap<u32, UniformValue>,
}

#[derive(Debug, Default)]
struct Faults {
    fail_link: Option<String>,
    fail_buffer_creation: bool,
    error_after_draw: HashMap<usize, GlErrorCode>,
    lose_after_draws: Option<usize>,
}

/// Recording `GraphicsContext` with no GPU behind it.
#[derive(Debug, Default)]
pub struct HeadlessContext {
    next_id: u32,
    shaders: HashMap<u32, ShaderObject>,
    programs: HashMap<u32, ProgramObject>,
    buffers: HashMap<u32, Vec<u8>>,
    bound_buffer: Option<u32>,
    current_program: Option<u32>,
    enabled_attribs: HashSet<u32>,
    calls: Vec<Call>,
    draws: Vec<DrawRecord>,
    pending_errors: VecDeque<GlErrorCode>,
    faults: Faults,
    lost: bool,
}

impl HeadlessContext {
    pub fn new() -> Self {
        Self::default()
    }

    // ── fault injection ───────────────────────────────────────────────────

    /// Every subsequent link fails with `info_log`.
    pub fn fail_links(&mut self, info_log: impl Into<String>) -> &mut Self {
        self.faults.fail_link = Some(info_log.into());
        self
    }

    /// Every subsequent buffer creation fails.
    pub fn fail_buffer_creation(&mut self) -> &mut Self {
        self.faults.fail_buffer_creation = true;
        self
    }

    /// Queues `code` right after the draw call with zero-based `draw_index`.
    pub fn error_after_draw(&mut self, draw_index: usize, code: GlErrorCode) -> &mut Self {
        self.faults.error_after_draw.insert(draw_index, code);
        self
    }

    /// Loses the context once `draws` draw calls have been accepted.
    /// `0` loses it immediately.
    pub fn lose_context_after_draws(&mut self, draws: usize) -> &mut Self {
        self.faults.lose_after_draws = Some(draws);
        if draws == 0 {
            self.lost = true;
        }
        self
    }

    pub fn lose_context(&mut self) {
        self.lost = true;
    }

    // ── inspection ────────────────────────────────────────────────────────

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn draws(&self) -> &[DrawRecord] {
        &self.draws
    }

    pub fn live_shaders(&self) -> usize {
        self.shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    pub fn buffer_contents(&self, buffer: HeadlessBuffer) -> Option<&[u8]> {
        self.buffers.get(&buffer.0).map(Vec::as_slice)
    }

    pub fn is_attrib_enabled(&self, index: u32) -> bool {
        self.enabled_attribs.contains(&index)
    }

    // ── internals ─────────────────────────────────────────────────────────

    fn alloc_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn raise(&mut self, code: GlErrorCode) {
        self.pending_errors.push_back(code);
    }

    fn link(&mut self, program: u32) {
        let Some(object) = self.programs.get(&program) else {
            self.raise(GlErrorCode::INVALID_VALUE);
            return;
        };

        let stages: Vec<&ShaderObject> = object
            .attached
            .iter()
            .filter_map(|id| self.shaders.get(id))
            .collect();

        let outcome = if let Some(log) = &self.faults.fail_link {
            Err(log.clone())
        } else if let Some(stage) = stages.iter().find(|s| !s.compiled) {
            Err(format!("ERROR: {} shader is not compiled", stage.stage))
        } else if !stages.iter().any(|s| s.stage == ShaderStage::Vertex) {
            Err("ERROR: missing vertex shader".to_string())
        } else if !stages.iter().any(|s| s.stage == ShaderStage::Fragment) {
            Err("ERROR: missing fragment shader".to_string())
        } else {
            let mut attributes = Vec::new();
            let mut uniforms = Vec::new();
            for stage in &stages {
                for name in active_declarations(&stage.source, "attribute") {
                    if !attributes.contains(&name) {
                        attributes.push(name);
                    }
                }
                for name in active_declarations(&stage.source, "uniform") {
                    if !uniforms.contains(&name) {
                        uniforms.push(name);
                    }
                }
            }
            Ok((attributes, uniforms))
        };

        let Some(object) = self.programs.get_mut(&program) else { return };
        match outcome {
            Ok((attributes, uniforms)) => {
                object.linked = true;
                object.info_log.clear();
                object.attributes = attributes;
                object.uniforms = uniforms;
                object.values.clear();
            }
            Err(log) => {
                object.linked = false;
                object.info_log = log;
                object.attributes.clear();
                object.uniforms.clear();
            }
        }
    }

    fn write_uniform(&mut self, location: Option<HeadlessUniform>, value: UniformValue) {
        let Some(location) = location else { return };
        if self.current_program != Some(location.program) {
            self.raise(GlErrorCode::INVALID_OPERATION);
            return;
        }
        if let Some(program) = self.programs.get_mut(&location.program) {
            program.values.insert(location.slot, value);
        }
    }
}

impl GraphicsContext for HeadlessContext {
    type Shader = HeadlessShader;
    type Program = HeadlessProgram;
    type Buffer = HeadlessBuffer;
    type UniformLocation = HeadlessUniform;

    fn create_shader(&mut self, stage: ShaderStage) -> Result<Self::Shader, String> {
        self.calls.push(Call::CreateShader(stage));
        if self.lost {
            return Err("context lost".to_string());
        }
        let id = self.alloc_id();
        self.shaders.insert(
            id,
            ShaderObject {
                stage,
                source: String::new(),
                compiled: false,
                info_log: String::new(),
            },
        );
        Ok(HeadlessShader(id))
    }

    fn shader_source(&mut self, shader: Self::Shader, source: &str) {
        match self.shaders.get_mut(&shader.0) {
            Some(object) => object.source = source.to_string(),
            None => self.raise(GlErrorCode::INVALID_VALUE),
        }
    }

    fn compile_shader(&mut self, shader: Self::Shader) {
        self.calls.push(Call::CompileShader(shader));
        let Some(object) = self.shaders.get_mut(&shader.0) else {
            self.raise(GlErrorCode::INVALID_VALUE);
            return;
        };
        match check_syntax(&object.source) {
            Ok(()) => {
                object.compiled = true;
                object.info_log.clear();
            }
            Err(log) => {
                object.compiled = false;
                object.info_log = log;
            }
        }
    }

    fn shader_compile_status(&self, shader: Self::Shader) -> bool {
        self.shaders.get(&shader.0).is_some_and(|s| s.compiled)
    }

    fn shader_info_log(&self, shader: Self::Shader) -> String {
        self.shaders
            .get(&shader.0)
            .map(|s| s.info_log.clone())
            .unwrap_or_default()
    }

    fn delete_shader(&mut self, shader: Self::Shader) {
        self.calls.push(Call::DeleteShader(shader));
        self.shaders.remove(&shader.0);
    }

    fn create_program(&mut self) -> Result<Self::Program, String> {
        self.calls.push(Call::CreateProgram);
        if self.lost {
            return Err("context lost".to_string());
        }
        let id = self.alloc_id();
        self.programs.insert(id, ProgramObject::default());
        Ok(HeadlessProgram(id))
    }

    fn attach_shader(&mut self, program: Self::Program, shader: Self::Shader) {
        self.calls.push(Call::AttachShader(program, shader));
        match self.programs.get_mut(&program.0) {
            Some(object) if !object.attached.contains(&shader.0) => object.attached.push(shader.0),
            Some(_) => self.raise(GlErrorCode::INVALID_OPERATION),
            None => self.raise(GlErrorCode::INVALID_VALUE),
        }
    }

    fn detach_shader(&mut self, program: Self::Program, shader: Self::Shader) {
        self.calls.push(Call::DetachShader(program, shader));
        if let Some(object) = self.programs.get_mut(&program.0) {
            object.attached.retain(|id| *id != shader.0);
        }
    }

    fn link_program(&mut self, program: Self::Program) {
        self.calls.push(Call::LinkProgram(program));
        self.link(program.0);
    }

    fn program_link_status(&self, program: Self::Program) -> bool {
        self.programs.get(&program.0).is_some_and(|p| p.linked)
    }

    fn program_info_log(&self, program: Self::Program) -> String {
        self.programs
            .get(&program.0)
            .map(|p| p.info_log.clone())
            .unwrap_or_default()
    }

    fn delete_program(&mut self, program: Self::Program) {
        self.calls.push(Call::DeleteProgram(program));
        self.programs.remove(&program.0);
        if self.current_program == Some(program.0) {
            self.current_program = None;
        }
    }

    fn use_program(&mut self, program: Option<Self::Program>) {
        self.calls.push(Call::UseProgram(program));
        match program {
            Some(p) if !self.programs.get(&p.0).is_some_and(|o| o.linked) => {
                self.raise(GlErrorCode::INVALID_OPERATION);
            }
            _ => self.current_program = program.map(|p| p.0),
        }
    }

    fn attrib_location(&self, program: Self::Program, name: &str) -> Option<u32> {
        let object = self.programs.get(&program.0)?;
        let slot = object.attributes.iter().position(|a| a == name)?;
        u32::try_from(slot).ok()
    }

    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        let object = self.programs.get(&program.0)?;
        let slot = object.uniforms.iter().position(|u| u == name)?;
        Some(HeadlessUniform {
            program: program.0,
            slot: u32::try_from(slot).ok()?,
        })
    }

    fn create_buffer(&mut self) -> Result<Self::Buffer, String> {
        self.calls.push(Call::CreateBuffer);
        if self.lost {
            return Err("context lost".to_string());
        }
        if self.faults.fail_buffer_creation {
            return Err("out of buffer objects".to_string());
        }
        let id = self.alloc_id();
        self.buffers.insert(id, Vec::new());
        Ok(HeadlessBuffer(id))
    }

    fn bind_array_buffer(&mut self, buffer: Option<Self::Buffer>) {
        self.calls.push(Call::BindArrayBuffer(buffer));
        match buffer {
            Some(b) if !self.buffers.contains_key(&b.0) => self.raise(GlErrorCode::INVALID_OPERATION),
            _ => self.bound_buffer = buffer.map(|b| b.0),
        }
    }

    fn array_buffer_data_static(&mut self, data: &[u8]) {
        self.calls.push(Call::BufferDataStatic { len: data.len() });
        let target = self.bound_buffer.and_then(|id| self.buffers.get_mut(&id));
        match target {
            Some(contents) => *contents = data.to_vec(),
            None => self.raise(GlErrorCode::INVALID_OPERATION),
        }
    }

    fn delete_buffer(&mut self, buffer: Self::Buffer) {
        self.calls.push(Call::DeleteBuffer(buffer));
        self.buffers.remove(&buffer.0);
        if self.bound_buffer == Some(buffer.0) {
            self.bound_buffer = None;
        }
    }

    fn vertex_attrib_pointer_f32(&mut self, index: u32, layout: VertexAttribLayout) {
        self.calls.push(Call::VertexAttribPointer { index, layout });
        if self.bound_buffer.is_none() || !(1..=4).contains(&layout.components) {
            self.raise(GlErrorCode::INVALID_OPERATION);
        }
    }

    fn enable_vertex_attrib_array(&mut self, index: u32) {
        self.calls.push(Call::EnableVertexAttribArray(index));
        self.enabled_attribs.insert(index);
    }

    fn uniform_4f(&mut self, location: Option<&Self::UniformLocation>, value: [f32; 4]) {
        let location = location.copied();
        self.calls.push(Call::Uniform4f(location, value));
        self.write_uniform(location, UniformValue::Vec4(value));
    }

    fn uniform_1f(&mut self, location: Option<&Self::UniformLocation>, value: f32) {
        let location = location.copied();
        self.calls.push(Call::Uniform1f(location, value));
        self.write_uniform(location, UniformValue::Float(value));
    }

    fn clear_color_buffer(&mut self, color: Rgba) {
        self.calls.push(Call::Clear(color));
    }

    fn draw_arrays(&mut self, mode: DrawMode, first: u32, count: u32) {
        self.calls.push(Call::DrawArrays { mode, first, count });
        if self.lost {
            self.raise(GlErrorCode::CONTEXT_LOST_WEBGL);
            return;
        }
        if i32::try_from(first).is_err() || i32::try_from(count).is_err() {
            self.raise(GlErrorCode::INVALID_VALUE);
            return;
        }
        let Some(program_id) = self.current_program else {
            self.raise(GlErrorCode::INVALID_OPERATION);
            return;
        };

        let uniforms = self
            .programs
            .get(&program_id)
            .map(|p| {
                p.values
                    .iter()
                    .filter_map(|(slot, value)| {
                        let name = p.uniforms.get(*slot as usize)?;
                        Some((name.clone(), *value))
                    })
                    .collect()
            })
            .unwrap_or_default();

        let index = self.draws.len();
        self.draws.push(DrawRecord {
            mode,
            first,
            count,
            program: HeadlessProgram(program_id),
            buffer: self.bound_buffer.map(HeadlessBuffer),
            uniforms,
        });

        if let Some(code) = self.faults.error_after_draw.get(&index).copied() {
            self.raise(code);
        }
        if self.faults.lose_after_draws.is_some_and(|n| self.draws.len() >= n) {
            self.lost = true;
        }
    }

    fn take_error(&mut self) -> GlErrorCode {
        self.pending_errors
            .pop_front()
            .unwrap_or(GlErrorCode::NO_ERROR)
    }

    fn is_context_lost(&self) -> bool {
        self.lost
    }
}

/// Minimal GLSL front-end check: balanced delimiters and a `main` entry.
fn check_syntax(source: &str) -> Result<(), String> {
    let mut stack: Vec<(char, usize)> = Vec::new();
    for (line_no, line) in source.lines().enumerate() {
        let line_no = line_no + 1;
        let code = line.split("//").next().unwrap_or_default();
        for ch in code.chars() {
            match ch {
                '(' | '{' | '[' => stack.push((ch, line_no)),
                ')' | '}' | ']' => {
                    let expected = match ch {
                        ')' => '(',
                        '}' => '{',
                        _ => '[',
                    };
                    match stack.pop() {
                        Some((open, _)) if open == expected => {}
                        _ => return Err(format!("ERROR: 0:{line_no}: '{ch}' : syntax error")),
                    }
                }
                _ => {}
            }
        }
    }
    if let Some((open, line_no)) = stack.pop() {
        return Err(format!(
            "ERROR: 0:{line_no}: '{open}' : syntax error: unexpected end of file"
        ));
    }
    if !source.contains("main") {
        return Err("ERROR: 0:0: '' : missing main function".to_string());
    }
    Ok(())
}

/// Names declared with `qualifier` that are referenced elsewhere in `source`.
fn active_declarations(source: &str, qualifier: &str) -> Vec<String> {
    let mut names = Vec::new();
    for line in source.lines() {
        let code = line.split("//").next().unwrap_or_default().trim();
        let Some(decl) = code.strip_suffix(';') else { continue };
        let mut tokens = decl.split_whitespace();
        if tokens.next() != Some(qualifier) {
            continue;
        }
        let Some(name) = tokens.last() else { continue };
        let referenced = source
            .match_indices(name)
            .filter(|(at, _)| is_word_at(source, *at, name.len()))
            .count()
            > 1;
        if referenced {
            names.push(name.to_string());
        }
    }
    names
}

fn is_word_at(source: &str, at: usize, len: usize) -> bool {
    let ident = |c: char| c.is_ascii_alphanumeric() || c == '_';
    let before = source[..at].chars().next_back().is_none_or(|c| !ident(c));
    let after = source[at + len..].chars().next().is_none_or(|c| !ident(c));
    before && after
}
