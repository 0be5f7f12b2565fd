use std::collections::HashMap;
use std::fmt;

use anyhow::Context as _;

use crate::device::{GraphicsContext, ShaderStage};

use super::{
    compile_stage, link_program, resolve_locations, ProgramLayout, SetupError, ShaderSource,
};

/// Lifecycle of a program build.
///
/// `Uninitialized → Compiling → Linking → Ready`; any compile or link error
/// moves to `Failed`, which is terminal.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ProgramState {
    Uninitialized,
    Compiling,
    Linking,
    Ready,
    Failed,
}

/// A linked program with its resolved attribute and uniform slots.
///
/// Built once and reused for every draw call. Stage objects are already
/// released; only the program object is owned.
pub struct Program<C: GraphicsContext> {
    handle: C::Program,
    linked: bool,
    layout: ProgramLayout,
    attributes: HashMap<String, Option<u32>>,
    uniforms: HashMap<String, Option<C::UniformLocation>>,
}

impl<C: GraphicsContext> Program<C> {
    #[inline]
    pub fn handle(&self) -> C::Program {
        self.handle
    }

    #[inline]
    pub fn is_linked(&self) -> bool {
        self.linked
    }

    pub fn layout(&self) -> &ProgramLayout {
        &self.layout
    }

    /// Attribute slot for `name`; `None` when inactive or never requested.
    pub fn attribute(&self, name: &str) -> Option<u32> {
        self.attributes.get(name).copied().flatten()
    }

    /// Uniform slot for `name`; `None` when inactive or never requested.
    pub fn uniform(&self, name: &str) -> Option<&C::UniformLocation> {
        self.uniforms.get(name)?.as_ref()
    }

    pub fn position_attribute(&self) -> Option<u32> {
        self.attribute(&self.layout.position_attribute)
    }

    pub fn color_uniform(&self) -> Option<&C::UniformLocation> {
        self.uniform(&self.layout.color_uniform)
    }

    pub fn point_size_uniform(&self) -> Option<&C::UniformLocation> {
        self.uniform(&self.layout.point_size_uniform)
    }

    /// Deletes the program object.
    pub fn release(self, ctx: &mut C) {
        ctx.delete_program(self.handle);
    }
}

impl<C: GraphicsContext> fmt::Debug for Program<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Program")
            .field("handle", &self.handle)
            .field("linked", &self.linked)
            .field("attributes", &self.attributes)
            .field("uniforms", &self.uniforms)
            .finish()
    }
}

/// Drives compile → link → introspect for one program.
///
/// A setup runs once. After `Failed` a new `ProgramSetup` is required.
#[derive(Debug)]
pub struct ProgramSetup {
    state: ProgramState,
    layout: ProgramLayout,
}

impl ProgramSetup {
    pub fn new(layout: ProgramLayout) -> Self {
        Self {
            state: ProgramState::Uninitialized,
            layout,
        }
    }

    pub fn state(&self) -> ProgramState {
        self.state
    }

    pub fn run<C: GraphicsContext>(
        &mut self,
        ctx: &mut C,
        vertex: &ShaderSource,
        fragment: &ShaderSource,
    ) -> Result<Program<C>, SetupError> {
        if self.state != ProgramState::Uninitialized {
            return Err(SetupError::InvalidState(self.state));
        }

        match self.build(ctx, vertex, fragment) {
            Ok(program) => {
                self.transition(ProgramState::Ready);
                Ok(program)
            }
            Err(e) => {
                self.transition(ProgramState::Failed);
                Err(e)
            }
        }
    }

    fn build<C: GraphicsContext>(
        &mut self,
        ctx: &mut C,
        vertex: &ShaderSource,
        fragment: &ShaderSource,
    ) -> Result<Program<C>, SetupError> {
        self.transition(ProgramState::Compiling);
        expect_stage(vertex, ShaderStage::Vertex)?;
        expect_stage(fragment, ShaderStage::Fragment)?;

        let vs = compile_stage(ctx, vertex)?;
        let fs = match compile_stage(ctx, fragment) {
            Ok(fs) => fs,
            Err(e) => {
                ctx.delete_shader(vs);
                return Err(e.into());
            }
        };

        self.transition(ProgramState::Linking);
        let linked = link_program(ctx, vs, fs);

        // Stage objects are not needed once linking is settled either way.
        if let Ok(program) = &linked {
            ctx.detach_shader(*program, vs);
            ctx.detach_shader(*program, fs);
        }
        ctx.delete_shader(vs);
        ctx.delete_shader(fs);
        let handle = linked?;

        let locations = resolve_locations(
            &*ctx,
            handle,
            self.layout.attribute_names(),
            self.layout.uniform_names(),
        );

        Ok(Program {
            handle,
            linked: true,
            layout: self.layout.clone(),
            attributes: locations.attributes,
            uniforms: locations.uniforms,
        })
    }

    fn transition(&mut self, next: ProgramState) {
        log::debug!("program setup: {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

fn expect_stage(source: &ShaderSource, expected: ShaderStage) -> Result<(), SetupError> {
    if source.stage() == expected {
        Ok(())
    } else {
        Err(SetupError::WrongStage {
            expected,
            found: source.stage(),
        })
    }
}

/// Builds a ready program from a vertex/fragment pair using the default layout.
pub fn build_program<C: GraphicsContext>(
    ctx: &mut C,
    vertex: &ShaderSource,
    fragment: &ShaderSource,
) -> Result<Program<C>, SetupError> {
    build_program_with_layout(ctx, vertex, fragment, ProgramLayout::default())
}

pub fn build_program_with_layout<C: GraphicsContext>(
    ctx: &mut C,
    vertex: &ShaderSource,
    fragment: &ShaderSource,
    layout: ProgramLayout,
) -> Result<Program<C>, SetupError> {
    ProgramSetup::new(layout).run(ctx, vertex, fragment)
}

/// Builds the uniform-driven program used for heterogeneous scenes.
pub fn build_default_program<C: GraphicsContext>(ctx: &mut C) -> anyhow::Result<Program<C>> {
    build_program(
        ctx,
        &ShaderSource::uniform_vertex(),
        &ShaderSource::uniform_fragment(),
    )
    .context("failed to build the primitive shader program")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{headless::Call, HeadlessContext};
    use crate::paint::Rgba;
    use crate::shader::{COLOR_UNIFORM, POINT_SIZE_UNIFORM, POSITION_ATTRIBUTE};

    fn uniform_pair() -> (ShaderSource, ShaderSource) {
        (ShaderSource::uniform_vertex(), ShaderSource::uniform_fragment())
    }

    #[test]
    fn builds_ready_program_and_releases_stages() {
        let mut ctx = HeadlessContext::new();
        let (vs, fs) = uniform_pair();
        let mut setup = ProgramSetup::new(ProgramLayout::default());

        let program = setup.run(&mut ctx, &vs, &fs).unwrap();

        assert_eq!(setup.state(), ProgramState::Ready);
        assert!(program.is_linked());
        assert_eq!(program.position_attribute(), Some(0));
        assert!(program.color_uniform().is_some());
        assert!(program.point_size_uniform().is_some());
        assert_eq!(ctx.live_shaders(), 0);
        assert_eq!(ctx.live_programs(), 1);

        let detaches = ctx
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::DetachShader(..)))
            .count();
        assert_eq!(detaches, 2);
    }

    #[test]
    fn syntax_error_fails_with_diagnostic() {
        let mut ctx = HeadlessContext::new();
        let vs = ShaderSource::vertex("attribute vec4 aVertexPosition;\nvoid main(void) {\n");
        let fs = ShaderSource::uniform_fragment();
        let mut setup = ProgramSetup::new(ProgramLayout::default());

        let err = setup.run(&mut ctx, &vs, &fs).unwrap_err();

        match err {
            SetupError::Compile(e) => {
                assert_eq!(e.stage, ShaderStage::Vertex);
                assert!(!e.log.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(setup.state(), ProgramState::Failed);
        assert_eq!(ctx.live_shaders(), 0);
        assert_eq!(ctx.live_programs(), 0);
    }

    #[test]
    fn fragment_failure_releases_vertex_stage() {
        let mut ctx = HeadlessContext::new();
        let vs = ShaderSource::uniform_vertex();
        let fs = ShaderSource::fragment("void main(void) { gl_FragColor = vec4(1.0; }");

        let err = build_program(&mut ctx, &vs, &fs).unwrap_err();

        assert!(matches!(err, SetupError::Compile(ref e) if e.stage == ShaderStage::Fragment));
        assert_eq!(ctx.live_shaders(), 0);
    }

    #[test]
    fn link_failure_is_terminal() {
        let mut ctx = HeadlessContext::new();
        ctx.fail_links("ERROR: varying vColor not written");
        let (vs, fs) = uniform_pair();
        let mut setup = ProgramSetup::new(ProgramLayout::default());

        let err = setup.run(&mut ctx, &vs, &fs).unwrap_err();
        assert!(matches!(err, SetupError::Link(_)));
        assert_eq!(setup.state(), ProgramState::Failed);
        assert_eq!(ctx.live_shaders(), 0);
        assert_eq!(ctx.live_programs(), 0);

        let again = setup.run(&mut ctx, &vs, &fs).unwrap_err();
        assert_eq!(again, SetupError::InvalidState(ProgramState::Failed));
    }

    #[test]
    fn ready_setup_cannot_rerun() {
        let mut ctx = HeadlessContext::new();
        let (vs, fs) = uniform_pair();
        let mut setup = ProgramSetup::new(ProgramLayout::default());
        setup.run(&mut ctx, &vs, &fs).unwrap();
        let err = setup.run(&mut ctx, &vs, &fs).unwrap_err();
        assert_eq!(err, SetupError::InvalidState(ProgramState::Ready));
    }

    #[test]
    fn swapped_sources_are_rejected() {
        let mut ctx = HeadlessContext::new();
        let (vs, fs) = uniform_pair();
        let err = build_program(&mut ctx, &fs, &vs).unwrap_err();
        assert_eq!(
            err,
            SetupError::WrongStage {
                expected: ShaderStage::Vertex,
                found: ShaderStage::Fragment,
            }
        );
        assert!(ctx.calls().is_empty());
    }

    #[test]
    fn baked_program_leaves_uniforms_unresolved() {
        let mut ctx = HeadlessContext::new();
        let vs = ShaderSource::baked_vertex(10.0).unwrap();
        let fs = ShaderSource::baked_fragment(Rgba::new(0.0, 0.1, 0.4, 1.0)).unwrap();

        let program = build_program(&mut ctx, &vs, &fs).unwrap();

        assert_eq!(program.attribute(POSITION_ATTRIBUTE), Some(0));
        assert!(program.uniform(COLOR_UNIFORM).is_none());
        assert!(program.uniform(POINT_SIZE_UNIFORM).is_none());
        assert!(program.uniform("uNeverRequested").is_none());
    }

    #[test]
    fn release_deletes_program_object() {
        let mut ctx = HeadlessContext::new();
        let program = build_default_program(&mut ctx).unwrap();
        program.release(&mut ctx);
        assert_eq!(ctx.live_programs(), 0);
    }

    #[test]
    fn default_program_error_carries_context() {
        let mut ctx = HeadlessContext::new();
        ctx.fail_links("boom");
        let err = build_default_program(&mut ctx).unwrap_err();
        assert!(err.to_string().contains("primitive shader program"));
        assert!(err.downcast_ref::<SetupError>().is_some());
    }
}
