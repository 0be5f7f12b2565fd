use crate::device::GraphicsContext;

use super::error::{non_empty_log, LinkError};

/// Attaches both stages to a new program object and links it.
///
/// The stages stay attached on success; `ProgramSetup` detaches and releases
/// them. A failed program object is deleted, never returned.
pub fn link_program<C: GraphicsContext>(
    ctx: &mut C,
    vertex: C::Shader,
    fragment: C::Shader,
) -> Result<C::Program, LinkError> {
    let program = ctx.create_program().map_err(|msg| LinkError {
        log: non_empty_log(msg, "failed to create program object"),
    })?;

    ctx.attach_shader(program, vertex);
    ctx.attach_shader(program, fragment);
    ctx.link_program(program);

    if ctx.program_link_status(program) {
        log::debug!("linked shader program {program:?}");
        return Ok(program);
    }

    let log = non_empty_log(ctx.program_info_log(program), "link failed without diagnostics");
    ctx.detach_shader(program, vertex);
    ctx.detach_shader(program, fragment);
    ctx.delete_program(program);
    log::error!("shader program link failed: {}", log.trim_end());
    Err(LinkError { log })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::HeadlessContext;
    use crate::shader::{compile_stage, ShaderSource};

    fn stages(ctx: &mut HeadlessContext) -> (
        <HeadlessContext as GraphicsContext>::Shader,
        <HeadlessContext as GraphicsContext>::Shader,
    ) {
        let vs = compile_stage(ctx, &ShaderSource::uniform_vertex()).unwrap();
        let fs = compile_stage(ctx, &ShaderSource::uniform_fragment()).unwrap();
        (vs, fs)
    }

    #[test]
    fn links_compiled_stages() {
        let mut ctx = HeadlessContext::new();
        let (vs, fs) = stages(&mut ctx);
        let program = link_program(&mut ctx, vs, fs).unwrap();
        assert!(ctx.program_link_status(program));
    }

    #[test]
    fn two_vertex_stages_do_not_link() {
        let mut ctx = HeadlessContext::new();
        let a = compile_stage(&mut ctx, &ShaderSource::uniform_vertex()).unwrap();
        let b = compile_stage(&mut ctx, &ShaderSource::uniform_vertex()).unwrap();
        let err = link_program(&mut ctx, a, b).unwrap_err();
        assert!(err.log.contains("fragment"), "{}", err.log);
        assert_eq!(ctx.live_programs(), 0);
    }

    #[test]
    fn forced_failure_deletes_program() {
        let mut ctx = HeadlessContext::new();
        ctx.fail_links("ERROR: uniform type mismatch");
        let (vs, fs) = stages(&mut ctx);
        let err = link_program(&mut ctx, vs, fs).unwrap_err();
        assert_eq!(err.log, "ERROR: uniform type mismatch");
        assert_eq!(ctx.live_programs(), 0);
    }
}
