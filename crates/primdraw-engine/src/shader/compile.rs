use crate::device::GraphicsContext;

use super::error::{non_empty_log, CompileError};
use super::ShaderSource;

/// Compiles one stage and returns its handle.
///
/// On failure the stage object is deleted before the error is returned, so
/// the caller never owns a half-built stage.
pub fn compile_stage<C: GraphicsContext>(
    ctx: &mut C,
    source: &ShaderSource,
) -> Result<C::Shader, CompileError> {
    let stage = source.stage();
    let shader = ctx.create_shader(stage).map_err(|msg| CompileError {
        stage,
        log: non_empty_log(msg, "failed to create shader object"),
    })?;

    ctx.shader_source(shader, source.text());
    ctx.compile_shader(shader);

    if ctx.shader_compile_status(shader) {
        log::debug!("compiled {stage} shader");
        return Ok(shader);
    }

    let log = non_empty_log(ctx.shader_info_log(shader), "compilation failed without diagnostics");
    ctx.delete_shader(shader);
    log::error!("{stage} shader compilation failed: {}", log.trim_end());
    Err(CompileError { stage, log })
}
