use crate::device::{GlErrorCode, GraphicsContext, VertexAttribLayout};
use crate::paint::Rgba;
use crate::shader::Program;

use super::error::{ContextLostError, FrameReport, RenderError, RenderWarning, UploadError};
use super::{classify, Drawable, GpuBuffer, Scene, SceneBuffers, SceneEntry};

/// Upper bound on error flags drained after a call; GL keeps one per kind.
const MAX_PENDING_ERRORS: usize = 16;

/// Per-pass renderer settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderConfig {
    /// Color buffer clear applied before the first drawable, if any.
    pub clear_color: Option<Rgba>,
}

/// Draws a scene with one shared program, one draw call per drawable.
///
/// Drawables are processed strictly in scene order. A drawable that cannot be
/// drawn is reported and skipped; only context loss ends the pass early.
#[derive(Debug, Default)]
pub struct SceneRenderer {
    config: RenderConfig,
    warned_missing_position: bool,
}

impl SceneRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            warned_missing_position: false,
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Uploads the scene, renders it and releases the buffers again.
    pub fn render_frame<C: GraphicsContext>(
        &mut self,
        ctx: &mut C,
        program: &Program<C>,
        scene: &Scene,
    ) -> FrameReport {
        let buffers = SceneBuffers::upload(ctx, scene);
        let report = self.render(ctx, program, scene, &buffers);
        buffers.release(ctx);
        report
    }

    /// Renders `scene` using buffers uploaded beforehand for the same scene.
    pub fn render<C: GraphicsContext>(
        &mut self,
        ctx: &mut C,
        program: &Program<C>,
        scene: &Scene,
        buffers: &SceneBuffers<C>,
    ) -> FrameReport {
        let mut report = FrameReport::default();

        // Errors raised before the pass must not be blamed on drawable 0.
        let stale = drain_errors(ctx);
        if stale.is_error() {
            log::debug!("discarding GL error {stale} raised before the render pass");
        }

        if let Some(color) = self.config.clear_color {
            if !ctx.is_context_lost() {
                ctx.clear_color_buffer(color);
            }
        }

        for (index, entry) in scene.entries().iter().enumerate() {
            if ctx.is_context_lost() {
                let error = ContextLostError {
                    index,
                    skipped: scene.len() - index,
                };
                log::error!("{error}");
                report.warnings.push(RenderWarning::ContextLost(error));
                break;
            }

            let drawable = match entry {
                SceneEntry::Drawable(d) => d,
                SceneEntry::Rejected(error) => {
                    log::warn!("skipping drawable {index}: {error}");
                    report.warnings.push(RenderWarning::UnknownPrimitive {
                        index,
                        error: error.clone(),
                    });
                    continue;
                }
            };

            let buffer = match buffers.get(index).and_then(|b| matching(b, drawable)) {
                Ok(buffer) => buffer,
                Err(error) => {
                    log::warn!("skipping drawable {index}: {error}");
                    report.warnings.push(RenderWarning::Upload { index, error });
                    continue;
                }
            };

            report.drawn.push(index);
            if let Err(error) = self.draw(ctx, program, drawable, buffer) {
                log::warn!("drawable {index}: {error}");
                report.warnings.push(RenderWarning::Draw { index, error });
            }
        }

        report
    }

    /// Binds state for one drawable, issues its draw call and polls for errors.
    fn draw<C: GraphicsContext>(
        &mut self,
        ctx: &mut C,
        program: &Program<C>,
        drawable: &Drawable,
        buffer: &GpuBuffer<C>,
    ) -> Result<(), RenderError> {
        ctx.bind_array_buffer(Some(buffer.handle()));
        match program.position_attribute() {
            Some(slot) => {
                ctx.vertex_attrib_pointer_f32(slot, VertexAttribLayout::POSITION_2D);
                ctx.enable_vertex_attrib_array(slot);
            }
            None => {
                if !self.warned_missing_position {
                    log::warn!(
                        "position attribute `{}` is not active; drawing without vertex input",
                        program.layout().position_attribute
                    );
                    self.warned_missing_position = true;
                }
            }
        }
        ctx.use_program(Some(program.handle()));

        ctx.uniform_4f(program.color_uniform(), drawable.color.to_array());
        ctx.uniform_1f(program.point_size_uniform(), drawable.point_size_uniform());

        ctx.draw_arrays(classify(drawable.kind), 0, buffer.vertex_count());

        let code = drain_errors(ctx);
        if code.is_error() {
            return Err(RenderError {
                kind: drawable.kind,
                code,
            });
        }
        Ok(())
    }
}

/// Renders `scene` with default settings and returns the per-drawable report.
pub fn render_frame<C: GraphicsContext>(
    ctx: &mut C,
    program: &Program<C>,
    scene: &Scene,
) -> FrameReport {
    SceneRenderer::default().render_frame(ctx, program, scene)
}

/// Rejects a cached buffer uploaded for different geometry.
fn matching<'a, C: GraphicsContext>(
    buffer: &'a GpuBuffer<C>,
    drawable: &Drawable,
) -> Result<&'a GpuBuffer<C>, UploadError> {
    if buffer.vertex_count() as usize != drawable.vertex_count() {
        return Err(UploadError::Stale {
            uploaded: buffer.vertex_count(),
            expected: drawable.vertex_count(),
        });
    }
    Ok(buffer)
}

/// Returns the first pending error and clears the rest.
fn drain_errors<C: GraphicsContext>(ctx: &mut C) -> GlErrorCode {
    let first = ctx.take_error();
    if first.is_error() {
        for _ in 0..MAX_PENDING_ERRORS {
            if !ctx.take_error().is_error() {
                break;
            }
        }
    }
    first
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::headless::Call;
    use crate::device::{DrawMode, HeadlessContext};
    use crate::render::PrimitiveKind;
    use crate::shader::{build_default_program, build_program, ShaderSource};
    use crate::shader::{COLOR_UNIFORM, POINT_SIZE_UNIFORM};

    fn setup() -> (HeadlessContext, Program<HeadlessContext>) {
        let mut ctx = HeadlessContext::new();
        let program = build_default_program(&mut ctx).unwrap();
        (ctx, program)
    }

    fn demo_scene() -> Scene {
        let mut scene = Scene::new();
        scene
            .push_tagged(
                "triangle",
                vec![[-0.5, -0.4], [0.4, -0.4], [0.05, 0.4]],
                Rgba::YELLOW,
                None,
            )
            .push_tagged("line", vec![[-0.5, -0.5], [0.5, 0.5]], Rgba::GREEN, None)
            .push_tagged("point", vec![[-1.0, 1.0]], Rgba::RED, Some(15.0));
        scene
    }

    fn modes(ctx: &HeadlessContext) -> Vec<DrawMode> {
        ctx.draws().iter().map(|d| d.mode).collect()
    }

    // ── scenario ──────────────────────────────────────────────────────────

    #[test]
    fn mixed_scene_draws_each_primitive() {
        let (mut ctx, program) = setup();

        let report = render_frame(&mut ctx, &program, &demo_scene());

        assert!(report.is_clean(), "{:?}", report.warnings());
        assert_eq!(report.draw_calls(), 3);
        assert_eq!(modes(&ctx), [DrawMode::Triangles, DrawMode::Lines, DrawMode::Points]);

        let counts: Vec<u32> = ctx.draws().iter().map(|d| d.count).collect();
        assert_eq!(counts, [3, 2, 1]);

        let sizes: Vec<f32> = ctx
            .draws()
            .iter()
            .map(|d| d.float(POINT_SIZE_UNIFORM).unwrap())
            .collect();
        assert_eq!(sizes, [1.0, 1.0, 15.0]);

        let colors: Vec<[f32; 4]> = ctx
            .draws()
            .iter()
            .map(|d| d.vec4(COLOR_UNIFORM).unwrap())
            .collect();
        assert_eq!(
            colors,
            [Rgba::YELLOW.to_array(), Rgba::GREEN.to_array(), Rgba::RED.to_array()]
        );
        assert!(ctx.draws().iter().all(|d| d.first == 0));
    }

    #[test]
    fn frame_buffers_are_released_after_the_pass() {
        let (mut ctx, program) = setup();
        render_frame(&mut ctx, &program, &demo_scene());
        assert_eq!(ctx.live_buffers(), 0);
    }

    // ── per-drawable state ────────────────────────────────────────────────

    #[test]
    fn binds_buffer_attribute_and_program_before_uniforms() {
        let (mut ctx, program) = setup();
        let scene: Scene = vec![Drawable::point([0.0, 0.0], Rgba::RED, 4.0)].into();
        let buffers = SceneBuffers::upload(&mut ctx, &scene);
        let handle = buffers.get(0).unwrap().handle();
        let start = ctx.calls().len();

        SceneRenderer::default().render(&mut ctx, &program, &scene, &buffers);

        let slot = program.position_attribute().unwrap();
        let calls = &ctx.calls()[start..];
        assert_eq!(calls[0], Call::BindArrayBuffer(Some(handle)));
        assert_eq!(
            calls[1],
            Call::VertexAttribPointer {
                index: slot,
                layout: VertexAttribLayout::POSITION_2D,
            }
        );
        assert_eq!(calls[2], Call::EnableVertexAttribArray(slot));
        assert_eq!(calls[3], Call::UseProgram(Some(program.handle())));
        assert!(matches!(calls[4], Call::Uniform4f(Some(_), c) if c == Rgba::RED.to_array()));
        assert!(matches!(calls[5], Call::Uniform1f(Some(_), size) if size == 4.0));
        assert_eq!(
            calls[6],
            Call::DrawArrays {
                mode: DrawMode::Points,
                first: 0,
                count: 1,
            }
        );
        assert!(ctx.is_attrib_enabled(slot));
    }

    #[test]
    fn point_size_is_forwarded_only_for_points() {
        let (mut ctx, program) = setup();
        let tri = vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        let scene: Scene = [0.5f32, 3.0, 64.0]
            .into_iter()
            .flat_map(|size| {
                [
                    Drawable::point([0.0, 0.0], Rgba::RED, size),
                    Drawable::triangle(tri.clone(), Rgba::YELLOW).with_point_size(size),
                    Drawable::line(vec![[0.0, 0.0], [1.0, 1.0]], Rgba::GREEN).with_point_size(size),
                ]
            })
            .collect();

        let report = render_frame(&mut ctx, &program, &scene);
        assert!(report.is_clean());

        let sizes: Vec<f32> = ctx
            .draws()
            .iter()
            .map(|d| d.float(POINT_SIZE_UNIFORM).unwrap())
            .collect();
        assert_eq!(sizes, [0.5, 1.0, 1.0, 3.0, 1.0, 1.0, 64.0, 1.0, 1.0]);
    }

    #[test]
    fn vertex_count_matches_position_pairs() {
        let (mut ctx, program) = setup();
        let scene: Scene = (1..=6usize)
            .map(|n| {
                let flat: Vec<f32> = (0..n * 2).map(|i| (i as f32) / 10.0).collect();
                Drawable::from_flat(PrimitiveKind::Point, &flat, Rgba::RED).unwrap()
            })
            .collect();

        render_frame(&mut ctx, &program, &scene);

        let counts: Vec<u32> = ctx.draws().iter().map(|d| d.count).collect();
        assert_eq!(counts, [1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn draw_order_follows_scene_order() {
        let (mut ctx, program) = setup();
        let a = Drawable::point([0.0, 0.0], Rgba::RED, 2.0);
        let b = Drawable::line(vec![[0.0, 0.0], [1.0, 1.0]], Rgba::GREEN);
        let c = Drawable::point([0.5, 0.5], Rgba::YELLOW, 8.0);
        let scene: Scene = vec![a, b, c].into();

        let report = render_frame(&mut ctx, &program, &scene);

        assert_eq!(report.drawn(), [0, 1, 2]);
        let colors: Vec<[f32; 4]> = ctx
            .draws()
            .iter()
            .map(|d| d.vec4(COLOR_UNIFORM).unwrap())
            .collect();
        assert_eq!(
            colors,
            [Rgba::RED.to_array(), Rgba::GREEN.to_array(), Rgba::YELLOW.to_array()]
        );
    }

    // ── failure handling ──────────────────────────────────────────────────

    #[test]
    fn unknown_kind_skips_only_that_entry() {
        let (mut ctx, program) = setup();
        let mut scene = Scene::new();
        scene
            .push(Drawable::line(vec![[0.0, 0.0], [1.0, 1.0]], Rgba::GREEN))
            .push_tagged("circle", vec![[0.0, 0.0]], Rgba::RED, Some(3.0))
            .push(Drawable::point([0.0, 0.0], Rgba::RED, 5.0));

        let report = render_frame(&mut ctx, &program, &scene);

        assert_eq!(modes(&ctx), [DrawMode::Lines, DrawMode::Points]);
        assert_eq!(report.drawn(), [0, 2]);
        assert_eq!(report.warnings().len(), 1);
        match &report.warnings()[0] {
            RenderWarning::UnknownPrimitive { index, error } => {
                assert_eq!(*index, 1);
                assert_eq!(error.tag, "circle");
            }
            other => panic!("unexpected warning: {other}"),
        }
        assert!(report.aborted().is_none());
    }

    #[test]
    fn context_loss_stops_the_pass() {
        let (mut ctx, program) = setup();
        let scene: Scene = (0..5)
            .map(|i| Drawable::point([i as f32 * 0.1, 0.0], Rgba::RED, 2.0))
            .collect();
        ctx.lose_context_after_draws(2);

        let report = render_frame(&mut ctx, &program, &scene);

        assert_eq!(ctx.draws().len(), 2);
        assert_eq!(report.drawn(), [0, 1]);
        let lost = report.aborted().unwrap();
        assert_eq!(lost.index, 2);
        assert_eq!(lost.skipped, 3);
        assert_eq!(report.warnings().last().unwrap().index(), 2);
    }

    #[test]
    fn context_lost_before_the_pass_draws_nothing() {
        let (mut ctx, program) = setup();
        ctx.lose_context();

        let report = render_frame(&mut ctx, &program, &demo_scene());

        assert!(ctx.draws().is_empty());
        assert_eq!(report.warnings().len(), 1);
        assert_eq!(
            report.aborted(),
            Some(&ContextLostError {
                index: 0,
                skipped: 3,
            })
        );
    }

    #[test]
    fn post_draw_error_is_reported_and_rendering_continues() {
        let (mut ctx, program) = setup();
        ctx.error_after_draw(1, GlErrorCode::OUT_OF_MEMORY);

        let report = render_frame(&mut ctx, &program, &demo_scene());

        assert_eq!(report.draw_calls(), 3);
        assert_eq!(
            report.warnings(),
            [RenderWarning::Draw {
                index: 1,
                error: RenderError {
                    kind: PrimitiveKind::Line,
                    code: GlErrorCode::OUT_OF_MEMORY,
                },
            }]
        );
    }

    #[test]
    fn stale_errors_are_not_blamed_on_the_first_drawable() {
        let (mut ctx, program) = setup();
        // Nothing is bound: raises INVALID_OPERATION before the pass.
        ctx.draw_arrays(DrawMode::Points, 0, 1);
        ctx.use_program(None);
        ctx.draw_arrays(DrawMode::Points, 0, 1);

        let report = render_frame(&mut ctx, &program, &demo_scene());
        assert!(report.is_clean(), "{:?}", report.warnings());
    }

    #[test]
    fn upload_failure_skips_drawable() {
        let (mut ctx, program) = setup();
        ctx.fail_buffer_creation();

        let report = render_frame(&mut ctx, &program, &demo_scene());

        assert!(ctx.draws().is_empty());
        assert_eq!(report.warnings().len(), 3);
        assert!(report
            .warnings()
            .iter()
            .all(|w| matches!(w, RenderWarning::Upload { error: UploadError::Create(_), .. })));
    }

    #[test]
    fn foreign_buffer_cache_reports_missing_buffers() {
        let (mut ctx, program) = setup();
        let cached = SceneBuffers::upload(&mut ctx, &Scene::new());

        let report = SceneRenderer::default().render(&mut ctx, &program, &demo_scene(), &cached);

        assert!(ctx.draws().is_empty());
        assert!(report
            .warnings()
            .iter()
            .all(|w| matches!(w, RenderWarning::Upload { error: UploadError::Missing, .. })));
    }

    #[test]
    fn cache_uploaded_for_other_geometry_is_rejected() {
        let (mut ctx, program) = setup();
        let old: Scene = vec![Drawable::point([0.0, 0.0], Rgba::RED, 4.0)].into();
        let cached = SceneBuffers::upload(&mut ctx, &old);
        let hexagon = (0..6).map(|i| [i as f32 * 0.1, 0.0]).collect();
        let changed: Scene = vec![Drawable::triangle(hexagon, Rgba::YELLOW)].into();

        let report = SceneRenderer::default().render(&mut ctx, &program, &changed, &cached);

        assert!(ctx.draws().is_empty());
        assert_eq!(report.draw_calls(), 0);
        assert_eq!(
            report.warnings(),
            [RenderWarning::Upload {
                index: 0,
                error: UploadError::Stale {
                    uploaded: 1,
                    expected: 6,
                },
            }]
        );
    }

    // ── caching, config, legacy programs ──────────────────────────────────

    #[test]
    fn cached_buffers_are_reused_across_frames() {
        let (mut ctx, program) = setup();
        let scene = demo_scene();
        let buffers = SceneBuffers::upload(&mut ctx, &scene);
        let mut renderer = SceneRenderer::default();

        renderer.render(&mut ctx, &program, &scene, &buffers);
        renderer.render(&mut ctx, &program, &scene, &buffers);

        let creations = ctx
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::CreateBuffer))
            .count();
        assert_eq!(creations, 3);
        assert_eq!(ctx.draws().len(), 6);

        buffers.release(&mut ctx);
        assert_eq!(ctx.live_buffers(), 0);
    }

    #[test]
    fn clear_color_is_applied_before_drawing() {
        let (mut ctx, program) = setup();
        let mut renderer = SceneRenderer::new(RenderConfig {
            clear_color: Some(Rgba::BLACK),
        });

        renderer.render_frame(&mut ctx, &program, &demo_scene());

        let clear = ctx.calls().iter().position(|c| *c == Call::Clear(Rgba::BLACK));
        let first_draw = ctx
            .calls()
            .iter()
            .position(|c| matches!(c, Call::DrawArrays { .. }));
        assert!(clear.unwrap() < first_draw.unwrap());
    }

    #[test]
    fn baked_program_draws_without_uniform_slots() {
        let mut ctx = HeadlessContext::new();
        let program = build_program(
            &mut ctx,
            &ShaderSource::baked_vertex(10.0).unwrap(),
            &ShaderSource::baked_fragment(Rgba::new(0.0, 0.1, 0.4, 1.0)).unwrap(),
        )
        .unwrap();
        let scene: Scene = vec![Drawable::point([0.0, 0.0], Rgba::RED, 10.0)].into();

        let report = render_frame(&mut ctx, &program, &scene);

        assert!(report.is_clean());
        assert_eq!(ctx.draws().len(), 1);
        assert!(ctx.draws()[0].uniforms.is_empty());
    }

    #[test]
    fn empty_scene_is_a_clean_no_op() {
        let (mut ctx, program) = setup();
        let report = render_frame(&mut ctx, &program, &Scene::new());
        assert!(report.is_clean());
        assert_eq!(report.draw_calls(), 0);
    }
}
