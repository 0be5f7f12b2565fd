use std::borrow::Cow;

use crate::device::ShaderStage;
use crate::error::InvalidValue;
use crate::paint::Rgba;

/// Vertex position input of the bundled templates.
pub const POSITION_ATTRIBUTE: &str = "aVertexPosition";
/// Per-draw RGBA color of the uniform-driven templates.
pub const COLOR_UNIFORM: &str = "uColor";
/// Per-draw point size of the uniform-driven templates.
pub const POINT_SIZE_UNIFORM: &str = "uPointSize";

/// Shader text for one pipeline stage. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    stage: ShaderStage,
    text: Cow<'static, str>,
}

impl ShaderSource {
    pub fn new(stage: ShaderStage, text: impl Into<Cow<'static, str>>) -> Self {
        Self {
            stage,
            text: text.into(),
        }
    }

    pub fn vertex(text: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ShaderStage::Vertex, text)
    }

    pub fn fragment(text: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ShaderStage::Fragment, text)
    }

    #[inline]
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Vertex stage reading position from `aVertexPosition` and point size
    /// from `uPointSize`.
    pub fn uniform_vertex() -> Self {
        Self::vertex(UNIFORM_VERTEX)
    }

    /// Fragment stage writing the `uColor` uniform.
    pub fn uniform_fragment() -> Self {
        Self::fragment(UNIFORM_FRAGMENT)
    }

    /// Legacy single-object vertex stage with the point size baked into the
    /// source text. Requires recompiling for every size.
    pub fn baked_vertex(point_size: f32) -> Result<Self, InvalidValue> {
        let size = InvalidValue::check_finite("point_size", point_size)?;
        if size <= 0.0 {
            return Err(InvalidValue::new("point_size", size, "must be positive"));
        }
        Ok(Self::vertex(format!(
            "attribute vec4 {POSITION_ATTRIBUTE};\n\
             \n\
             void main(void) {{\n\
             \x20   gl_Position = {POSITION_ATTRIBUTE};\n\
             \x20   gl_PointSize = {};\n\
             }}\n",
            glsl_float(size)
        )))
    }

    /// Legacy single-object fragment stage with the color baked into the
    /// source text.
    pub fn baked_fragment(color: Rgba) -> Result<Self, InvalidValue> {
        let c = Rgba::try_new(color.r, color.g, color.b, color.a)?;
        Ok(Self::fragment(format!(
            "precision mediump float;\n\
             \n\
             void main(void) {{\n\
             \x20   gl_FragColor = vec4({}, {}, {}, {});\n\
             }}\n",
            glsl_float(c.r),
            glsl_float(c.g),
            glsl_float(c.b),
            glsl_float(c.a)
        )))
    }
}

const UNIFORM_VERTEX: &str = "attribute vec4 aVertexPosition;
uniform float uPointSize;

void main(void) {
    gl_Position = aVertexPosition;
    gl_PointSize = uPointSize;
}
";

const UNIFORM_FRAGMENT: &str = "precision mediump float;
uniform vec4 uColor;

void main(void) {
    gl_FragColor = uColor;
}
";

/// Formats a finite float as a GLSL literal.
///
/// `Debug` prints the shortest round-tripping form and always keeps a
/// fractional part or exponent, which GLSL needs to type the literal as float.
fn glsl_float(v: f32) -> String {
    format!("{v:?}")
}
