use std::fmt;
use std::str::FromStr;

use crate::device::DrawMode;
use crate::error::InvalidValue;
use crate::paint::Rgba;

use super::UnknownPrimitiveError;

/// Point size sent for every non-point drawable.
pub const DEFAULT_POINT_SIZE: f32 = 1.0;

/// Closed set of primitive kinds the renderer can draw.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PrimitiveKind {
    Triangle,
    Line,
    Point,
}

impl PrimitiveKind {
    /// Parses the external `"triangle"`, `"line"` or `"point"` tag.
    pub fn from_tag(tag: &str) -> Result<Self, UnknownPrimitiveError> {
        match tag {
            "triangle" => Ok(PrimitiveKind::Triangle),
            "line" => Ok(PrimitiveKind::Line),
            "point" => Ok(PrimitiveKind::Point),
            other => Err(UnknownPrimitiveError::new(other)),
        }
    }

    pub const fn tag(self) -> &'static str {
        match self {
            PrimitiveKind::Triangle => "triangle",
            PrimitiveKind::Line => "line",
            PrimitiveKind::Point => "point",
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for PrimitiveKind {
    type Err = UnknownPrimitiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s)
    }
}

/// Draw mode for a primitive kind.
pub const fn classify(kind: PrimitiveKind) -> DrawMode {
    match kind {
        PrimitiveKind::Triangle => DrawMode::Triangles,
        PrimitiveKind::Line => DrawMode::Lines,
        PrimitiveKind::Point => DrawMode::Points,
    }
}

/// One object to draw: a primitive kind, its vertices in clip space and a
/// color.
///
/// `point_size` only reaches the shader for `PrimitiveKind::Point`.
#[derive(Debug, Clone, PartialEq)]
pub struct Drawable {
    pub kind: PrimitiveKind,
    pub color: Rgba,
    positions: Vec<[f32; 2]>,
    point_size: f32,
}

impl Drawable {
    pub fn new(kind: PrimitiveKind, positions: Vec<[f32; 2]>, color: Rgba) -> Self {
        Self {
            kind,
            color,
            positions,
            point_size: DEFAULT_POINT_SIZE,
        }
    }

    pub fn triangle(positions: Vec<[f32; 2]>, color: Rgba) -> Self {
        Self::new(PrimitiveKind::Triangle, positions, color)
    }

    pub fn line(positions: Vec<[f32; 2]>, color: Rgba) -> Self {
        Self::new(PrimitiveKind::Line, positions, color)
    }

    pub fn point(position: [f32; 2], color: Rgba, size: f32) -> Self {
        Self::new(PrimitiveKind::Point, vec![position], color).with_point_size(size)
    }

    /// Builds a drawable from a flat `[x0, y0, x1, y1, ..]` array.
    ///
    /// Rejects an odd number of components and non-finite coordinates.
    pub fn from_flat(kind: PrimitiveKind, flat: &[f32], color: Rgba) -> Result<Self, InvalidValue> {
        if flat.len() % 2 != 0 {
            return Err(InvalidValue::new(
                "positions",
                flat.len() as f32,
                "length must be even (x, y pairs)",
            ));
        }
        for &v in flat {
            InvalidValue::check_finite("positions", v)?;
        }
        let positions = flat.chunks_exact(2).map(|p| [p[0], p[1]]).collect();
        Ok(Self::new(kind, positions, color))
    }

    pub fn with_point_size(mut self, size: f32) -> Self {
        self.point_size = size;
        self
    }

    #[inline]
    pub fn positions(&self) -> &[[f32; 2]] {
        &self.positions
    }

    #[inline]
    pub fn point_size(&self) -> f32 {
        self.point_size
    }

    /// Vertices submitted by the draw call: half the flat float count.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Value written to the point size uniform for this drawable.
    pub fn point_size_uniform(&self) -> f32 {
        match self.kind {
            PrimitiveKind::Point => self.point_size,
            PrimitiveKind::Triangle | PrimitiveKind::Line => DEFAULT_POINT_SIZE,
        }
    }
}
