use std::fmt;

use crate::device::GlErrorCode;

use super::PrimitiveKind;

/// A drawable tag outside `triangle | line | point`. Skips that drawable only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPrimitiveError {
    pub tag: String,
}

impl UnknownPrimitiveError {
    pub(crate) fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }
}

impl fmt::Display for UnknownPrimitiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown primitive kind `{}`", self.tag)
    }
}

impl std::error::Error for UnknownPrimitiveError {}

/// The context was lost; the rest of the pass was abandoned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextLostError {
    /// Index of the first drawable that was not processed.
    pub index: usize,
    /// Number of drawables left unprocessed, including `index`.
    pub skipped: usize,
}

impl fmt::Display for ContextLostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rendering context lost before drawable {}; {} drawable(s) skipped",
            self.index, self.skipped
        )
    }
}

impl std::error::Error for ContextLostError {}

/// GL error reported right after a draw call. Non-fatal.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RenderError {
    pub kind: PrimitiveKind,
    pub code: GlErrorCode,
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GL error {} after drawing {}", self.code, self.kind)
    }
}

impl std::error::Error for RenderError {}

/// Vertex data could not be made GPU-resident for a drawable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    /// The context refused to create a buffer object.
    Create(String),
    /// More vertices than a draw call can address.
    TooLarge(usize),
    /// No buffer was supplied for the drawable (foreign cache).
    Missing,
    /// The cached buffer holds a different vertex count than the drawable.
    Stale { uploaded: u32, expected: usize },
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadError::Create(msg) => write!(f, "failed to create vertex buffer: {msg}"),
            UploadError::TooLarge(n) => write!(f, "{n} vertices exceed the draw call limit"),
            UploadError::Missing => f.write_str("no vertex buffer uploaded for this drawable"),
            UploadError::Stale { uploaded, expected } => write!(
                f,
                "cached vertex buffer holds {uploaded} vertices, drawable has {expected}"
            ),
        }
    }
}

impl std::error::Error for UploadError {}

/// Per-drawable problem collected during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderWarning {
    UnknownPrimitive {
        index: usize,
        error: UnknownPrimitiveError,
    },
    Upload {
        index: usize,
        error: UploadError,
    },
    Draw {
        index: usize,
        error: RenderError,
    },
    ContextLost(ContextLostError),
}

impl RenderWarning {
    /// Scene index the warning is attached to.
    pub fn index(&self) -> usize {
        match self {
            RenderWarning::UnknownPrimitive { index, .. }
            | RenderWarning::Upload { index, .. }
            | RenderWarning::Draw { index, .. } => *index,
            RenderWarning::ContextLost(e) => e.index,
        }
    }
}

impl fmt::Display for RenderWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderWarning::UnknownPrimitive { index, error } => write!(f, "drawable {index}: {error}"),
            RenderWarning::Upload { index, error } => write!(f, "drawable {index}: {error}"),
            RenderWarning::Draw { index, error } => write!(f, "drawable {index}: {error}"),
            RenderWarning::ContextLost(error) => error.fmt(f),
        }
    }
}

/// Outcome of one render pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub(super) drawn: Vec<usize>,
    pub(super) warnings: Vec<RenderWarning>,
}

impl FrameReport {
    /// Scene indices that issued a draw call, in issue order.
    pub fn drawn(&self) -> &[usize] {
        &self.drawn
    }

    pub fn draw_calls(&self) -> usize {
        self.drawn.len()
    }

    pub fn warnings(&self) -> &[RenderWarning] {
        &self.warnings
    }

    /// The context loss that cut the pass short, if any.
    pub fn aborted(&self) -> Option<&ContextLostError> {
        self.warnings.iter().find_map(|w| match w {
            RenderWarning::ContextLost(e) => Some(e),
            _ => None,
        })
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn into_warnings(self) -> Vec<RenderWarning> {
        self.warnings
    }
}
