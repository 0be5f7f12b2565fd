use std::fmt;

/// Error code returned by the GL error poll.
///
/// `GlErrorCode::NO_ERROR` (zero) means the queue of pending errors is empty.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct GlErrorCode(pub u32);

impl GlErrorCode {
    pub const NO_ERROR: Self = Self(0);
    pub const INVALID_ENUM: Self = Self(0x0500);
    pub const INVALID_VALUE: Self = Self(0x0501);
    pub const INVALID_OPERATION: Self = Self(0x0502);
    pub const OUT_OF_MEMORY: Self = Self(0x0505);
    pub const INVALID_FRAMEBUFFER_OPERATION: Self = Self(0x0506);
    pub const CONTEXT_LOST: Self = Self(0x0507);
    pub const CONTEXT_LOST_WEBGL: Self = Self(0x9242);

    #[inline]
    pub fn is_error(self) -> bool {
        self != Self::NO_ERROR
    }

    /// Symbolic name for the standard codes.
    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            Self::NO_ERROR => "NO_ERROR",
            Self::INVALID_ENUM => "INVALID_ENUM",
            Self::INVALID_VALUE => "INVALID_VALUE",
            Self::INVALID_OPERATION => "INVALID_OPERATION",
            Self::OUT_OF_MEMORY => "OUT_OF_MEMORY",
            Self::INVALID_FRAMEBUFFER_OPERATION => "INVALID_FRAMEBUFFER_OPERATION",
            Self::CONTEXT_LOST => "CONTEXT_LOST",
            Self::CONTEXT_LOST_WEBGL => "CONTEXT_LOST_WEBGL",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Display for GlErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name} (0x{:04X})", self.0),
            None => write!(f, "unknown GL error 0x{:04X}", self.0),
        }
    }
}
