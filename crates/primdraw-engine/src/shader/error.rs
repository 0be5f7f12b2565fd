use std::fmt;

use crate::device::ShaderStage;

use super::ProgramState;

/// A stage failed to compile. Fatal to program setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    pub stage: ShaderStage,
    /// Driver diagnostic; never empty.
    pub log: String,
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to compile {} shader: {}", self.stage, self.log.trim_end())
    }
}

impl std::error::Error for CompileError {}

/// The program failed to link. Fatal to program setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkError {
    /// Driver diagnostic; never empty.
    pub log: String,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to link shader program: {}", self.log.trim_end())
    }
}

impl std::error::Error for LinkError {}

/// Any failure that aborts program setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    Compile(CompileError),
    Link(LinkError),
    /// A source was supplied for the wrong pipeline stage.
    WrongStage {
        expected: ShaderStage,
        found: ShaderStage,
    },
    /// `ProgramSetup::run` was called on a setup that already finished.
    /// A failed setup must be restarted with a fresh `ProgramSetup`.
    InvalidState(ProgramState),
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupError::Compile(e) => e.fmt(f),
            SetupError::Link(e) => e.fmt(f),
            SetupError::WrongStage { expected, found } => {
                write!(f, "expected a {expected} shader source, got a {found} one")
            }
            SetupError::InvalidState(state) => {
                write!(f, "program setup cannot run from state {state:?}")
            }
        }
    }
}

impl std::error::Error for SetupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SetupError::Compile(e) => Some(e),
            SetupError::Link(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CompileError> for SetupError {
    fn from(e: CompileError) -> Self {
        SetupError::Compile(e)
    }
}

impl From<LinkError> for SetupError {
    fn from(e: LinkError) -> Self {
        SetupError::Link(e)
    }
}

/// Drivers may report failure with an empty log; keep the diagnostic useful.
pub(super) fn non_empty_log(log: String, fallback: &str) -> String {
    if log.trim().is_empty() {
        fallback.to_string()
    } else {
        log
    }
}
