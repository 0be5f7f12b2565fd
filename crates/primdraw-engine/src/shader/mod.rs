//! Shader program lifecycle.
//!
//! Setup runs once per process: every stage is compiled, both are linked into
//! one program, then named attribute/uniform slots are resolved. Compile and
//! link failures abort setup; unresolved names do not.

mod compile;
mod error;
mod introspect;
mod link;
mod program;
mod source;

pub use compile::compile_stage;
pub use error::{CompileError, LinkError, SetupError};
pub use introspect::{resolve_locations, Locations, ProgramLayout};
pub use link::link_program;
pub use program::{
    build_default_program, build_program, build_program_with_layout, Program, ProgramSetup,
    ProgramState,
};
pub use source::{ShaderSource, COLOR_UNIFORM, POINT_SIZE_UNIFORM, POSITION_ATTRIBUTE};
