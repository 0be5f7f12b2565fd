use std::collections::HashMap;

use crate::device::GraphicsContext;

use super::{COLOR_UNIFORM, POINT_SIZE_UNIFORM, POSITION_ATTRIBUTE};

/// Attribute and uniform names to resolve after linking.
///
/// The default matches the uniform-driven templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramLayout {
    pub position_attribute: String,
    pub color_uniform: String,
    pub point_size_uniform: String,
    /// Extra attributes to resolve for custom shaders.
    pub extra_attributes: Vec<String>,
    /// Extra uniforms to resolve for custom shaders.
    pub extra_uniforms: Vec<String>,
}

impl Default for ProgramLayout {
    fn default() -> Self {
        Self {
            position_attribute: POSITION_ATTRIBUTE.to_string(),
            color_uniform: COLOR_UNIFORM.to_string(),
            point_size_uniform: POINT_SIZE_UNIFORM.to_string(),
            extra_attributes: Vec::new(),
            extra_uniforms: Vec::new(),
        }
    }
}

impl ProgramLayout {
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.position_attribute.as_str())
            .chain(self.extra_attributes.iter().map(String::as_str))
    }

    pub fn uniform_names(&self) -> impl Iterator<Item = &str> {
        [self.color_uniform.as_str(), self.point_size_uniform.as_str()]
            .into_iter()
            .chain(self.extra_uniforms.iter().map(String::as_str))
    }
}

/// Resolved slots. `None` is the "not found" sentinel.
pub struct Locations<C: GraphicsContext> {
    pub attributes: HashMap<String, Option<u32>>,
    pub uniforms: HashMap<String, Option<C::UniformLocation>>,
}

/// Looks every name up independently on a linked program.
///
/// A missing name is not an error: drivers drop inactive inputs, so the slot
/// is recorded as `None` and the remaining names are still resolved.
pub fn resolve_locations<'a, C: GraphicsContext>(
    ctx: &C,
    program: C::Program,
    attribute_names: impl IntoIterator<Item = &'a str>,
    uniform_names: impl IntoIterator<Item = &'a str>,
) -> Locations<C> {
    let attributes = attribute_names
        .into_iter()
        .map(|name| {
            let slot = ctx.attrib_location(program, name);
            if slot.is_none() {
                log::debug!("attribute `{name}` is not active in program {program:?}");
            }
            (name.to_string(), slot)
        })
        .collect();

    let uniforms = uniform_names
        .into_iter()
        .map(|name| {
            let slot = ctx.uniform_location(program, name);
            if slot.is_none() {
                log::debug!("uniform `{name}` is not active in program {program:?}");
            }
            (name.to_string(), slot)
        })
        .collect();

    Locations { attributes, uniforms }
}
