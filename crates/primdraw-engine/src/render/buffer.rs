use std::fmt;

use crate::device::GraphicsContext;

use super::{Scene, SceneEntry, UploadError};

/// GPU-resident vertex positions for one drawable.
///
/// Created fresh by every upload and never partially updated.
pub struct GpuBuffer<C: GraphicsContext> {
    handle: C::Buffer,
    vertex_count: u32,
}

impl<C: GraphicsContext> GpuBuffer<C> {
    #[inline]
    pub fn handle(&self) -> C::Buffer {
        self.handle
    }

    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn release(self, ctx: &mut C) {
        ctx.delete_buffer(self.handle);
    }
}

impl<C: GraphicsContext> fmt::Debug for GpuBuffer<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuBuffer")
            .field("handle", &self.handle)
            .field("vertex_count", &self.vertex_count)
            .finish()
    }
}

/// Uploads `(x, y)` positions into a new array buffer with a static usage hint.
///
/// The buffer is left bound to the array buffer target.
pub fn upload_positions<C: GraphicsContext>(
    ctx: &mut C,
    positions: &[[f32; 2]],
) -> Result<GpuBuffer<C>, UploadError> {
    let vertex_count = checked_vertex_count(positions.len())?;
    let handle = ctx.create_buffer().map_err(UploadError::Create)?;

    ctx.bind_array_buffer(Some(handle));
    ctx.array_buffer_data_static(bytemuck::cast_slice(positions));

    Ok(GpuBuffer {
        handle,
        vertex_count,
    })
}

/// Largest vertex count a single draw call can address (GL counts are signed).
pub const MAX_DRAW_VERTICES: usize = i32::MAX as usize;

fn checked_vertex_count(len: usize) -> Result<u32, UploadError> {
    if len > MAX_DRAW_VERTICES {
        return Err(UploadError::TooLarge(len));
    }
    u32::try_from(len).map_err(|_| UploadError::TooLarge(len))
}

/// Buffers for every drawable of a scene, indexed like `Scene::entries`.
///
/// Callers may keep this across frames for a scene that does not change.
pub struct SceneBuffers<C: GraphicsContext> {
    slots: Vec<Option<Result<GpuBuffer<C>, UploadError>>>,
}

impl<C: GraphicsContext> SceneBuffers<C> {
    /// Uploads every drawable once. Rejected entries get no slot; a failed
    /// upload is kept so that it is reported at its position when rendering.
    pub fn upload(ctx: &mut C, scene: &Scene) -> Self {
        let slots = scene
            .entries()
            .iter()
            .enumerate()
            .map(|(index, entry)| match entry {
                SceneEntry::Drawable(d) => {
                    let uploaded = upload_positions(ctx, d.positions());
                    if let Err(e) = &uploaded {
                        log::warn!("drawable {index}: {e}");
                    }
                    Some(uploaded)
                }
                SceneEntry::Rejected(_) => None,
            })
            .collect();
        Self { slots }
    }

    /// Buffer for scene entry `index`; `Err(UploadError::Missing)` when none
    /// was uploaded.
    pub fn get(&self, index: usize) -> Result<&GpuBuffer<C>, UploadError> {
        match self.slots.get(index) {
            Some(Some(Ok(buffer))) => Ok(buffer),
            Some(Some(Err(e))) => Err(e.clone()),
            Some(None) | None => Err(UploadError::Missing),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Deletes every uploaded buffer.
    pub fn release(self, ctx: &mut C) {
        for buffer in self.slots.into_iter().flatten().flatten() {
            buffer.release(ctx);
        }
    }
}
