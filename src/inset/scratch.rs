use crate::foundation::core::{Affine, Vec2};
use crate::foundation::error::{InsetError, InsetResult};
use crate::surface::RasterSurface;

/// The hidden surface belonging to exactly one visible surface.
///
/// Created lazily on the first inset draw and dropped together with its owner, so a
/// scratch surface never outlives, or is shared between, visible surfaces.
#[derive(Debug)]
pub struct ScratchSurface<S> {
    surface: Option<S>,
}

impl<S> Default for ScratchSurface<S> {
    fn default() -> Self {
        Self { surface: None }
    }
}

impl<S: RasterSurface> ScratchSurface<S> {
    /// An empty slot; nothing is allocated until [`Self::get_or_create`].
    pub fn new() -> Self {
        Self::default()
    }

    /// The scratch surface if one has been created.
    pub fn get(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    /// Drop the scratch surface, returning it if it existed.
    pub fn release(&mut self) -> Option<S> {
        self.surface.take()
    }

    /// Existing scratch surface, or a new empty one allocated through `visible`.
    pub fn get_or_create(&mut self, visible: &S) -> InsetResult<&mut S> {
        if self.surface.is_none() {
            let created = visible.create_offscreen(0, 0)?;
            tracing::debug!(
                visible_width = visible.width(),
                visible_height = visible.height(),
                "created scratch surface"
            );
            self.surface = Some(created);
        }
        self.surface
            .as_mut()
            .ok_or_else(|| InsetError::raster("scratch surface missing after creation"))
    }

    /// [`Self::get_or_create`] followed by [`resize`].
    pub fn prepare(&mut self, visible: &S, buffer: u32) -> InsetResult<&mut S> {
        let scratch = self.get_or_create(visible)?;
        resize(scratch, visible, buffer)?;
        Ok(scratch)
    }
}

/// Scratch dimensions for a visible surface: its size plus `buffer` on every side.
pub fn scratch_dims(width: u32, height: u32, buffer: u32) -> InsetResult<(u32, u32)> {
    let margin = buffer
        .checked_mul(2)
        .ok_or_else(|| InsetError::raster("scratch buffer overflow"))?;
    let w = width
        .checked_add(margin)
        .ok_or_else(|| InsetError::raster("scratch width overflow"))?;
    let h = height
        .checked_add(margin)
        .ok_or_else(|| InsetError::raster("scratch height overflow"))?;
    Ok((w, h))
}

/// Size `scratch` to `visible` plus the margin. Only on an actual size change is the
/// surface reallocated (losing its contents) and its origin moved to `(buffer, buffer)`.
///
/// Returns whether the size changed.
pub fn resize<S: RasterSurface>(scratch: &mut S, visible: &S, buffer: u32) -> InsetResult<bool> {
    let (w, h) = scratch_dims(visible.width(), visible.height(), buffer)?;
    if scratch.width() == w && scratch.height() == h {
        return Ok(false);
    }
    scratch.set_size(w, h)?;
    let b = f64::from(buffer);
    scratch.set_transform(Affine::translate(Vec2::new(b, b)));
    tracing::debug!(width = w, height = h, buffer, "resized scratch surface");
    Ok(true)
}

#[cfg(test)]
#[path = "../../tests/unit/inset/scratch.rs"]
mod tests;
