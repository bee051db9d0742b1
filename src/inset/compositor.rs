//! The inset-shadow compositing sequence.
//!
//! Drawing APIs built on the canvas model only cast shadows outward. An inset shadow is
//! produced on the scratch surface instead: the shape is drawn, its alpha is inverted
//! with an exclusive-or fill, and the inverted silhouette is drawn onto itself with the
//! caller's shadow. Under exclusive-or the silhouette cancels itself out and only the
//! shadow it casts into the shape's hole survives. That layer is then laid over the
//! real, shadow-less draw on the visible surface.

use crate::foundation::core::{Affine, CompositeOp, Rect, Rgba8, Vec2};
use crate::foundation::error::InsetResult;
use crate::inset::scratch::ScratchSurface;
use crate::inset::shadow::swap_shadows;
use crate::surface::RasterSurface;

fn origin(buffer: u32) -> Affine {
    let b = f64::from(buffer);
    Affine::translate(Vec2::new(b, b))
}

/// Replay a path-construction call on the scratch surface, then on `visible`.
///
/// The scratch transform mirrors the visible one, so both surfaces accumulate the
/// same geometry.
#[tracing::instrument(level = "trace", skip_all, fields(buffer))]
pub fn pass_through<S: RasterSurface>(
    visible: &mut S,
    scratch: &mut ScratchSurface<S>,
    buffer: u32,
    mut op: impl FnMut(&mut S) -> InsetResult<()>,
) -> InsetResult<()> {
    let s = scratch.prepare(visible, buffer)?;
    s.set_transform(origin(buffer) * visible.transform());
    op(s)?;
    op(visible)
}

/// Run a fill-type call on `visible` with its shadow rendered inset.
///
/// `draw` is the call itself; it runs once on the scratch surface and once on
/// `visible`. On return `visible` has its original shadow state, whether or not a
/// step failed.
#[tracing::instrument(
    level = "debug",
    skip_all,
    fields(width = visible.width(), height = visible.height(), buffer)
)]
pub fn inset_fill<S: RasterSurface>(
    visible: &mut S,
    scratch: &mut ScratchSurface<S>,
    buffer: u32,
    mut draw: impl FnMut(&mut S) -> InsetResult<()>,
) -> InsetResult<()> {
    let s = scratch.prepare(visible, buffer)?;
    let b = f64::from(buffer);
    let (sw, sh) = (f64::from(s.width()), f64::from(s.height()));

    s.set_transform(origin(buffer));
    s.set_composite_op(CompositeOp::SourceOver);
    s.clear_rect(-b, -b, sw, sh)?;

    // Raw shape, drawn with the scratch surface's empty shadow.
    s.set_transform(origin(buffer) * visible.transform());
    draw(s)?;

    // Invert coverage: opaque everywhere except where the shape is.
    s.set_transform(origin(buffer));
    s.set_composite_op(CompositeOp::Xor);
    s.set_fill_style(Rgba8::BLACK);
    s.fill_rect(-b, -b, sw, sh)?;

    swap_shadows(visible, s);
    let drawn = draw_with_inset_layer(visible, s, buffer, &mut draw);
    swap_shadows(s, visible);
    drawn
}

fn draw_with_inset_layer<S: RasterSurface>(
    visible: &mut S,
    s: &mut S,
    buffer: u32,
    draw: &mut impl FnMut(&mut S) -> InsetResult<()>,
) -> InsetResult<()> {
    let b = f64::from(buffer);

    // Still exclusive-or: the opaque silhouette cancels against itself and only its shadow
    // survives inside the hole. Under source-over the silhouette would be kept and fill
    // everything outside the shape black.
    let silhouette = s.snapshot()?;
    s.draw_image(&silhouette, -b, -b)?;

    draw(visible)?;

    let layer = s.snapshot()?;
    let (w, h) = (f64::from(visible.width()), f64::from(visible.height()));
    visible.save();
    visible.set_transform(Affine::IDENTITY);
    let composited = visible.draw_image_rect(
        &layer,
        Rect::new(b, b, b + w, b + h),
        Rect::new(0.0, 0.0, w, h),
    );
    visible.restore();
    composited
}

#[cfg(test)]
#[path = "../../tests/unit/inset/compositor.rs"]
mod tests;
