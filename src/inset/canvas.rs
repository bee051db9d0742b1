use crate::foundation::core::{Affine, CompositeOp, ImageRGBA, Rect, Rgba8, ShadowProps};
use crate::foundation::error::InsetResult;
use crate::foundation::settings::InsetSettings;
use crate::inset::compositor;
use crate::inset::scratch::ScratchSurface;
use crate::surface::RasterSurface;

/// A surface decorated with an inset-shadow mode.
///
/// With inset mode off every call goes straight to the wrapped surface. With it on,
/// fill-type calls (`fill`, `fill_rect`, `draw_image*`) render their shadow inset and
/// path-construction calls are mirrored onto a private scratch surface. All other calls
/// only touch the wrapped surface.
///
/// The wrapper owns its scratch surface; dropping the wrapper releases it.
#[derive(Debug)]
pub struct InsetCanvas<S> {
    surface: S,
    scratch: ScratchSurface<S>,
    settings: InsetSettings,
}

impl<S: RasterSurface> InsetCanvas<S> {
    /// Wrap `surface` with default settings (inset off).
    pub fn new(surface: S) -> Self {
        Self::with_settings(surface, InsetSettings::default())
    }

    /// Wrap `surface`; the initial mode comes from `settings.inset`.
    pub fn with_settings(surface: S, settings: InsetSettings) -> Self {
        Self {
            surface,
            scratch: ScratchSurface::new(),
            settings,
        }
    }

    /// Whether inset mode is on.
    pub fn inset(&self) -> bool {
        self.settings.inset
    }

    /// Turn inset mode on or off for subsequent calls.
    pub fn set_inset(&mut self, inset: bool) {
        self.settings.inset = inset;
    }

    /// Current settings.
    pub fn settings(&self) -> InsetSettings {
        self.settings
    }

    /// The wrapped surface.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// The wrapped surface, mutably. Calls made through it bypass inset mode.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// The scratch surface, once an inset call has created it.
    pub fn scratch(&self) -> Option<&S> {
        self.scratch.get()
    }

    /// Drop the scratch surface now; the next inset call allocates a new one.
    pub fn release_scratch(&mut self) {
        self.scratch.release();
    }

    /// Unwrap, releasing the scratch surface.
    pub fn into_inner(self) -> S {
        self.surface
    }

    fn buffer(&self) -> u32 {
        self.settings.buffer.resolve_within(
            self.surface.width(),
            self.surface.height(),
            self.surface.max_dimension(),
        )
    }

    fn path_op(&mut self, mut op: impl FnMut(&mut S) -> InsetResult<()>) -> InsetResult<()> {
        if !self.settings.inset {
            return op(&mut self.surface);
        }
        let buffer = self.buffer();
        tracing::trace!(buffer, "mirroring path call onto scratch surface");
        compositor::pass_through(&mut self.surface, &mut self.scratch, buffer, op)
    }

    fn fill_op(&mut self, mut op: impl FnMut(&mut S) -> InsetResult<()>) -> InsetResult<()> {
        if !self.settings.inset {
            return op(&mut self.surface);
        }
        let buffer = self.buffer();
        compositor::inset_fill(&mut self.surface, &mut self.scratch, buffer, op)
    }

    // Path calls that cannot fail on the host. Scratch resizing still can.
    fn infallible_path_op(&mut self, mut op: impl FnMut(&mut S)) {
        let mirrored = self.path_op(|s| {
            op(s);
            Ok(())
        });
        if let Err(err) = mirrored {
            tracing::warn!(error = %err, "scratch surface unavailable, path call not mirrored");
            op(&mut self.surface);
        }
    }
}

impl<S: RasterSurface> RasterSurface for InsetCanvas<S> {
    fn width(&self) -> u32 {
        self.surface.width()
    }

    fn height(&self) -> u32 {
        self.surface.height()
    }

    fn set_size(&mut self, width: u32, height: u32) -> InsetResult<()> {
        self.surface.set_size(width, height)
    }

    fn max_dimension(&self) -> Option<u32> {
        self.surface.max_dimension()
    }

    fn create_offscreen(&self, width: u32, height: u32) -> InsetResult<Self> {
        Ok(Self::with_settings(
            self.surface.create_offscreen(width, height)?,
            self.settings,
        ))
    }

    fn transform(&self) -> Affine {
        self.surface.transform()
    }

    fn set_transform(&mut self, transform: Affine) {
        self.surface.set_transform(transform);
    }

    fn save(&mut self) {
        self.surface.save();
    }

    fn restore(&mut self) {
        self.surface.restore();
    }

    fn shadow(&self) -> ShadowProps {
        self.surface.shadow()
    }

    fn set_shadow(&mut self, shadow: ShadowProps) {
        self.surface.set_shadow(shadow);
    }

    fn composite_op(&self) -> CompositeOp {
        self.surface.composite_op()
    }

    fn set_composite_op(&mut self, op: CompositeOp) {
        self.surface.set_composite_op(op);
    }

    fn fill_style(&self) -> Rgba8 {
        self.surface.fill_style()
    }

    fn set_fill_style(&mut self, color: Rgba8) {
        self.surface.set_fill_style(color);
    }

    fn begin_path(&mut self) {
        self.infallible_path_op(|s| s.begin_path());
    }

    fn close_path(&mut self) {
        self.infallible_path_op(|s| s.close_path());
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.infallible_path_op(|s| s.move_to(x, y));
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.infallible_path_op(|s| s.line_to(x, y));
    }

    fn quadratic_curve_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64) {
        self.infallible_path_op(|s| s.quadratic_curve_to(cpx, cpy, x, y));
    }

    fn bezier_curve_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64) {
        self.infallible_path_op(|s| s.bezier_curve_to(cp1x, cp1y, cp2x, cp2y, x, y));
    }

    fn arc(
        &mut self,
        x: f64,
        y: f64,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        anticlockwise: bool,
    ) -> InsetResult<()> {
        self.path_op(|s| s.arc(x, y, radius, start_angle, end_angle, anticlockwise))
    }

    fn arc_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, radius: f64) -> InsetResult<()> {
        self.path_op(|s| s.arc_to(x1, y1, x2, y2, radius))
    }

    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.infallible_path_op(|s| s.rect(x, y, width, height));
    }

    fn fill(&mut self) -> InsetResult<()> {
        self.fill_op(|s| s.fill())
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> InsetResult<()> {
        self.fill_op(|s| s.fill_rect(x, y, width, height))
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> InsetResult<()> {
        self.surface.clear_rect(x, y, width, height)
    }

    fn draw_image_rect(&mut self, image: &ImageRGBA, src: Rect, dst: Rect) -> InsetResult<()> {
        self.fill_op(|s| s.draw_image_rect(image, src, dst))
    }

    fn snapshot(&self) -> InsetResult<ImageRGBA> {
        self.surface.snapshot()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/inset/canvas.rs"]
mod tests;
