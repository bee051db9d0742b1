use crate::foundation::core::{Affine, CompositeOp, ImageRGBA, Rect, Rgba8, ShadowProps, Vec2};
use crate::foundation::error::InsetResult;

/// A 2D raster drawing target with canvas-style immediate-mode operations.
///
/// This is the host capability the inset compositor consumes. Implementations own their
/// pixels and rendering state; callers drive them from a single thread.
///
/// Rendering state (transform, fill style, shadow, composite op) starts at the canvas
/// defaults: identity, opaque black, no shadow, source-over.
pub trait RasterSurface {
    /// Width in pixels.
    fn width(&self) -> u32;
    /// Height in pixels.
    fn height(&self) -> u32;

    /// Resize the surface. Pixels, the current path, the state stack and all rendering
    /// state are reset.
    fn set_size(&mut self, width: u32, height: u32) -> InsetResult<()>;

    /// Largest width or height this kind of surface can be allocated with, if bounded.
    fn max_dimension(&self) -> Option<u32> {
        None
    }

    /// Allocate a new, empty surface of the same kind.
    fn create_offscreen(&self, width: u32, height: u32) -> InsetResult<Self>
    where
        Self: Sized;

    /// Current user-to-device transform.
    fn transform(&self) -> Affine;
    /// Replace the current transform.
    fn set_transform(&mut self, transform: Affine);

    /// Translate the origin.
    fn translate(&mut self, dx: f64, dy: f64) {
        let t = self.transform() * Affine::translate(Vec2::new(dx, dy));
        self.set_transform(t);
    }

    /// Scale the user space.
    fn scale(&mut self, sx: f64, sy: f64) {
        let t = self.transform() * Affine::scale_non_uniform(sx, sy);
        self.set_transform(t);
    }

    /// Rotate the user space clockwise by `angle` radians.
    fn rotate(&mut self, angle: f64) {
        let t = self.transform() * Affine::rotate(angle);
        self.set_transform(t);
    }

    /// Push the rendering state.
    fn save(&mut self);
    /// Pop the rendering state; no-op when nothing was saved.
    fn restore(&mut self);

    /// Current shadow state.
    fn shadow(&self) -> ShadowProps;
    /// Replace the shadow state. Invalid values are ignored.
    fn set_shadow(&mut self, shadow: ShadowProps);

    /// Current composite operation.
    fn composite_op(&self) -> CompositeOp;
    /// Replace the composite operation.
    fn set_composite_op(&mut self, op: CompositeOp);

    /// Current fill color.
    fn fill_style(&self) -> Rgba8;
    /// Replace the fill color.
    fn set_fill_style(&mut self, color: Rgba8);

    /// Start a new, empty path.
    fn begin_path(&mut self);
    /// Close the current subpath.
    fn close_path(&mut self);
    /// Start a subpath at `(x, y)`.
    fn move_to(&mut self, x: f64, y: f64);
    /// Straight segment to `(x, y)`.
    fn line_to(&mut self, x: f64, y: f64);
    /// Quadratic Bézier segment.
    fn quadratic_curve_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64);
    /// Cubic Bézier segment.
    fn bezier_curve_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64);
    /// Circular arc around `(x, y)`; angles in radians, clockwise unless `anticlockwise`.
    fn arc(
        &mut self,
        x: f64,
        y: f64,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        anticlockwise: bool,
    ) -> InsetResult<()>;
    /// Arc tangent to the lines (current point, `p1`) and (`p1`, `p2`).
    fn arc_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, radius: f64) -> InsetResult<()>;
    /// Closed rectangular subpath.
    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    /// Fill the current path with the fill style.
    fn fill(&mut self) -> InsetResult<()>;
    /// Fill a rectangle with the fill style, leaving the current path untouched.
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> InsetResult<()>;
    /// Make a rectangle fully transparent, ignoring shadow and composite op.
    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> InsetResult<()>;

    /// Draw the `src` region of `image` into the `dst` rectangle (user space).
    fn draw_image_rect(&mut self, image: &ImageRGBA, src: Rect, dst: Rect) -> InsetResult<()>;

    /// Draw all of `image` at `(dx, dy)` at its natural size.
    fn draw_image(&mut self, image: &ImageRGBA, dx: f64, dy: f64) -> InsetResult<()> {
        let (w, h) = (f64::from(image.width), f64::from(image.height));
        self.draw_image_rect(
            image,
            Rect::new(0.0, 0.0, w, h),
            Rect::new(dx, dy, dx + w, dy + h),
        )
    }

    /// Copy of the current pixels.
    fn snapshot(&self) -> InsetResult<ImageRGBA>;
}
