use std::f64::consts::{PI, TAU};
use std::sync::Arc;

use crate::foundation::core::{
    Affine, BezPath, CompositeOp, ImageRGBA, Point, Rect, Rgba8, ShadowProps, Vec2, premul,
};
use crate::foundation::error::{InsetError, InsetResult};
use crate::render::{blur, composite};
use crate::surface::RasterSurface;

const ARC_TOLERANCE: f64 = 0.1;

#[derive(Clone, Copy, Debug)]
struct DrawState {
    transform: Affine,
    fill_style: Rgba8,
    shadow: ShadowProps,
    composite_op: CompositeOp,
}

impl DrawState {
    fn initial() -> Self {
        Self {
            transform: Affine::IDENTITY,
            fill_style: Rgba8::BLACK,
            shadow: ShadowProps::default(),
            composite_op: CompositeOp::SourceOver,
        }
    }
}

/// CPU raster surface with canvas-2D semantics.
///
/// Shapes are rasterized with `vello_cpu` into a full-surface premultiplied layer; the
/// layer's drop shadow and the composite operation are applied here. A shape and its
/// shadow are merged (shape over shadow) before the composite op sees them.
///
/// The current path is kept in device space: points are mapped through the transform
/// that is current when they are added.
pub struct CpuCanvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    state: DrawState,
    stack: Vec<DrawState>,
    path: BezPath,
    subpath_start: Option<Point>,
    current: Option<Point>,
}

impl std::fmt::Debug for CpuCanvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuCanvas")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("state", &self.state)
            .field("saved_states", &self.stack.len())
            .finish_non_exhaustive()
    }
}

impl CpuCanvas {
    /// A transparent surface. Each dimension must fit in `u16`.
    pub fn new(width: u32, height: u32) -> InsetResult<Self> {
        check_dims(width, height)?;
        Ok(Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
            state: DrawState::initial(),
            stack: Vec::new(),
            path: BezPath::new(),
            subpath_start: None,
            current: None,
        })
    }

    /// Premultiplied pixel bytes, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    fn dims_u16(&self) -> InsetResult<(u16, u16)> {
        check_dims(self.width, self.height)
    }

    fn device(&self, x: f64, y: f64) -> Point {
        self.state.transform * Point::new(x, y)
    }

    fn push_move(&mut self, p: Point) {
        self.path.move_to(p);
        self.subpath_start = Some(p);
        self.current = Some(p);
    }

    fn push_line(&mut self, p: Point) {
        if self.current.is_none() {
            self.push_move(p);
            return;
        }
        self.path.line_to(p);
        self.current = Some(p);
    }

    /// Append a circular arc given in user space, connecting from the current point.
    fn append_arc(&mut self, center: Point, radius: f64, start: f64, sweep: f64) {
        let t = self.state.transform;
        let start_pt = center + Vec2::new(radius * start.cos(), radius * start.sin());
        self.push_line(t * start_pt);

        let arc = kurbo::Arc::new(center, Vec2::new(radius, radius), start, sweep, 0.0);
        for el in arc.append_iter(ARC_TOLERANCE) {
            match el {
                kurbo::PathEl::MoveTo(p) => self.push_move(t * p),
                kurbo::PathEl::LineTo(p) => self.push_line(t * p),
                kurbo::PathEl::QuadTo(p1, p2) => {
                    self.path.quad_to(t * p1, t * p2);
                    self.current = Some(t * p2);
                }
                kurbo::PathEl::CurveTo(p1, p2, p3) => {
                    self.path.curve_to(t * p1, t * p2, t * p3);
                    self.current = Some(t * p3);
                }
                kurbo::PathEl::ClosePath => {}
            }
        }
        let end_angle = start + sweep;
        let end = center + Vec2::new(radius * end_angle.cos(), radius * end_angle.sin());
        self.current = Some(t * end);
    }

    fn device_rect_path(&self, x: f64, y: f64, w: f64, h: f64) -> BezPath {
        let mut p = BezPath::new();
        p.move_to(self.device(x, y));
        p.line_to(self.device(x + w, y));
        p.line_to(self.device(x + w, y + h));
        p.line_to(self.device(x, y + h));
        p.close_path();
        p
    }

    fn rasterize(&self, path: &BezPath, color: Rgba8) -> InsetResult<Vec<u8>> {
        let (w, h) = self.dims_u16()?;
        let mut ctx = vello_cpu::RenderContext::new(w, h);
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            color.r, color.g, color.b, color.a,
        ));
        ctx.fill_path(&bezpath_to_cpu(path));
        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        ctx.render_to_pixmap(&mut pixmap);
        Ok(pixmap.data_as_u8_slice().to_vec())
    }

    /// Merge the layer with its shadow, then composite it with the current op.
    fn paint_layer(&mut self, mut layer: Vec<u8>) -> InsetResult<()> {
        let shadow = self.state.shadow;
        if shadow.is_visible() {
            let backdrop = self.shadow_layer(&layer, shadow)?;
            composite::under_in_place(&mut layer, &backdrop)?;
        }
        composite::composite_in_place(&mut self.pixels, &layer, self.state.composite_op)
    }

    fn shadow_layer(&self, layer: &[u8], shadow: ShadowProps) -> InsetResult<Vec<u8>> {
        let (w, h) = (self.width as i64, self.height as i64);
        // Offsets past the surface size move the shadow fully off it.
        let dx = shadow.offset_x.round().clamp(-(w as f64), w as f64) as i64;
        let dy = shadow.offset_y.round().clamp(-(h as f64), h as f64) as i64;

        let mut alpha = vec![0u8; (w * h) as usize];
        for y in 0..h {
            let sy = y - dy;
            if sy < 0 || sy >= h {
                continue;
            }
            for x in 0..w {
                let sx = x - dx;
                if sx < 0 || sx >= w {
                    continue;
                }
                alpha[(y * w + x) as usize] = layer[((sy * w + sx) as usize) * 4 + 3];
            }
        }

        let sigma = (shadow.blur / 2.0) as f32;
        let radius = blur::radius_for_sigma(sigma);
        let alpha = blur::blur_alpha8(&alpha, self.width, self.height, radius, sigma)?;

        let color = shadow.color.to_premul();
        let mut out = vec![0u8; layer.len()];
        for (px, &a) in out.chunks_exact_mut(4).zip(alpha.iter()) {
            if a == 0 {
                continue;
            }
            for c in 0..4 {
                px[c] = premul(color[c], a);
            }
        }
        Ok(out)
    }

    /// Place an integer-aligned, unscaled image region directly into a layer.
    fn blit_layer(&self, image: &ImageRGBA, src: Rect, tx: i64, ty: i64) -> Vec<u8> {
        let (w, h) = (self.width as i64, self.height as i64);
        let mut layer = vec![0u8; self.pixels.len()];
        let (x0, y0) = (src.x0 as i64, src.y0 as i64);
        let (x1, y1) = (src.x1 as i64, src.y1 as i64);
        for v in y0..y1 {
            let dy = v + ty;
            if dy < 0 || dy >= h {
                continue;
            }
            for u in x0..x1 {
                let dx = u + tx;
                if dx < 0 || dx >= w {
                    continue;
                }
                let si = ((v * i64::from(image.width) + u) as usize) * 4;
                let di = ((dy * w + dx) as usize) * 4;
                layer[di..di + 4].copy_from_slice(&image.data[si..si + 4]);
            }
        }
        layer
    }

    fn paint_image_layer(&self, image: &ImageRGBA, src: Rect, m: Affine) -> InsetResult<Vec<u8>> {
        let (w, h) = self.dims_u16()?;
        let pixmap = image_to_pixmap(image)?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        let mut ctx = vello_cpu::RenderContext::new(w, h);
        ctx.set_transform(affine_to_cpu(m));
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(paint);
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(src.x0, src.y0, src.x1, src.y1));
        ctx.flush();
        let mut out = vello_cpu::Pixmap::new(w, h);
        ctx.render_to_pixmap(&mut out);
        Ok(out.data_as_u8_slice().to_vec())
    }
}

impl RasterSurface for CpuCanvas {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn set_size(&mut self, width: u32, height: u32) -> InsetResult<()> {
        *self = Self::new(width, height)?;
        Ok(())
    }

    fn max_dimension(&self) -> Option<u32> {
        Some(u32::from(u16::MAX))
    }

    fn create_offscreen(&self, width: u32, height: u32) -> InsetResult<Self> {
        Self::new(width, height)
    }

    fn transform(&self) -> Affine {
        self.state.transform
    }

    fn set_transform(&mut self, transform: Affine) {
        if transform.as_coeffs().iter().all(|c| c.is_finite()) {
            self.state.transform = transform;
        }
    }

    fn save(&mut self) {
        self.stack.push(self.state);
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn shadow(&self) -> ShadowProps {
        self.state.shadow
    }

    fn set_shadow(&mut self, shadow: ShadowProps) {
        if shadow.is_valid() {
            self.state.shadow = shadow;
        }
    }

    fn composite_op(&self) -> CompositeOp {
        self.state.composite_op
    }

    fn set_composite_op(&mut self, op: CompositeOp) {
        self.state.composite_op = op;
    }

    fn fill_style(&self) -> Rgba8 {
        self.state.fill_style
    }

    fn set_fill_style(&mut self, color: Rgba8) {
        self.state.fill_style = color;
    }

    fn begin_path(&mut self) {
        self.path = BezPath::new();
        self.subpath_start = None;
        self.current = None;
    }

    fn close_path(&mut self) {
        if self.current.is_some() {
            self.path.close_path();
            self.current = self.subpath_start;
        }
    }

    fn move_to(&mut self, x: f64, y: f64) {
        if !all_finite(&[x, y]) {
            return;
        }
        let p = self.device(x, y);
        self.push_move(p);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        if !all_finite(&[x, y]) {
            return;
        }
        let p = self.device(x, y);
        self.push_line(p);
    }

    fn quadratic_curve_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64) {
        if !all_finite(&[cpx, cpy, x, y]) {
            return;
        }
        let (c, p) = (self.device(cpx, cpy), self.device(x, y));
        if self.current.is_none() {
            self.push_move(c);
        }
        self.path.quad_to(c, p);
        self.current = Some(p);
    }

    fn bezier_curve_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64) {
        if !all_finite(&[cp1x, cp1y, cp2x, cp2y, x, y]) {
            return;
        }
        let (c1, c2, p) = (
            self.device(cp1x, cp1y),
            self.device(cp2x, cp2y),
            self.device(x, y),
        );
        if self.current.is_none() {
            self.push_move(c1);
        }
        self.path.curve_to(c1, c2, p);
        self.current = Some(p);
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
        if !all_finite(&[x, y, radius, start_angle, end_angle]) {
            return Ok(());
        }
        if radius < 0.0 {
            return Err(InsetError::validation(format!(
                "arc radius must be >= 0, got {radius}"
            )));
        }
        let sweep = arc_sweep(start_angle, end_angle, anticlockwise);
        self.append_arc(Point::new(x, y), radius, start_angle, sweep);
        Ok(())
    }

    fn arc_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, radius: f64) -> InsetResult<()> {
        if !all_finite(&[x1, y1, x2, y2, radius]) {
            return Ok(());
        }
        if radius < 0.0 {
            return Err(InsetError::validation(format!(
                "arc_to radius must be >= 0, got {radius}"
            )));
        }
        let Some(current) = self.current else {
            self.move_to(x1, y1);
            return Ok(());
        };
        let Some(inv) = invert(self.state.transform) else {
            return Ok(());
        };

        let p0 = inv * current;
        let p1 = Point::new(x1, y1);
        let p2 = Point::new(x2, y2);
        let v1 = p0 - p1;
        let v2 = p2 - p1;
        let cross = v1.x * v2.y - v1.y * v2.x;
        if radius == 0.0 || v1.hypot() < 1e-12 || v2.hypot() < 1e-12 || cross.abs() < 1e-12 {
            self.line_to(x1, y1);
            return Ok(());
        }

        let u1 = v1 / v1.hypot();
        let u2 = v2 / v2.hypot();
        let theta = u1.dot(u2).clamp(-1.0, 1.0).acos();
        let tangent = radius / (theta / 2.0).tan();
        let t1 = p1 + u1 * tangent;
        let bisector = (u1 + u2) / (u1 + u2).hypot();
        let center = p1 + bisector * (radius / (theta / 2.0).sin());
        let t2 = p1 + u2 * tangent;

        let a1 = (t1 - center).atan2();
        let a2 = (t2 - center).atan2();
        let mut sweep = a2 - a1;
        while sweep > PI {
            sweep -= TAU;
        }
        while sweep <= -PI {
            sweep += TAU;
        }
        self.append_arc(center, radius, a1, sweep);
        Ok(())
    }

    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        if !all_finite(&[x, y, width, height]) {
            return;
        }
        self.move_to(x, y);
        self.line_to(x + width, y);
        self.line_to(x + width, y + height);
        self.line_to(x, y + height);
        self.close_path();
        self.move_to(x, y);
    }

    fn fill(&mut self) -> InsetResult<()> {
        if self.is_empty() || self.path.elements().is_empty() {
            return Ok(());
        }
        let layer = self.rasterize(&self.path, self.state.fill_style)?;
        self.paint_layer(layer)
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> InsetResult<()> {
        if self.is_empty() || !all_finite(&[x, y, width, height]) || width == 0.0 || height == 0.0
        {
            return Ok(());
        }
        let path = self.device_rect_path(x, y, width, height);
        let layer = self.rasterize(&path, self.state.fill_style)?;
        self.paint_layer(layer)
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> InsetResult<()> {
        if self.is_empty() || !all_finite(&[x, y, width, height]) || width == 0.0 || height == 0.0
        {
            return Ok(());
        }
        let path = self.device_rect_path(x, y, width, height);
        let mask = self.rasterize(&path, Rgba8::BLACK)?;
        composite::composite_in_place(&mut self.pixels, &mask, CompositeOp::DestinationOut)
    }

    fn draw_image_rect(&mut self, image: &ImageRGBA, src: Rect, dst: Rect) -> InsetResult<()> {
        if !image.is_well_formed() {
            return Err(InsetError::raster("image byte length mismatch"));
        }
        let coords = [src.x0, src.y0, src.x1, src.y1, dst.x0, dst.y0, dst.x1, dst.y1];
        if self.is_empty() || !all_finite(&coords) {
            return Ok(());
        }
        let (src, dst) = (src.abs(), dst.abs());
        if src.area() <= 0.0 || dst.area() <= 0.0 {
            return Ok(());
        }

        let bounds = Rect::new(0.0, 0.0, f64::from(image.width), f64::from(image.height));
        let clipped = src.intersect(bounds);
        if clipped.area() <= 0.0 {
            return Ok(());
        }
        let sx = dst.width() / src.width();
        let sy = dst.height() / src.height();

        let m = self.state.transform
            * Affine::translate(Vec2::new(dst.x0, dst.y0))
            * Affine::scale_non_uniform(sx, sy)
            * Affine::translate(Vec2::new(-src.x0, -src.y0));

        let layer = match integer_translation(m, clipped) {
            Some((tx, ty)) => self.blit_layer(image, clipped, tx, ty),
            None => self.paint_image_layer(image, clipped, m)?,
        };
        self.paint_layer(layer)
    }

    fn snapshot(&self) -> InsetResult<ImageRGBA> {
        ImageRGBA::from_premul(self.width, self.height, self.pixels.clone())
    }
}

fn check_dims(width: u32, height: u32) -> InsetResult<(u16, u16)> {
    let w: u16 = width
        .try_into()
        .map_err(|_| InsetError::raster(format!("surface width {width} exceeds u16")))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| InsetError::raster(format!("surface height {height} exceeds u16")))?;
    Ok((w, h))
}

fn all_finite(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite())
}

/// Canvas arc sweep: clockwise sweeps land in `[0, 2π]`, anticlockwise in `[-2π, 0]`.
fn arc_sweep(start: f64, end: f64, anticlockwise: bool) -> f64 {
    if anticlockwise {
        let span = start - end;
        if span >= TAU { -TAU } else { -span.rem_euclid(TAU) }
    } else {
        let span = end - start;
        if span >= TAU { TAU } else { span.rem_euclid(TAU) }
    }
}

fn invert(t: Affine) -> Option<Affine> {
    let det = t.determinant();
    if det == 0.0 || !det.is_finite() {
        return None;
    }
    Some(t.inverse())
}

/// `Some((tx, ty))` when `m` maps pixels of `src` 1:1 onto whole device pixels.
fn integer_translation(m: Affine, src: Rect) -> Option<(i64, i64)> {
    let [a, b, c, d, e, f] = m.as_coeffs();
    let is_int = |v: f64| (v - v.round()).abs() < 1e-9;
    if a != 1.0 || b != 0.0 || c != 0.0 || d != 1.0 {
        return None;
    }
    if !(is_int(e) && is_int(f) && is_int(src.x0) && is_int(src.y0)) {
        return None;
    }
    if !(is_int(src.x1) && is_int(src.y1)) {
        return None;
    }
    Some((e.round() as i64, f.round() as i64))
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn image_to_pixmap(image: &ImageRGBA) -> InsetResult<vello_cpu::Pixmap> {
    let (w, h) = check_dims(image.width, image.height)?;
    if !image.is_well_formed() {
        return Err(InsetError::raster("image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(image.width as usize * image.height as usize);
    for px in image.data.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
