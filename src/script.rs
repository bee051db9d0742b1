use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::foundation::core::{Affine, CompositeOp, ImageRGBA, Rect, Rgba8, ShadowProps};
use crate::foundation::error::{InsetError, InsetResult};
use crate::foundation::settings::InsetSettings;
use crate::inset::canvas::InsetCanvas;
use crate::inset::scratch::scratch_dims;
use crate::render::cpu::CpuCanvas;
use crate::surface::RasterSurface;

/// Size of the surface a script draws on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CanvasSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// A JSON list of drawing calls replayed onto an [`InsetCanvas`] over a [`CpuCanvas`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DrawScript {
    /// Target surface size.
    pub canvas: CanvasSize,
    /// Wrapper settings; `settings.inset` is the mode before the first command.
    #[serde(default)]
    pub settings: InsetSettings,
    /// Color filled over the whole surface before the first command.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Rgba8>,
    /// Commands, in order.
    pub ops: Vec<DrawCmd>,
}

/// One drawing call. Serialized with an `"op"` tag, e.g. `{"op": "fill_rect", ...}`.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCmd {
    SetInset {
        inset: bool,
    },
    SetFillStyle {
        color: Rgba8,
    },
    SetShadow(ShadowProps),
    SetCompositeOp {
        mode: CompositeOp,
    },
    Save,
    Restore,
    Translate {
        x: f64,
        y: f64,
    },
    Scale {
        x: f64,
        y: f64,
    },
    Rotate {
        angle: f64,
    },
    /// Coefficients `[a, b, c, d, e, f]` of the canvas matrix.
    SetTransform {
        matrix: [f64; 6],
    },
    BeginPath,
    ClosePath,
    MoveTo {
        x: f64,
        y: f64,
    },
    LineTo {
        x: f64,
        y: f64,
    },
    QuadraticCurveTo {
        cpx: f64,
        cpy: f64,
        x: f64,
        y: f64,
    },
    BezierCurveTo {
        cp1x: f64,
        cp1y: f64,
        cp2x: f64,
        cp2y: f64,
        x: f64,
        y: f64,
    },
    Arc {
        x: f64,
        y: f64,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        #[serde(default)]
        anticlockwise: bool,
    },
    ArcTo {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        radius: f64,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Fill,
    FillRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    ClearRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    /// Draw an image file, relative to the script directory. Without `width`/`height`
    /// the image is drawn at its natural size.
    DrawImage {
        path: PathBuf,
        dx: f64,
        dy: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        height: Option<f64>,
    },
}

impl DrawScript {
    /// Parse a script from JSON.
    pub fn from_json(json: &str) -> InsetResult<Self> {
        serde_json::from_str(json).map_err(|e| InsetError::script(format!("parse script: {e}")))
    }

    /// Reject values no surface would accept.
    pub fn validate(&self) -> InsetResult<()> {
        if self.canvas.width > u32::from(u16::MAX) || self.canvas.height > u32::from(u16::MAX) {
            return Err(InsetError::validation(format!(
                "canvas {}x{} exceeds {}x{}",
                self.canvas.width,
                self.canvas.height,
                u16::MAX,
                u16::MAX
            )));
        }
        let max_side = u32::from(u16::MAX);
        let (w, h) = (self.canvas.width, self.canvas.height);
        let buffer = self.settings.buffer.resolve_within(w, h, Some(max_side));
        let (sw, sh) = scratch_dims(w, h, buffer)?;
        if sw > max_side || sh > max_side {
            return Err(InsetError::validation(format!(
                "{buffer}px buffer needs a {sw}x{sh} scratch surface, over {max_side}x{max_side}"
            )));
        }
        for (i, cmd) in self.ops.iter().enumerate() {
            match cmd {
                DrawCmd::SetShadow(shadow) if !shadow.is_valid() => {
                    return Err(InsetError::validation(format!(
                        "op {i}: shadow blur must be finite and >= 0 and offsets finite"
                    )));
                }
                DrawCmd::Arc { radius, .. } | DrawCmd::ArcTo { radius, .. }
                    if !(radius.is_finite() && *radius >= 0.0) =>
                {
                    return Err(InsetError::validation(format!(
                        "op {i}: arc radius must be finite and >= 0"
                    )));
                }
                DrawCmd::DrawImage { path, .. } if path.as_os_str().is_empty() => {
                    return Err(InsetError::validation(format!(
                        "op {i}: draw_image path must be non-empty"
                    )));
                }
                DrawCmd::DrawImage { width, height, .. }
                    if width.iter().chain(height).any(|v| !v.is_finite()) =>
                {
                    return Err(InsetError::validation(format!(
                        "op {i}: draw_image size must be finite"
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Validate, then replay every command and return the resulting pixels.
    ///
    /// Image files are resolved against `base_dir` and decoded before the first command
    /// runs.
    pub fn render(&self, base_dir: &Path) -> InsetResult<ImageRGBA> {
        self.render_with(base_dir, true)
    }

    /// Like [`Self::render`] but with inset mode forced off for every command.
    pub fn render_plain(&self, base_dir: &Path) -> InsetResult<ImageRGBA> {
        self.render_with(base_dir, false)
    }

    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(width = self.canvas.width, height = self.canvas.height, ops = self.ops.len())
    )]
    fn render_with(&self, base_dir: &Path, allow_inset: bool) -> InsetResult<ImageRGBA> {
        self.validate()?;
        let images = self.prepare_images(base_dir)?;

        let surface = CpuCanvas::new(self.canvas.width, self.canvas.height)?;
        let mut settings = self.settings;
        settings.inset &= allow_inset;
        let mut canvas = InsetCanvas::with_settings(surface, settings);

        if let Some(bg) = self.background {
            let (w, h) = (f64::from(self.canvas.width), f64::from(self.canvas.height));
            let surface = canvas.surface_mut();
            surface.set_fill_style(bg);
            surface.fill_rect(0.0, 0.0, w, h)?;
            surface.set_fill_style(Rgba8::BLACK);
        }

        for (i, cmd) in self.ops.iter().enumerate() {
            apply(&mut canvas, cmd, &images, allow_inset).map_err(|e| match e {
                InsetError::Other(err) => InsetError::Other(err.context(format!("op {i}"))),
                other => InsetError::script(format!("op {i}: {other}")),
            })?;
        }

        let out = canvas.snapshot()?;
        tracing::debug!("rendered draw script");
        Ok(out)
    }

    fn prepare_images(&self, base_dir: &Path) -> InsetResult<BTreeMap<PathBuf, ImageRGBA>> {
        let mut images = BTreeMap::new();
        for cmd in &self.ops {
            let DrawCmd::DrawImage { path, .. } = cmd else {
                continue;
            };
            if images.contains_key(path) {
                continue;
            }
            let image = ImageRGBA::load(&base_dir.join(path))?;
            tracing::debug!(
                path = %path.display(),
                width = image.width,
                height = image.height,
                "loaded script image"
            );
            images.insert(path.clone(), image);
        }
        Ok(images)
    }
}

fn apply(
    canvas: &mut InsetCanvas<CpuCanvas>,
    cmd: &DrawCmd,
    images: &BTreeMap<PathBuf, ImageRGBA>,
    allow_inset: bool,
) -> InsetResult<()> {
    match *cmd {
        DrawCmd::SetInset { inset } => canvas.set_inset(inset && allow_inset),
        DrawCmd::SetFillStyle { color } => canvas.set_fill_style(color),
        DrawCmd::SetShadow(shadow) => canvas.set_shadow(shadow),
        DrawCmd::SetCompositeOp { mode } => canvas.set_composite_op(mode),
        DrawCmd::Save => canvas.save(),
        DrawCmd::Restore => canvas.restore(),
        DrawCmd::Translate { x, y } => canvas.translate(x, y),
        DrawCmd::Scale { x, y } => canvas.scale(x, y),
        DrawCmd::Rotate { angle } => canvas.rotate(angle),
        DrawCmd::SetTransform { matrix } => canvas.set_transform(Affine::new(matrix)),
        DrawCmd::BeginPath => canvas.begin_path(),
        DrawCmd::ClosePath => canvas.close_path(),
        DrawCmd::MoveTo { x, y } => canvas.move_to(x, y),
        DrawCmd::LineTo { x, y } => canvas.line_to(x, y),
        DrawCmd::QuadraticCurveTo { cpx, cpy, x, y } => canvas.quadratic_curve_to(cpx, cpy, x, y),
        DrawCmd::BezierCurveTo {
            cp1x,
            cp1y,
            cp2x,
            cp2y,
            x,
            y,
        } => canvas.bezier_curve_to(cp1x, cp1y, cp2x, cp2y, x, y),
        DrawCmd::Arc {
            x,
            y,
            radius,
            start_angle,
            end_angle,
            anticlockwise,
        } => canvas.arc(x, y, radius, start_angle, end_angle, anticlockwise)?,
        DrawCmd::ArcTo {
            x1,
            y1,
            x2,
            y2,
            radius,
        } => canvas.arc_to(x1, y1, x2, y2, radius)?,
        DrawCmd::Rect {
            x,
            y,
            width,
            height,
        } => canvas.rect(x, y, width, height),
        DrawCmd::Fill => canvas.fill()?,
        DrawCmd::FillRect {
            x,
            y,
            width,
            height,
        } => canvas.fill_rect(x, y, width, height)?,
        DrawCmd::ClearRect {
            x,
            y,
            width,
            height,
        } => canvas.clear_rect(x, y, width, height)?,
        DrawCmd::DrawImage {
            ref path,
            dx,
            dy,
            width,
            height,
        } => {
            let image = images.get(path).ok_or_else(|| {
                InsetError::script(format!("image '{}' was not prepared", path.display()))
            })?;
            let w = width.unwrap_or(f64::from(image.width));
            let h = height.unwrap_or(f64::from(image.height));
            let src = Rect::new(0.0, 0.0, f64::from(image.width), f64::from(image.height));
            canvas.draw_image_rect(image, src, Rect::new(dx, dy, dx + w, dy + h))?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../tests/unit/script.rs"]
mod tests;
