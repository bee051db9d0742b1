use std::path::Path;

use crate::foundation::error::{InsetError, InsetResult};

pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// Straight-alpha RGBA8 color, as assigned to fill and shadow styles.
///
/// Serialized as a `[r, g, b, a]` array.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(from = "[u8; 4]", into = "[u8; 4]")]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel (255 = opaque).
    pub a: u8,
}

impl Rgba8 {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    /// Opaque black.
    pub const BLACK: Self = Self::new(0, 0, 0, 255);

    /// Build a color from its straight-alpha channels.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Premultiplied `[r, g, b, a]` bytes for this color.
    pub fn to_premul(self) -> [u8; 4] {
        [
            premul(self.r, self.a),
            premul(self.g, self.a),
            premul(self.b, self.a),
            self.a,
        ]
    }
}

impl From<[u8; 4]> for Rgba8 {
    fn from([r, g, b, a]: [u8; 4]) -> Self {
        Self { r, g, b, a }
    }
}

impl From<Rgba8> for [u8; 4] {
    fn from(c: Rgba8) -> Self {
        [c.r, c.g, c.b, c.a]
    }
}

/// The shadow-related rendering state of a surface: blur, offsets and color.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ShadowProps {
    /// Blur radius in device pixels, `>= 0`.
    pub blur: f64,
    /// Horizontal offset in device pixels.
    pub offset_x: f64,
    /// Vertical offset in device pixels.
    pub offset_y: f64,
    /// Shadow color; transparent disables the shadow.
    pub color: Rgba8,
}

impl ShadowProps {
    /// A shadow with the given blur and color and no offset.
    pub fn blurred(blur: f64, color: Rgba8) -> Self {
        Self {
            blur,
            color,
            ..Self::default()
        }
    }

    /// Whether every field holds a value a surface would accept.
    pub fn is_valid(&self) -> bool {
        self.blur.is_finite()
            && self.blur >= 0.0
            && self.offset_x.is_finite()
            && self.offset_y.is_finite()
    }

    /// Whether drawing with this state produces any shadow pixels.
    pub fn is_visible(&self) -> bool {
        self.color.a != 0 && (self.blur > 0.0 || self.offset_x != 0.0 || self.offset_y != 0.0)
    }
}

/// Porter-Duff composite operations supported by surfaces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompositeOp {
    /// Source drawn over destination.
    #[default]
    SourceOver,
    /// Exclusive-or of source and destination coverage.
    Xor,
    /// Source replaces destination.
    Copy,
    /// Destination kept where the source is absent.
    DestinationOut,
}

impl CompositeOp {
    /// Canvas-style name of the operation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SourceOver => "source-over",
            Self::Xor => "xor",
            Self::Copy => "copy",
            Self::DestinationOut => "destination-out",
        }
    }
}

impl std::fmt::Display for CompositeOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CompositeOp {
    type Err = InsetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "source-over" => Ok(Self::SourceOver),
            "xor" => Ok(Self::Xor),
            "copy" => Ok(Self::Copy),
            "destination-out" => Ok(Self::DestinationOut),
            other => Err(InsetError::validation(format!(
                "unknown composite operation '{other}'"
            ))),
        }
    }
}

/// Snapshot of surface pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageRGBA {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Premultiplied RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
}

impl ImageRGBA {
    /// A fully transparent image.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    /// Wrap premultiplied bytes, checking the length against the dimensions.
    pub fn from_premul(width: u32, height: u32, data: Vec<u8>) -> InsetResult<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| InsetError::raster("image buffer size overflow"))?;
        if data.len() != expected {
            return Err(InsetError::raster(format!(
                "image byte length {} does not match {width}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Whether `data` holds exactly `width * height` pixels.
    pub fn is_well_formed(&self) -> bool {
        (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|v| v.checked_mul(4))
            .is_some_and(|len| len == self.data.len())
    }

    /// Premultiplied pixel at `(x, y)`; out-of-bounds reads are transparent.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        if x >= self.width || y >= self.height {
            return [0, 0, 0, 0];
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        match self.data.get(i..i + 4) {
            Some(&[r, g, b, a]) => [r, g, b, a],
            _ => [0, 0, 0, 0],
        }
    }

    /// Premultiply a straight-alpha image.
    pub fn from_rgba_image(img: &image::RgbaImage) -> Self {
        let mut data = Vec::with_capacity(img.as_raw().len());
        for px in img.pixels() {
            let [r, g, b, a] = px.0;
            data.extend_from_slice(&Rgba8::new(r, g, b, a).to_premul());
        }
        Self {
            width: img.width(),
            height: img.height(),
            data,
        }
    }

    /// Decode an image file (any format `image` understands).
    pub fn load(path: &Path) -> InsetResult<Self> {
        let img = image::open(path)
            .map_err(|e| InsetError::script(format!("decode image '{}': {e}", path.display())))?;
        Ok(Self::from_rgba_image(&img.to_rgba8()))
    }

    /// Straight-alpha copy suitable for encoding.
    pub fn to_rgba_image(&self) -> InsetResult<image::RgbaImage> {
        let mut straight = Vec::with_capacity(self.data.len());
        for px in self.data.chunks_exact(4) {
            let a = px[3];
            straight.extend_from_slice(&[
                unpremul(px[0], a),
                unpremul(px[1], a),
                unpremul(px[2], a),
                a,
            ]);
        }
        image::RgbaImage::from_raw(self.width, self.height, straight)
            .ok_or_else(|| InsetError::raster("image byte length mismatch"))
    }
}

pub(crate) fn premul(c: u8, a: u8) -> u8 {
    let c = u16::from(c);
    let a = u16::from(a);
    (((c * a) + 127) / 255) as u8
}

fn unpremul(c: u8, a: u8) -> u8 {
    if a == 0 {
        return 0;
    }
    let v = (u32::from(c) * 255 + u32::from(a) / 2) / u32::from(a);
    v.min(255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
