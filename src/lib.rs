//! Inset shadows for 2D raster surfaces.
//!
//! Canvas-style drawing APIs only cast drop shadows outward from a shape. This crate
//! wraps any [`RasterSurface`] in an [`InsetCanvas`] whose fills, when inset mode is on,
//! cast their shadow *inward*, as if the shape were a hole cut into the surface. The
//! effect is composited purely from the host's own operations (drop shadows,
//! exclusive-or compositing and image draws) on a private scratch surface.
//!
//! # Pieces
//!
//! - [`RasterSurface`]: the host drawing contract the technique is built on.
//! - [`CpuCanvas`]: a software host backed by `vello_cpu`, premultiplied RGBA8.
//! - [`InsetCanvas`]: the decorating wrapper with an explicit inset mode flag.
//! - [`inset_fill`] / [`pass_through`]: the compositing sequence itself, usable with a
//!   caller-owned [`ScratchSurface`].
//! - [`DrawScript`]: a JSON list of drawing calls, rendered by the `inset` binary.
//!
//! `unsafe` is forbidden in this crate.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;
mod inset;
mod render;
mod script;
mod surface;

pub use foundation::core::{
    Affine, BezPath, CompositeOp, ImageRGBA, Point, Rect, Rgba8, ShadowProps, Vec2,
};
pub use foundation::error::{InsetError, InsetResult};
pub use foundation::settings::{BufferPolicy, InsetSettings};
pub use inset::canvas::InsetCanvas;
pub use inset::compositor::{inset_fill, pass_through};
pub use inset::scratch::{ScratchSurface, resize, scratch_dims};
pub use inset::shadow::swap_shadows;
pub use render::cpu::CpuCanvas;
pub use script::{CanvasSize, DrawCmd, DrawScript};
pub use surface::RasterSurface;
