use crate::foundation::core::CompositeOp;
use crate::foundation::error::{InsetError, InsetResult};

pub type PremulRgba8 = [u8; 4];

pub fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    let sa = src[3];
    if sa == 0 {
        return dst;
    }
    if sa == 255 {
        return src;
    }

    let inv = 255u16 - u16::from(sa);
    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = add_sat_u8(src[i], mul_div255(u16::from(dst[i]), inv));
    }
    out
}

// Dca' = Sca.(1 - Da) + Dca.(1 - Sa)
pub fn xor(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    let inv_sa = 255u16 - u16::from(src[3]);
    let inv_da = 255u16 - u16::from(dst[3]);
    let mut out = [0u8; 4];
    for i in 0..4 {
        let sc = mul_div255(u16::from(src[i]), inv_da);
        let dc = mul_div255(u16::from(dst[i]), inv_sa);
        out[i] = add_sat_u8(sc, dc);
    }
    out
}

pub fn destination_out(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    let inv_sa = 255u16 - u16::from(src[3]);
    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = mul_div255(u16::from(dst[i]), inv_sa);
    }
    out
}

pub fn blend(dst: PremulRgba8, src: PremulRgba8, op: CompositeOp) -> PremulRgba8 {
    match op {
        CompositeOp::SourceOver => over(dst, src),
        CompositeOp::Xor => xor(dst, src),
        CompositeOp::Copy => src,
        CompositeOp::DestinationOut => destination_out(dst, src),
    }
}

/// Composite a full-surface layer onto `dst` with `op`.
pub fn composite_in_place(dst: &mut [u8], src: &[u8], op: CompositeOp) -> InsetResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(InsetError::raster(
            "composite_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = blend([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], op);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// `src` over `backdrop`, written back into `src`. Used to merge a shape with its shadow.
pub fn under_in_place(src: &mut [u8], backdrop: &[u8]) -> InsetResult<()> {
    if src.len() != backdrop.len() || !src.len().is_multiple_of(4) {
        return Err(InsetError::raster(
            "under_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (s, b) in src.chunks_exact_mut(4).zip(backdrop.chunks_exact(4)) {
        let out = over([b[0], b[1], b[2], b[3]], [s[0], s[1], s[2], s[3]]);
        s.copy_from_slice(&out);
    }
    Ok(())
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

fn add_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
