use crate::foundation::error::{InsetError, InsetResult};

/// Kernel radius covering three standard deviations.
pub fn radius_for_sigma(sigma: f32) -> u32 {
    if !sigma.is_finite() || sigma <= 0.0 {
        return 0;
    }
    (sigma * 3.0).ceil() as u32
}

/// Separable Gaussian blur of a single 8-bit plane. Samples outside the plane are zero.
pub fn blur_alpha8(
    src: &[u8],
    width: u32,
    height: u32,
    radius: u32,
    sigma: f32,
) -> InsetResult<Vec<u8>> {
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| InsetError::raster("blur buffer size overflow"))?;
    if src.len() != expected_len {
        return Err(InsetError::raster(
            "blur_alpha8 expects src matching width*height",
        ));
    }
    if radius == 0 || expected_len == 0 {
        return Ok(src.to_vec());
    }

    let kernel = gaussian_kernel_q16(radius, sigma)?;
    let mut tmp = vec![0u8; expected_len];
    let mut out = vec![0u8; expected_len];

    horizontal_pass(src, &mut tmp, width, height, &kernel);
    vertical_pass(&tmp, &mut out, width, height, &kernel);
    Ok(out)
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> InsetResult<Vec<u32>> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(InsetError::validation("blur sigma must be > 0"));
    }

    let r = radius as i32;
    let mut weights_f = Vec::<f64>::with_capacity((2 * r + 1) as usize);
    let mut sum = 0.0f64;
    let sigma = sigma as f64;
    let denom = 2.0 * sigma * sigma;
    for i in -r..=r {
        let x = i as f64;
        let w = (-x * x / denom).exp();
        weights_f.push(w);
        sum += w;
    }
    if sum <= 0.0 {
        return Err(InsetError::raster("gaussian kernel sum is zero"));
    }

    let mut weights = Vec::<u32>::with_capacity(weights_f.len());
    let mut acc: i64 = 0;
    for &wf in &weights_f {
        let q = ((wf / sum) * 65536.0).round() as i64;
        let q = q.clamp(0, 65536);
        weights.push(q as u32);
        acc += q;
    }
    // Fold the rounding residue into the center tap so the kernel sums to exactly 1.0.
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        let new_mid = (i64::from(weights[mid]) + delta).clamp(0, 65536);
        weights[mid] = new_mid as u32;
    }

    Ok(weights)
}

fn horizontal_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i64;
    let w = width as usize;
    for y in 0..height as usize {
        let row = &src[y * w..(y + 1) * w];
        for x in 0..w {
            let lo = (x as i64 - radius).max(0) as usize;
            let hi = (x as i64 + radius).min(w as i64 - 1) as usize;
            let mut acc = 0u64;
            for (sx, &v) in row.iter().enumerate().take(hi + 1).skip(lo) {
                if v != 0 {
                    let ki = (sx as i64 - x as i64 + radius) as usize;
                    acc += u64::from(k[ki]) * u64::from(v);
                }
            }
            dst[y * w + x] = q16_to_u8(acc);
        }
    }
}

fn vertical_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i64;
    let w = width as usize;
    let h = height as usize;
    for y in 0..h {
        let lo = (y as i64 - radius).max(0) as usize;
        let hi = (y as i64 + radius).min(h as i64 - 1) as usize;
        for x in 0..w {
            let mut acc = 0u64;
            for sy in lo..=hi {
                let v = src[sy * w + x];
                if v != 0 {
                    let ki = (sy as i64 - y as i64 + radius) as usize;
                    acc += u64::from(k[ki]) * u64::from(v);
                }
            }
            dst[y * w + x] = q16_to_u8(acc);
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    let v = (acc + 32768) >> 16;
    (v.min(255)) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/render/blur.rs"]
mod tests;
