use crate::foundation::error::{CardError, CardResult};
use crate::render::plan::PassFx;

/// Blur parameters for a canvas-style `shadowBlur` of `blur` logical units at `scale`.
///
/// Canvas shadows use `sigma = blur / 2`; the kernel spans three sigmas.
pub fn shadow_blur_fx(blur: f64, scale: f64) -> PassFx {
    let sigma = (blur / 2.0 * scale).max(0.0);
    PassFx::Blur {
        radius_px: (sigma * 3.0).ceil() as u32,
        sigma: sigma as f32,
    }
}

pub fn blur_rgba8_premul(
    src: &[u8],
    width: u32,
    height: u32,
    radius: u32,
    sigma: f32,
) -> CardResult<Vec<u8>> {
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| CardError::render("blur buffer size overflow"))?;
    if src.len() != expected_len {
        return Err(CardError::render(
            "blur_rgba8_premul expects src matching width*height*4",
        ));
    }
    if radius == 0 || width == 0 || height == 0 {
        return Ok(src.to_vec());
    }

    let kernel = gaussian_kernel_q16(radius, sigma)?;
    let mut tmp = vec![0u8; expected_len];
    let mut out = vec![0u8; expected_len];

    // Rows, then columns.
    let row_bytes = (width as usize) * 4;
    convolve(src, &mut tmp, height, width, row_bytes, 4, &kernel);
    convolve(&tmp, &mut out, width, height, 4, row_bytes, &kernel);
    Ok(out)
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> CardResult<Vec<u32>> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(CardError::validation("blur sigma must be > 0"));
    }

    let r = radius as i32;
    let denom = 2.0 * f64::from(sigma) * f64::from(sigma);
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = f64::from(i);
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = weights_f.iter().sum();
    if sum <= 0.0 {
        return Err(CardError::render("gaussian kernel sum is zero"));
    }

    let mut weights: Vec<u32> = weights_f
        .iter()
        .map(|wf| ((wf / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();

    // Push the rounding error into the center tap so the kernel sums to exactly 1.0.
    let acc: i64 = weights.iter().map(|&w| i64::from(w)).sum();
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
    }

    Ok(weights)
}

/// One separable pass. `lines` runs across the blur axis, `len` along it; offsets are in
/// bytes. Samples past the edge clamp to the edge pixel.
fn convolve(
    src: &[u8],
    dst: &mut [u8],
    lines: u32,
    len: u32,
    line_stride: usize,
    step: usize,
    k: &[u32],
) {
    let radius = (k.len() / 2) as i64;
    let last = i64::from(len) - 1;
    for line in 0..lines as usize {
        let base = line * line_stride;
        for pos in 0..i64::from(len) {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sp = (pos + ki as i64 - radius).clamp(0, last) as usize;
                let idx = base + sp * step;
                for (c, a) in acc.iter_mut().enumerate() {
                    *a += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = base + pos as usize * step;
            for (c, a) in acc.iter().enumerate() {
                dst[out_idx + c] = q16_to_u8(*a);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    ((acc + 32768) >> 16).min(255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/render/blur.rs"]
mod tests;
