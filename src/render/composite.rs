use crate::foundation::error::{CardError, CardResult};
use crate::foundation::math::mul_div255_u8;
use crate::render::noise::NoiseTile;

pub type PremulRgba8 = [u8; 4];

pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255_u8(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255_u8(u16::from(dst[3]), inv));

    for i in 0..3 {
        let sc = mul_div255_u8(u16::from(src[i]), op);
        let dc = mul_div255_u8(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

/// Scale every channel of a premultiplied pixel by `coverage / 255`.
pub fn scale(px: PremulRgba8, coverage: u8) -> PremulRgba8 {
    match coverage {
        255 => px,
        0 => [0; 4],
        c => px.map(|v| mul_div255_u8(u16::from(v), u16::from(c))),
    }
}

/// W3C `overlay` of a straight gray source over a premultiplied backdrop, then
/// source-over compositing with source alpha `sa`.
pub fn overlay_gray(dst: PremulRgba8, luma: u8, sa: u8) -> PremulRgba8 {
    if sa == 0 {
        return dst;
    }
    let as_ = f32::from(sa) / 255.0;
    let ab = f32::from(dst[3]) / 255.0;
    let cs = f32::from(luma) / 255.0;

    let mut out = [0u8; 4];
    for i in 0..3 {
        let cb_premul = f32::from(dst[i]) / 255.0;
        let cb = if ab > 0.0 { (cb_premul / ab).min(1.0) } else { 0.0 };
        let blended = if cb <= 0.5 {
            2.0 * cs * cb
        } else {
            1.0 - 2.0 * (1.0 - cs) * (1.0 - cb)
        };
        let co = as_ * cs * (1.0 - ab) + cb_premul * (1.0 - as_) + as_ * ab * blended;
        out[i] = to_u8(co);
    }
    out[3] = to_u8(as_ + ab * (1.0 - as_));
    out
}

/// Destination-out: keep the part of `dst` not covered by `mask_alpha`.
pub fn erase(dst: PremulRgba8, mask_alpha: u8) -> PremulRgba8 {
    scale(dst, 255 - mask_alpha)
}

pub fn over_in_place(
    dst: &mut [u8],
    src: &[u8],
    opacity: f32,
    mask: Option<&[u8]>,
) -> CardResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(CardError::render(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    if let Some(m) = mask
        && m.len() != dst.len()
    {
        return Err(CardError::render("over_in_place mask length mismatch"));
    }

    for (i, (d, s)) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)).enumerate() {
        let mut s = [s[0], s[1], s[2], s[3]];
        if let Some(m) = mask {
            s = scale(s, m[i * 4 + 3]);
        }
        let out = over([d[0], d[1], d[2], d[3]], s, opacity);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Overlay-blend `noise`, tiled from the device origin, wherever `mask` has coverage.
pub fn overlay_noise_in_place(
    dst: &mut [u8],
    width: u32,
    height: u32,
    noise: &NoiseTile,
    mask: &[u8],
) -> CardResult<()> {
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| CardError::render("overlay buffer size overflow"))?;
    if dst.len() != expected_len || mask.len() != expected_len {
        return Err(CardError::render(
            "overlay_noise_in_place expects buffers matching width*height*4",
        ));
    }

    for y in 0..height {
        for x in 0..width {
            let idx = ((y * width + x) as usize) * 4;
            let coverage = mask[idx + 3];
            if coverage == 0 {
                continue;
            }
            let sa = mul_div255_u8(u16::from(noise.alpha()), u16::from(coverage));
            let d = &mut dst[idx..idx + 4];
            let out = overlay_gray([d[0], d[1], d[2], d[3]], noise.luma_at(x, y), sa);
            d.copy_from_slice(&out);
        }
    }
    Ok(())
}

pub fn erase_in_place(dst: &mut [u8], mask: &[u8]) -> CardResult<()> {
    if dst.len() != mask.len() || !dst.len().is_multiple_of(4) {
        return Err(CardError::render(
            "erase_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, m) in dst.chunks_exact_mut(4).zip(mask.chunks_exact(4)) {
        let out = erase([d[0], d[1], d[2], d[3]], m[3]);
        d.copy_from_slice(&out);
    }
    Ok(())
}

fn to_u8(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
