use super::*;

#[test]
fn over_opacity_0_is_noop() {
    let dst = [1, 2, 3, 4];
    let src = [200, 200, 200, 200];
    assert_eq!(over(dst, src, 0.0), dst);
}

#[test]
fn over_src_opaque_replaces_dst() {
    let dst = [0, 0, 0, 255];
    let src = [255, 0, 0, 255];
    assert_eq!(over(dst, src, 1.0), src);
}

#[test]
fn over_dst_transparent_returns_src() {
    let dst = [0, 0, 0, 0];
    let src = [100, 110, 120, 200];
    assert_eq!(over(dst, src, 1.0), src);
}

#[test]
fn masked_over_skips_uncovered_pixels() {
    let mut dst = vec![10u8, 20, 30, 255, 10, 20, 30, 255];
    let src = vec![255u8, 255, 255, 255, 255, 255, 255, 255];
    let mask = vec![0u8, 0, 0, 0, 255, 255, 255, 255];
    over_in_place(&mut dst, &src, 1.0, Some(&mask)).unwrap();
    assert_eq!(&dst[..4], &[10, 20, 30, 255]);
    assert_eq!(&dst[4..], &[255, 255, 255, 255]);
}

#[test]
fn over_in_place_rejects_mismatched_buffers() {
    let mut dst = vec![0u8; 8];
    assert!(over_in_place(&mut dst, &[0u8; 4], 1.0, None).is_err());
    assert!(over_in_place(&mut dst, &[0u8; 8], 1.0, Some(&[0u8; 4])).is_err());
}

#[test]
fn overlay_with_zero_alpha_is_noop() {
    let dst = [40, 50, 60, 255];
    assert_eq!(overlay_gray(dst, 250, 0), dst);
}

#[test]
fn overlay_brightens_light_backdrop_and_keeps_opacity() {
    let dst = [200, 200, 200, 255];
    let out = overlay_gray(dst, 255, 10);
    assert!(out[0] >= 200);
    assert_eq!(out[3], 255);
}

#[test]
fn overlay_onto_transparent_is_plain_source() {
    let out = overlay_gray([0, 0, 0, 0], 255, 10);
    assert_eq!(out, [10, 10, 10, 10]);
}

#[test]
fn erase_clears_fully_masked_pixels_only() {
    let mut dst = vec![100u8, 100, 100, 255, 100, 100, 100, 255];
    let mask = vec![0u8, 0, 0, 255, 0, 0, 0, 0];
    erase_in_place(&mut dst, &mask).unwrap();
    assert_eq!(&dst[..4], &[0, 0, 0, 0]);
    assert_eq!(&dst[4..], &[100, 100, 100, 255]);
}

#[test]
fn overlay_noise_respects_mask() {
    let noise = NoiseTile::generate(3);
    let mut dst = vec![120u8, 120, 120, 255, 120, 120, 120, 255];
    let mask = vec![0u8, 0, 0, 0, 0, 0, 0, 255];
    overlay_noise_in_place(&mut dst, 2, 1, &noise, &mask).unwrap();
    assert_eq!(&dst[..4], &[120, 120, 120, 255]);
    assert_eq!(dst[7], 255);
}
