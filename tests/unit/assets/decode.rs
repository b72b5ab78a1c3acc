use std::io::Cursor;

use super::*;

fn png_bytes(img: image::RgbaImage) -> Vec<u8> {
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decode_portrait_png_dimensions_and_premul() {
    let img = image::RgbaImage::from_raw(1, 1, vec![100u8, 50u8, 200u8, 128u8]).unwrap();
    let portrait = decode_portrait(&png_bytes(img), 0).unwrap();
    assert_eq!((portrait.width, portrait.height), (1, 1));
    assert_eq!(portrait.pixels.as_raw().as_slice(), &[100, 50, 200, 128]);
    assert_eq!(
        portrait.rgba8_premul(),
        vec![
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128u8
        ]
    );
}

#[test]
fn decode_rejects_garbage() {
    let err = decode_portrait(b"definitely not an image", 0).unwrap_err();
    assert!(matches!(err, CardError::Decode(_)));
}

#[test]
fn edges_beyond_pixmap_limit_are_decode_errors() {
    let wide = image::RgbaImage::from_pixel(MAX_PORTRAIT_EDGE + 1, 1, image::Rgba([0, 0, 0, 255]));
    let err = PortraitImage::from_rgba(wide, 0).unwrap_err();
    assert!(matches!(err, CardError::Decode(_)));

    let edge = image::RgbaImage::from_pixel(MAX_PORTRAIT_EDGE, 1, image::Rgba([0, 0, 0, 255]));
    assert!(PortraitImage::from_rgba(edge, 0).is_ok());
}

#[test]
fn repeated_uploads_get_distinct_ids() {
    let bytes = png_bytes(image::RgbaImage::from_pixel(2, 2, image::Rgba([1, 2, 3, 255])));
    let a = decode_portrait(&bytes, 1).unwrap();
    let b = decode_portrait(&bytes, 2).unwrap();
    assert_ne!(a.id, b.id);
}

#[test]
fn fully_transparent_pixels_premultiply_to_zero() {
    let mut px = vec![200u8, 100, 50, 0];
    premultiply_rgba8_in_place(&mut px);
    assert_eq!(px, vec![0, 0, 0, 0]);
}
