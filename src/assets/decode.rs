use anyhow::Context;

use crate::foundation::error::{PlateError, PlateResult};

/// Decode PNG/JPEG/WebP bytes into straight-alpha RGBA8.
pub fn decode_image(bytes: &[u8]) -> PlateResult<image::RgbaImage> {
    let format = image::guess_format(bytes).context("detect motif image format")?;
    if !matches!(
        format,
        image::ImageFormat::Png | image::ImageFormat::Jpeg | image::ImageFormat::WebP
    ) {
        return Err(PlateError::motif(format!(
            "unsupported motif format {format:?} (expected png, jpeg or webp)"
        )));
    }

    let dyn_img =
        image::load_from_memory_with_format(bytes, format).context("decode motif image")?;
    let rgba = dyn_img.to_rgba8();
    if rgba.width() == 0 || rgba.height() == 0 {
        return Err(PlateError::motif("motif image has zero size"));
    }

    tracing::debug!(
        ?format,
        width = rgba.width(),
        height = rgba.height(),
        "decoded motif"
    );
    Ok(rgba)
}

/// MIME type for an image file extension accepted as a motif upload.
pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn encode(img: image::RgbaImage, format: image::ImageFormat) -> Vec<u8> {
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), format)
            .unwrap();
        buf
    }

    #[test]
    fn decode_png_keeps_straight_alpha() {
        let img = image::RgbaImage::from_raw(1, 1, vec![100, 50, 200, 128]).unwrap();
        let decoded = decode_image(&encode(img, image::ImageFormat::Png)).unwrap();
        assert_eq!(decoded.dimensions(), (1, 1));
        assert_eq!(decoded.as_raw().as_slice(), &[100, 50, 200, 128]);
    }

    #[test]
    fn decode_jpeg_is_opaque() {
        let img = image::RgbImage::from_pixel(16, 8, image::Rgb([40, 160, 90]));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Jpeg)
            .unwrap();

        let decoded = decode_image(&buf).unwrap();
        assert_eq!(decoded.dimensions(), (16, 8));
        let px = decoded.get_pixel(8, 4).0;
        assert_eq!(px[3], 255);
        // lossy, but a flat colour stays close
        for (got, want) in px[..3].iter().zip([40u8, 160, 90]) {
            assert!(got.abs_diff(want) <= 8, "{px:?}");
        }
    }

    #[test]
    fn decode_webp_keeps_pixels() {
        let img = image::RgbaImage::from_fn(3, 2, |x, y| {
            image::Rgba([(x * 80) as u8, (y * 100) as u8, 30, if x == 0 { 64 } else { 255 }])
        });
        let decoded = decode_image(&encode(img.clone(), image::ImageFormat::WebP)).unwrap();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.as_raw(), img.as_raw());
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode_image(b"definitely not an image").is_err());
    }

    #[test]
    fn mime_lookup() {
        assert_eq!(mime_for_extension("JPG"), Some("image/jpeg"));
        assert_eq!(mime_for_extension("webp"), Some("image/webp"));
        assert_eq!(mime_for_extension("gif"), None);
    }
}
