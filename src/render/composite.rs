//! Straight-alpha blending onto an opaque canvas.

pub type Rgba8 = [u8; 4];

/// Blend straight-alpha `src` over an opaque `dst`. The result is always opaque.
pub fn over_opaque(dst: Rgba8, src: Rgba8) -> Rgba8 {
    let a = u16::from(src[3]);
    if a == 0 {
        return [dst[0], dst[1], dst[2], 255];
    }
    if a == 255 {
        return [src[0], src[1], src[2], 255];
    }

    let inv = 255 - a;
    let mut out = [0u8, 0, 0, 255];
    for i in 0..3 {
        let sc = u32::from(mul_div255(u16::from(src[i]), a));
        let dc = u32::from(mul_div255(u16::from(dst[i]), inv));
        out[i] = (sc + dc).min(255) as u8;
    }
    out
}

/// Blend `src` over every pixel of `img` inside the half-open rectangle `[x0, x1) x [y0, y1)`.
pub fn fill_rect_over(img: &mut image::RgbaImage, x0: u32, y0: u32, x1: u32, y1: u32, src: Rgba8) {
    let x1 = x1.min(img.width());
    let y1 = y1.min(img.height());
    for y in y0..y1 {
        for x in x0..x1 {
            let px = img.get_pixel_mut(x, y);
            px.0 = over_opaque(px.0, src);
        }
    }
}

fn mul_div255(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}
