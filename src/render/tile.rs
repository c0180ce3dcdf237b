use image::{RgbaImage, imageops};

use crate::foundation::error::{PlateError, PlateResult};

/// Source rectangle `(x, y, width, height)` in motif pixels.
pub type CropRect = (u32, u32, u32, u32);

/// Centred crop of a `src_w x src_h` image matching the aspect ratio of a
/// `tile_w x tile_h` tile, so the tile is covered without distortion.
pub fn cover_crop(src_w: u32, src_h: u32, tile_w: u32, tile_h: u32) -> CropRect {
    let img_ratio = f64::from(src_w) / f64::from(src_h);
    let tile_ratio = f64::from(tile_w) / f64::from(tile_h);

    if img_ratio > tile_ratio {
        let w = ((f64::from(src_h) * tile_ratio).round() as u32).clamp(1, src_w);
        ((src_w - w) / 2, 0, w, src_h)
    } else {
        let h = ((f64::from(src_w) / tile_ratio).round() as u32).clamp(1, src_h);
        (0, (src_h - h) / 2, src_w, h)
    }
}

/// An endless horizontal strip of motif tiles where every odd tile is mirrored.
///
/// At most two tiles are materialised; [`MotifStrip::pixel`] maps strip columns onto them.
/// When the visible width fits inside the first tile only that many columns are built and
/// the mirrored tile is skipped.
#[derive(Clone, Debug)]
pub struct MotifStrip {
    tile_w: u32,
    tile: RgbaImage,
    mirrored: Option<RgbaImage>,
}

impl MotifStrip {
    pub fn new(
        motif: &RgbaImage,
        tile_w: u32,
        tile_h: u32,
        visible_w: u32,
        filter: imageops::FilterType,
    ) -> PlateResult<Self> {
        if motif.width() == 0 || motif.height() == 0 {
            return Err(PlateError::render("motif image is empty"));
        }
        if tile_w == 0 || tile_h == 0 || visible_w == 0 {
            return Err(PlateError::render("motif tile must be at least 1x1 px"));
        }

        let (sx, sy, sw, sh) = cover_crop(motif.width(), motif.height(), tile_w, tile_h);
        let built_w = tile_w.min(visible_w);
        let sw = if built_w < tile_w {
            let frac = f64::from(built_w) / f64::from(tile_w);
            ((f64::from(sw) * frac).round() as u32).clamp(1, sw)
        } else {
            sw
        };
        tracing::debug!(sx, sy, sw, sh, tile_w, built_w, tile_h, "motif tile crop");

        let cropped = imageops::crop_imm(motif, sx, sy, sw, sh).to_image();
        let tile = if (sw, sh) == (built_w, tile_h) {
            cropped
        } else {
            imageops::resize(&cropped, built_w, tile_h, filter)
        };
        let mirrored = (built_w == tile_w).then(|| imageops::flip_horizontal(&tile));

        Ok(Self {
            tile_w,
            tile,
            mirrored,
        })
    }

    pub fn tile_width(&self) -> u32 {
        self.tile_w
    }

    /// Number of strip columns that can be sampled.
    pub fn built_width(&self) -> u32 {
        if self.mirrored.is_some() {
            u32::MAX
        } else {
            self.tile.width()
        }
    }

    pub fn height(&self) -> u32 {
        self.tile.height()
    }

    /// Tile index covering strip column `x`.
    pub fn tile_index(&self, x: u32) -> u32 {
        x / self.tile_w
    }

    /// Pixel at strip column `x`, row `y`. `x` must be below [`MotifStrip::built_width`] and
    /// `y` below [`MotifStrip::height`].
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let local = x % self.tile_w;
        let src = match &self.mirrored {
            Some(m) if self.tile_index(x) % 2 == 1 => m,
            _ => &self.tile,
        };
        src.get_pixel(local, y).0
    }
}

/// Width of the materialised background: whole tiles covering `canvas_w`, never less than one.
pub fn strip_width(canvas_w: u32, tile_w: u32) -> u32 {
    if canvas_w > tile_w {
        canvas_w.div_ceil(tile_w) * tile_w
    } else {
        tile_w
    }
}
