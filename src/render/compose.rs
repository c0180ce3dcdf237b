use image::{RgbaImage, imageops::FilterType};

use crate::{
    assets::motif::MOTIF_BASE_WIDTH_CM,
    foundation::error::{PlateError, PlateResult},
    model::Plate,
    render::composite::{Rgba8, fill_rect_over, over_opaque},
    render::tile::{MotifStrip, strip_width},
};

/// Largest canvas side we are willing to allocate, in pixels.
pub const MAX_CANVAS_SIDE_PX: u32 = 32_768;

pub const WHITE: Rgba8 = [255, 255, 255, 255];

/// Black at 70% opacity.
pub const DEFAULT_BORDER_RGBA: Rgba8 = [0, 0, 0, 179];

#[derive(Clone, Copy, Debug)]
pub struct RenderOpts {
    /// Output pixels per centimetre of plate.
    pub px_per_cm: f64,
    /// Border thickness drawn inside each plate; `0` disables borders.
    pub border_px: u32,
    pub border_rgba: Rgba8,
    /// Colour of canvas area not covered by any plate.
    pub background_rgba: Rgba8,
    pub filter: FilterType,
}

impl Default for RenderOpts {
    fn default() -> Self {
        Self {
            px_per_cm: 1.0,
            border_px: 1,
            border_rgba: DEFAULT_BORDER_RGBA,
            background_rgba: WHITE,
            filter: FilterType::CatmullRom,
        }
    }
}

/// Pixel rectangle occupied by one plate on the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlateRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PlateRect {
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

/// Pixel geometry of a whole design.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    pub width: u32,
    pub height: u32,
    pub tile_width: u32,
    pub strip_width: u32,
    pub plates: Vec<PlateRect>,
}

/// Compute canvas and plate rectangles.
///
/// Column edges come from the running centimetre sum so neighbouring plates share an edge.
/// Each plate is centred vertically against the tallest plate.
pub fn layout(plates: &[Plate], opts: &RenderOpts) -> PlateResult<Layout> {
    let scale = opts.px_per_cm;
    if !scale.is_finite() || scale <= 0.0 {
        return Err(PlateError::render(format!(
            "px_per_cm must be a positive number, got {scale}"
        )));
    }
    for p in plates {
        if !(p.width.is_finite() && p.height.is_finite()) || p.width < 0.0 || p.height < 0.0 {
            return Err(PlateError::validation(format!(
                "plate '{}' has invalid size {} x {}",
                p.id, p.width, p.height
            )));
        }
    }

    let total_cm: f64 = plates.iter().map(|p| p.width).sum();
    let max_h_cm = plates.iter().map(|p| p.height).fold(0.0, f64::max);
    let width = to_px(total_cm * scale)?;
    let height = to_px(max_h_cm * scale)?;
    if width == 0 || height == 0 {
        return Err(PlateError::render("cannot export an empty design"));
    }

    let mut rects = Vec::with_capacity(plates.len());
    let mut acc_cm = 0.0;
    for p in plates {
        let x0 = to_px(acc_cm * scale)?;
        acc_cm += p.width;
        let x1 = to_px(acc_cm * scale)?.min(width);
        let h = to_px(p.height * scale)?.min(height);
        rects.push(PlateRect {
            x: x0,
            y: (height - h) / 2,
            width: x1.saturating_sub(x0),
            height: h,
        });
    }

    // The tile may be wider than any canvas; only the visible part of it is ever built.
    let tile_width = (MOTIF_BASE_WIDTH_CM * scale)
        .round()
        .clamp(1.0, f64::from(u32::MAX)) as u32;
    Ok(Layout {
        width,
        height,
        tile_width,
        strip_width: strip_width(width, tile_width),
        plates: rects,
    })
}

fn to_px(v: f64) -> PlateResult<u32> {
    let px = v.round();
    if px > f64::from(MAX_CANVAS_SIDE_PX) {
        return Err(PlateError::render(format!(
            "canvas side of {px} px exceeds the {MAX_CANVAS_SIDE_PX} px limit; lower the scale"
        )));
    }
    Ok(px.max(0.0) as u32)
}

/// Render plates side by side, each showing its slice of the mirrored motif strip.
///
/// Canvas area outside every plate keeps `opts.background_rgba`; transparent motif pixels
/// show the background through. The result is fully opaque.
#[tracing::instrument(skip_all, fields(plates = plates.len(), px_per_cm = opts.px_per_cm))]
pub fn compose(plates: &[Plate], motif: &RgbaImage, opts: &RenderOpts) -> PlateResult<RgbaImage> {
    let layout = layout(plates, opts)?;
    tracing::debug!(
        width = layout.width,
        height = layout.height,
        tile_width = layout.tile_width,
        strip_width = layout.strip_width,
        "layout"
    );

    let strip = MotifStrip::new(
        motif,
        layout.tile_width,
        layout.height,
        layout.width,
        opts.filter,
    )?;
    let bg = [
        opts.background_rgba[0],
        opts.background_rgba[1],
        opts.background_rgba[2],
        255,
    ];
    let mut canvas = RgbaImage::from_pixel(layout.width, layout.height, image::Rgba(bg));

    for rect in &layout.plates {
        for y in rect.y..rect.bottom() {
            for x in rect.x..rect.right() {
                canvas.put_pixel(x, y, image::Rgba(over_opaque(bg, strip.pixel(x, y))));
            }
        }
    }

    if opts.border_px > 0 {
        for rect in &layout.plates {
            draw_inner_border(&mut canvas, rect, opts.border_px, opts.border_rgba);
        }
    }

    tracing::info!(
        width = layout.width,
        height = layout.height,
        "composed plate design"
    );
    Ok(canvas)
}

/// Stroke `thickness` pixels along the inside of `rect`. Corners are blended once.
fn draw_inner_border(canvas: &mut RgbaImage, rect: &PlateRect, thickness: u32, rgba: Rgba8) {
    if rect.width == 0 || rect.height == 0 {
        return;
    }
    let t_y = thickness.min(rect.height);
    let t_x = thickness.min(rect.width);

    // top and bottom bands span the full width
    fill_rect_over(canvas, rect.x, rect.y, rect.right(), rect.y + t_y, rgba);
    let bottom_start = rect.bottom().saturating_sub(t_y).max(rect.y + t_y);
    fill_rect_over(canvas, rect.x, bottom_start, rect.right(), rect.bottom(), rgba);

    // left and right bands between them
    let (mid0, mid1) = (rect.y + t_y, bottom_start);
    fill_rect_over(canvas, rect.x, mid0, rect.x + t_x, mid1, rgba);
    let right_start = rect.right().saturating_sub(t_x).max(rect.x + t_x);
    fill_rect_over(canvas, right_start, mid0, rect.right(), mid1, rgba);
}
