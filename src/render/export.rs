use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::Context;
use image::RgbaImage;

use crate::{
    foundation::error::{PlateError, PlateResult},
    model::Design,
    render::compose::{RenderOpts, compose},
};

pub const DEFAULT_EXPORT_FILE: &str = "plate-design.png";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
}

impl ExportFormat {
    /// Infer the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    fn image_format(self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Jpeg => image::ImageFormat::Jpeg,
        }
    }
}

/// Encode a composed design. JPEG output drops the (always opaque) alpha channel.
pub fn encode(img: &RgbaImage, format: ExportFormat) -> PlateResult<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    match format {
        ExportFormat::Png => img.write_to(&mut cursor, format.image_format())?,
        ExportFormat::Jpeg => image::DynamicImage::ImageRgba8(img.clone())
            .to_rgb8()
            .write_to(&mut cursor, format.image_format())?,
    }
    Ok(cursor.into_inner())
}

/// Outcome of [`export_design`].
#[derive(Clone, Debug)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub format: ExportFormat,
    pub width: u32,
    pub height: u32,
    pub bytes: usize,
}

pub fn write_image(img: &RgbaImage, path: &Path, format: ExportFormat) -> PlateResult<usize> {
    let bytes = encode(img, format)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, &bytes).map_err(|e| PlateError::io(path, e))?;
    Ok(bytes.len())
}

/// Settle the output format and path.
///
/// A recognised extension picks the format and must agree with an explicit one. A path
/// without an extension gets the format's extension appended (PNG unless given). Any other
/// extension is rejected so the file name never lies about its contents.
pub fn resolve_output(
    out: &Path,
    format: Option<ExportFormat>,
) -> PlateResult<(PathBuf, ExportFormat)> {
    match (format, ExportFormat::from_path(out)) {
        (Some(wanted), Some(found)) if wanted != found => Err(PlateError::validation(format!(
            "output '{}' has a .{} extension but {wanted:?} was requested",
            out.display(),
            found.extension()
        ))),
        (_, Some(found)) => Ok((out.to_path_buf(), found)),
        (format, None) if out.extension().is_none() => {
            let format = format.unwrap_or_default();
            Ok((out.with_extension(format.extension()), format))
        }
        (_, None) => Err(PlateError::validation(format!(
            "unsupported output extension in '{}' (use .png, .jpg or .jpeg)",
            out.display()
        ))),
    }
}

/// Load the design's motif, compose every plate and write the flattened raster.
///
/// Relative motif paths resolve against `base_dir`. The written path and format come from
/// [`resolve_output`] and are reported in the summary.
#[tracing::instrument(skip(design, opts), fields(plates = design.plates.len()))]
pub fn export_design(
    design: &Design,
    base_dir: &Path,
    opts: &RenderOpts,
    out: &Path,
    format: Option<ExportFormat>,
) -> PlateResult<ExportSummary> {
    design.validate()?;
    let (path, format) = resolve_output(out, format)?;

    let motif = design.motif.load(base_dir)?;
    let img = compose(&design.plates, &motif, opts)?;
    let bytes = write_image(&img, &path, format)?;

    tracing::info!(path = %path.display(), bytes, "exported design");
    Ok(ExportSummary {
        path,
        format,
        width: img.width(),
        height: img.height(),
        bytes,
    })
}

/// Render options whose scale fits the design into `max_width_px` columns.
///
/// Never scales up past `base.px_per_cm`, and never so far down that the canvas loses its
/// last pixel row or column; a tiny `max_width_px` may therefore be exceeded.
pub fn preview_opts(design: &Design, max_width_px: u32, base: RenderOpts) -> RenderOpts {
    let total = design.total_width();
    let tallest = design.max_height();
    if total <= 0.0 || tallest <= 0.0 || max_width_px == 0 {
        return base;
    }
    let fit = f64::from(max_width_px) / total;
    let floor = 1.0 / total.min(tallest);
    RenderOpts {
        px_per_cm: base.px_per_cm.min(fit).max(floor),
        ..base
    }
}
