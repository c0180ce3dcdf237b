//! Plategen lays out a row of rectangular wall plates, fills them with a repeating motif whose
//! every other tile is mirrored, and flattens the result into a single raster.
//!
//! - Build or load a [`Design`] (plates in centimetres, display [`Unit`], [`MotifSource`])
//! - Render it with [`compose`] or write it to disk with [`export_design`]
//! - Persist it between runs with [`ConfigStore`]
#![forbid(unsafe_code)]

pub mod assets;
pub mod foundation;
pub mod model;
pub mod render;
pub mod store;

pub use assets::{MOTIF_BASE_WIDTH_CM, MOTIF_IMAGE_URL, MotifSource, decode_image};
pub use foundation::error::{PlateError, PlateResult};
pub use foundation::units::{INCH_TO_CM, Unit, format_value, parse_dimension};
pub use model::{Design, MAX_PLATES, MIN_PLATES, Plate, PlateDimension};
pub use render::{
    DEFAULT_EXPORT_FILE, ExportFormat, ExportSummary, Layout, PlateRect, RenderOpts, compose,
    encode, export_design, layout, preview_opts, resolve_output, write_image,
};
pub use store::{ConfigStore, STORAGE_KEY, StoredConfig};
