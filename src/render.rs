pub mod composite;
pub mod compose;
pub mod export;
pub mod tile;

pub use compose::{Layout, PlateRect, RenderOpts, compose, layout};
pub use export::{
    DEFAULT_EXPORT_FILE, ExportFormat, ExportSummary, encode, export_design, preview_opts,
    resolve_output, write_image,
};
