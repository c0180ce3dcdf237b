pub mod decode;
pub mod motif;

pub use decode::decode_image;
pub use motif::{MOTIF_BASE_WIDTH_CM, MOTIF_IMAGE_URL, MotifSource};
