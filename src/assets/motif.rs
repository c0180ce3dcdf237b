use std::path::{Path, PathBuf};

use base64::Engine as _;

use crate::assets::decode::{decode_image, mime_for_extension};
use crate::foundation::error::{PlateError, PlateResult};

/// Motif shown until the user picks their own.
pub const MOTIF_IMAGE_URL: &str = "https://rueckwand24.com/cdn/shop/files/Kuechenrueckwand-Kuechenrueckwand-Gruene-frische-Kraeuter-KR-000018-HB.jpg?v=1695288356&width=1200";

/// Physical width covered by one motif tile, in centimetres.
pub const MOTIF_BASE_WIDTH_CM: f64 = 300.0;

/// Where the motif image comes from.
///
/// Round-trips through a single string (`motifUrl` in the stored config) via [`MotifSource::parse`]
/// and [`MotifSource::as_uri`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum MotifSource {
    #[default]
    Default,
    Path(PathBuf),
    /// Inline `data:` URL, as produced by [`MotifSource::embed_file`].
    DataUrl(String),
    Url(String),
}

impl MotifSource {
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() || s == MOTIF_IMAGE_URL {
            return Self::Default;
        }
        if s.starts_with("data:") {
            return Self::DataUrl(s.to_string());
        }
        if s.starts_with("http://") || s.starts_with("https://") {
            return Self::Url(s.to_string());
        }
        let path = s.strip_prefix("file://").unwrap_or(s);
        Self::Path(PathBuf::from(path))
    }

    pub fn as_uri(&self) -> String {
        match self {
            Self::Default => MOTIF_IMAGE_URL.to_string(),
            Self::Path(p) => p.display().to_string(),
            Self::DataUrl(s) | Self::Url(s) => s.clone(),
        }
    }

    /// Short human-readable label; data URLs are not printed in full.
    pub fn describe(&self) -> String {
        match self {
            Self::Default => "default motif".to_string(),
            Self::Path(p) => format!("file {}", p.display()),
            Self::DataUrl(s) => {
                let header = s.split(',').next().unwrap_or("data:");
                format!("embedded image ({header}, {} bytes)", s.len())
            }
            Self::Url(u) => format!("remote {u}"),
        }
    }

    /// Read a local PNG/JPEG/WebP file and inline it as a base64 `data:` URL.
    pub fn embed_file(path: &Path) -> PlateResult<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let mime = mime_for_extension(ext).ok_or_else(|| {
            PlateError::motif(format!(
                "'{}' is not a png, jpeg or webp file",
                path.display()
            ))
        })?;
        let bytes = std::fs::read(path).map_err(|e| PlateError::io(path, e))?;
        decode_image(&bytes)?;

        let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
        Ok(Self::DataUrl(format!("data:{mime};base64,{encoded}")))
    }

    /// Fetch the raw encoded bytes. Relative paths resolve against `base_dir`.
    pub fn load_bytes(&self, base_dir: &Path) -> PlateResult<Vec<u8>> {
        match self {
            Self::Default => fetch_remote(MOTIF_IMAGE_URL),
            Self::Url(url) => fetch_remote(url),
            Self::DataUrl(s) => decode_data_url(s),
            Self::Path(p) => {
                let full = if p.is_absolute() {
                    p.clone()
                } else {
                    base_dir.join(p)
                };
                std::fs::read(&full).map_err(|e| PlateError::io(&full, e))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(source = %self.describe()))]
    pub fn load(&self, base_dir: &Path) -> PlateResult<image::RgbaImage> {
        let bytes = self.load_bytes(base_dir)?;
        decode_image(&bytes).map_err(|e| {
            PlateError::motif(format!("could not load {}: {e}", self.describe()))
        })
    }
}

fn decode_data_url(s: &str) -> PlateResult<Vec<u8>> {
    let rest = s
        .strip_prefix("data:")
        .ok_or_else(|| PlateError::motif("data URL must start with 'data:'"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| PlateError::motif("data URL has no ',' separator"))?;
    if !header.split(';').any(|p| p.eq_ignore_ascii_case("base64")) {
        return Err(PlateError::motif("only base64 data URLs are supported"));
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| PlateError::motif(format!("invalid base64 in data URL: {e}")))
}

#[cfg(feature = "remote")]
fn fetch_remote(url: &str) -> PlateResult<Vec<u8>> {
    use std::time::Duration;

    tracing::info!(url, "fetching remote motif");
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(60))
        .build()
        .map_err(|e| PlateError::motif(format!("build http client: {e}")))?;
    let response = client
        .get(url)
        .send()
        .map_err(|e| PlateError::motif(format!("fetch '{url}': {e}")))?;
    if !response.status().is_success() {
        return Err(PlateError::motif(format!(
            "fetch '{url}' returned {}; try a local image file instead",
            response.status()
        )));
    }
    let bytes = response
        .bytes()
        .map_err(|e| PlateError::motif(format!("read body of '{url}': {e}")))?;
    Ok(bytes.to_vec())
}

#[cfg(not(feature = "remote"))]
fn fetch_remote(url: &str) -> PlateResult<Vec<u8>> {
    Err(PlateError::motif(format!(
        "cannot fetch '{url}': remote motifs require the 'remote' feature; \
         use a local image file instead"
    )))
}
