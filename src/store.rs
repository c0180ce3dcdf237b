use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::{
    assets::motif::MotifSource,
    foundation::error::{PlateError, PlateResult},
    foundation::units::Unit,
    model::{Design, Plate},
};

/// Storage key of the persisted configuration; also the file stem on disk.
pub const STORAGE_KEY: &str = "plateGeneratorConfig_v2";

/// On-disk JSON shape.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredConfig {
    #[serde(default)]
    pub plates: Vec<Plate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<Unit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motif_url: Option<String>,
}

impl From<&Design> for StoredConfig {
    fn from(d: &Design) -> Self {
        Self {
            plates: d.plates.clone(),
            unit: Some(d.unit),
            motif_url: Some(d.motif.as_uri()),
        }
    }
}

impl StoredConfig {
    /// `None` when the document holds no plates.
    pub fn into_design(self) -> Option<Design> {
        if self.plates.is_empty() {
            return None;
        }
        Some(Design {
            plates: self.plates,
            unit: self.unit.unwrap_or_default(),
            motif: self
                .motif_url
                .as_deref()
                .map(MotifSource::parse)
                .unwrap_or_default(),
        })
    }
}

/// JSON file holding the current design.
#[derive(Clone, Debug)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/plategen/plateGeneratorConfig_v2.json`.
    pub fn default_path() -> PlateResult<PathBuf> {
        let dir = dirs::config_dir().ok_or_else(|| {
            PlateError::validation("could not determine the user config directory")
        })?;
        Ok(dir.join("plategen").join(format!("{STORAGE_KEY}.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored design. `Ok(None)` when there is no file or it lists no plates.
    pub fn try_load(&self) -> PlateResult<Option<Design>> {
        let f = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(PlateError::io(&self.path, e)),
        };
        let stored: StoredConfig = serde_json::from_reader(BufReader::new(f)).map_err(|e| {
            PlateError::serde(format!("parse config '{}': {e}", self.path.display()))
        })?;
        Ok(stored.into_design())
    }

    /// Like [`ConfigStore::try_load`] but falls back to the default design on any failure.
    pub fn load(&self) -> Design {
        match self.try_load() {
            Ok(Some(design)) => design,
            Ok(None) => {
                tracing::debug!(path = %self.path.display(), "no stored design, using default");
                Design::default()
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to load stored design, using default"
                );
                Design::default()
            }
        }
    }

    /// Write the design, replacing the file atomically.
    pub fn save(&self, design: &Design) -> PlateResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create config dir '{}'", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(&StoredConfig::from(design))
            .map_err(|e| PlateError::serde(format!("serialize config: {e}")))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, json).map_err(|e| PlateError::io(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| PlateError::io(&self.path, e))?;

        tracing::debug!(path = %self.path.display(), plates = design.plates.len(), "saved design");
        Ok(())
    }

    pub fn clear(&self) -> PlateResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PlateError::io(&self.path, e)),
        }
    }
}
