use std::collections::BTreeSet;

use crate::{
    assets::motif::MotifSource,
    foundation::error::{PlateError, PlateResult},
    foundation::units::Unit,
};

pub const MIN_PLATES: usize = 1;
pub const MAX_PLATES: usize = 10;

pub const WIDTH_MIN_CM: f64 = 20.0;
pub const WIDTH_MAX_CM: f64 = 300.0;
pub const HEIGHT_MIN_CM: f64 = 30.0;
pub const HEIGHT_MAX_CM: f64 = 128.0;

pub const DEFAULT_WIDTH_CM: f64 = 100.0;
pub const DEFAULT_HEIGHT_CM: f64 = 60.0;

/// One rectangular wall plate. Dimensions are centimetres.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Plate {
    pub id: String,
    pub width: f64,
    pub height: f64,
}

impl Plate {
    pub fn new(id: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            width,
            height,
        }
    }

    pub fn with_default_size(id: impl Into<String>) -> Self {
        Self::new(id, DEFAULT_WIDTH_CM, DEFAULT_HEIGHT_CM)
    }

    pub fn get(&self, dim: PlateDimension) -> f64 {
        match dim {
            PlateDimension::Width => self.width,
            PlateDimension::Height => self.height,
        }
    }

    pub fn validate(&self) -> PlateResult<()> {
        for dim in [PlateDimension::Width, PlateDimension::Height] {
            dim.check(self.get(dim)).map_err(|e| {
                PlateError::validation(format!("plate '{}': {e}", self.id))
            })?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlateDimension {
    Width,
    Height,
}

impl PlateDimension {
    /// Inclusive `(min, max)` in centimetres.
    pub fn limits_cm(self) -> (f64, f64) {
        match self {
            PlateDimension::Width => (WIDTH_MIN_CM, WIDTH_MAX_CM),
            PlateDimension::Height => (HEIGHT_MIN_CM, HEIGHT_MAX_CM),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PlateDimension::Width => "width",
            PlateDimension::Height => "height",
        }
    }

    fn check(self, cm: f64) -> PlateResult<()> {
        let (min, max) = self.limits_cm();
        if !cm.is_finite() || cm < min || cm > max {
            return Err(PlateError::validation(format!(
                "{} {cm} cm is outside {min}..={max} cm",
                self.label()
            )));
        }
        Ok(())
    }
}

/// The whole configuration: an ordered row of plates, the display unit and the motif.
#[derive(Clone, Debug, PartialEq)]
pub struct Design {
    pub plates: Vec<Plate>,
    pub unit: Unit,
    pub motif: MotifSource,
}

impl Default for Design {
    fn default() -> Self {
        Self {
            plates: vec![Plate::with_default_size(fresh_id(&[]))],
            unit: Unit::Cm,
            motif: MotifSource::default(),
        }
    }
}

impl Design {
    /// Append a default-sized plate. Returns `None` when the row is already full.
    pub fn add_plate(&mut self) -> Option<&Plate> {
        if self.plates.len() >= MAX_PLATES {
            return None;
        }
        let id = fresh_id(&self.plates);
        self.plates.push(Plate::with_default_size(id));
        self.plates.last()
    }

    /// Remove a plate by id. Returns `false` when removal would go below the minimum count.
    pub fn remove_plate(&mut self, id: &str) -> PlateResult<bool> {
        let idx = self.index_of(id)?;
        if self.plates.len() <= MIN_PLATES {
            return Ok(false);
        }
        self.plates.remove(idx);
        Ok(true)
    }

    pub fn update_dimension(&mut self, id: &str, dim: PlateDimension, cm: f64) -> PlateResult<()> {
        dim.check(cm)?;
        let idx = self.index_of(id)?;
        let plate = &mut self.plates[idx];
        match dim {
            PlateDimension::Width => plate.width = cm,
            PlateDimension::Height => plate.height = cm,
        }
        Ok(())
    }

    /// Move the plate at `from` so it ends up at index `to`.
    pub fn reorder(&mut self, from: usize, to: usize) -> PlateResult<()> {
        let len = self.plates.len();
        if from >= len || to >= len {
            return Err(PlateError::validation(format!(
                "reorder {from} -> {to} out of range for {len} plates"
            )));
        }
        let plate = self.plates.remove(from);
        self.plates.insert(to, plate);
        Ok(())
    }

    pub fn index_of(&self, id: &str) -> PlateResult<usize> {
        self.plates
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| PlateError::validation(format!("no plate with id '{id}'")))
    }

    /// Resolve a plate selector: `#N` is a 1-based position, anything else an id.
    pub fn locate(&self, selector: &str) -> PlateResult<usize> {
        let selector = selector.trim();
        if let Some(pos) = selector.strip_prefix('#') {
            let n: usize = pos
                .parse()
                .map_err(|_| PlateError::validation(format!("bad plate position '{selector}'")))?;
            if n == 0 || n > self.plates.len() {
                return Err(PlateError::validation(format!(
                    "plate position {n} out of range (1..={})",
                    self.plates.len()
                )));
            }
            return Ok(n - 1);
        }
        self.index_of(selector)
    }

    pub fn total_width(&self) -> f64 {
        self.plates.iter().map(|p| p.width).sum()
    }

    pub fn max_height(&self) -> f64 {
        self.plates.iter().map(|p| p.height).fold(0.0, f64::max)
    }

    pub fn validate(&self) -> PlateResult<()> {
        let n = self.plates.len();
        if !(MIN_PLATES..=MAX_PLATES).contains(&n) {
            return Err(PlateError::validation(format!(
                "design must have {MIN_PLATES}..={MAX_PLATES} plates, has {n}"
            )));
        }
        let mut seen = BTreeSet::new();
        for plate in &self.plates {
            if !seen.insert(plate.id.as_str()) {
                return Err(PlateError::validation(format!(
                    "duplicate plate id '{}'",
                    plate.id
                )));
            }
            plate.validate()?;
        }
        Ok(())
    }
}

fn fresh_id(existing: &[Plate]) -> String {
    loop {
        let id = uuid::Uuid::new_v4().simple().to_string()[..8].to_string();
        if existing.iter().all(|p| p.id != id) {
            return id;
        }
    }
}
