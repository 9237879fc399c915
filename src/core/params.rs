use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Viewshed computation parameters suitable for config files and CLI presets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewshedConfig {
    /// Full-confidence radius, terrain units
    pub b1: f64,
    /// Sensor height above ground, terrain units
    pub observer_height: f64,
    /// Hard radius; cells farther than this are nodata. None means unbounded
    pub max_distance: Option<f64>,
    /// Scale factor on the resolvable distance, calibrated at 1
    pub visual_arc: f64,
    /// Object-width to resolvable-distance ratio
    pub distance_multiplier: f64,
    /// If true, the first failed feature aborts the batch
    pub strict: bool,
    /// Per-feature visibility engine timeout
    pub engine_timeout_secs: Option<u64>,
    /// Worker threads for cross-feature parallelism; None uses the rayon default
    pub jobs: Option<usize>,
    /// Attribute holding the feature identifier
    pub id_field: String,
    /// Output file name prefix
    pub output_prefix: String,
}

impl Default for ViewshedConfig {
    fn default() -> Self {
        Self {
            b1: 1000.0,
            observer_height: 1.65,
            max_distance: None,
            visual_arc: 1.0,
            distance_multiplier: 3440.0,
            strict: false,
            engine_timeout_secs: None,
            jobs: None,
            id_field: "id".to_string(),
            output_prefix: "fuzzy_viewshed_".to_string(),
        }
    }
}

impl ViewshedConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: ViewshedConfig = serde_json::from_str(&text)?;
        Ok(config)
    }

    /// Reject values that would make every feature fail or produce nonsense.
    pub fn validate(&self) -> Result<()> {
        if !(self.b1.is_finite() && self.b1 > 0.0) {
            return Err(Error::configuration("b1", self.b1, "must be positive"));
        }
        if !(self.observer_height.is_finite() && self.observer_height >= 0.0) {
            return Err(Error::configuration(
                "observer_height",
                self.observer_height,
                "must be non-negative",
            ));
        }
        if let Some(max) = self.max_distance {
            if !(max > 0.0) {
                return Err(Error::configuration(
                    "max_distance",
                    max,
                    "must be positive when set",
                ));
            }
        }
        if !(self.visual_arc.is_finite() && self.visual_arc > 0.0) {
            return Err(Error::configuration(
                "visual_arc",
                self.visual_arc,
                "must be positive",
            ));
        }
        if !(self.distance_multiplier.is_finite() && self.distance_multiplier > 0.0) {
            return Err(Error::configuration(
                "distance_multiplier",
                self.distance_multiplier,
                "must be positive",
            ));
        }
        if self.jobs == Some(0) {
            return Err(Error::configuration("jobs", 0, "must be positive when set"));
        }
        if self.engine_timeout_secs == Some(0) {
            return Err(Error::configuration(
                "engine_timeout_secs",
                0,
                "must be positive when set",
            ));
        }
        if self.id_field.trim().is_empty() {
            return Err(Error::configuration("id_field", "", "must not be empty"));
        }
        Ok(())
    }

    pub fn engine_timeout(&self) -> Option<std::time::Duration> {
        self.engine_timeout_secs.map(std::time::Duration::from_secs)
    }
}
