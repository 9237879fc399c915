//! Shared types used across FUZZYVIEW.
//! Includes `Point`, `FeatureRecord`, `ObserverFeature`, `FuzzyParameters`, the grid aliases
//! (`DistanceField`, `VisibilityMask`, `OutputGrid`) and the `NODATA` sentinel.
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::core::geometry::{Geometry, GeometryError};
use crate::core::processing::fuzzy::derive_b2;

/// Null sentinel for cells excluded by the max-distance policy.
pub const NODATA: f32 = f32::NAN;

/// Euclidean distance (terrain units) from the observer to every cell.
pub type DistanceField = Array2<f64>;

/// Line-of-sight result from the visibility engine; `true` = visible.
pub type VisibilityMask = Array2<bool>;

/// Final fuzzy viewshed: values in `[0, 1]` or `NODATA`.
pub type OutputGrid = Array2<f32>;

#[derive(Copy, Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One feature from the feature source. Geometry conversion failures are kept
/// so that they fail only this feature when it is processed.
#[derive(Clone, PartialEq, Debug)]
pub struct FeatureRecord {
    pub id: String,
    pub geometry: Result<Geometry, GeometryError>,
}

impl FeatureRecord {
    pub fn new(id: impl Into<String>, geometry: Geometry) -> Self {
        Self {
            id: id.into(),
            geometry: Ok(geometry),
        }
    }
}

/// Observer location and apparent size derived from one source feature.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ObserverFeature {
    pub id: String,
    pub location: Point,
    /// Max diameter of the source geometry, terrain units
    pub size: f64,
}

/// Decay parameters for the membership function.
///
/// `b2 >= 1` holds for every value built through [`FuzzyParameters::for_object_width`].
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct FuzzyParameters {
    pub b1: f64,
    pub b2: f64,
}

impl FuzzyParameters {
    pub fn for_object_width(
        object_width: f64,
        b1: f64,
        visual_arc: f64,
        distance_multiplier: f64,
    ) -> Self {
        Self {
            b1,
            b2: derive_b2(object_width, b1, visual_arc, distance_multiplier),
        }
    }
}

impl std::fmt::Display for FuzzyParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "b1={}, b2={}", self.b1, self.b2)
    }
}
