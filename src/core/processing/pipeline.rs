use tracing::{debug, info, warn};

use crate::core::geometry::{GeometryError, max_diameter, representative_point};
use crate::core::params::ViewshedConfig;
use crate::core::processing::composite::composite;
use crate::core::processing::distance::build_distance_field;
use crate::core::processing::fuzzy::compute_membership;
use crate::engine::{EngineError, VisibilityEngine};
use crate::error::{Error, Result};
use crate::io::raster::Terrain;
use crate::types::{FeatureRecord, FuzzyParameters, ObserverFeature, OutputGrid};

/// Fuzzy viewshed for one feature, with the parameters that produced it
#[derive(Debug, Clone)]
pub struct ViewshedOutput {
    pub feature: ObserverFeature,
    pub params: FuzzyParameters,
    pub observer_height: f64,
    pub max_distance: Option<f64>,
    /// Name of the visibility engine that supplied the mask
    pub engine: String,
    pub grid: OutputGrid,
}

/// Observer point (centroid) and apparent size (max diameter) of a feature.
pub fn derive_observer(record: &FeatureRecord) -> Result<ObserverFeature> {
    let wrap = |source: GeometryError| Error::InputGeometry {
        feature: record.id.clone(),
        source,
    };
    let geometry = record.geometry.as_ref().map_err(|e| wrap(e.clone()))?;
    let location = representative_point(geometry).map_err(wrap)?;
    let size = max_diameter(geometry).map_err(wrap)?;
    Ok(ObserverFeature {
        id: record.id.clone(),
        location,
        size,
    })
}

/// Run distance, visibility, membership and composition for one observer.
pub fn compute_fuzzy_viewshed(
    terrain: &Terrain,
    feature: &ObserverFeature,
    engine: &dyn VisibilityEngine,
    config: &ViewshedConfig,
) -> Result<ViewshedOutput> {
    if !feature.location.is_finite() {
        return Err(Error::InputGeometry {
            feature: feature.id.clone(),
            source: GeometryError::NonFinite(feature.location),
        });
    }
    let grid = &terrain.grid;
    if !grid.contains(&feature.location) {
        warn!(
            "Observer {} of feature {} lies outside the terrain extent",
            feature.location, feature.id
        );
    }

    let params = FuzzyParameters::for_object_width(
        feature.size,
        config.b1,
        config.visual_arc,
        config.distance_multiplier,
    );
    info!(
        "Processing feature: id={}, x={}, y={}, size={}, {}",
        feature.id, feature.location.x, feature.location.y, feature.size, params
    );

    let distances = build_distance_field(grid, feature.location);
    if distances.dim() != grid.shape() {
        return Err(Error::GridMismatch {
            stage: "distance",
            expected: grid.shape(),
            actual: distances.dim(),
        });
    }

    debug!("Requesting visibility from engine {}", engine.name());
    let visibility = engine
        .visibility(
            terrain,
            feature.location,
            config.observer_height,
            config.engine_timeout(),
        )
        .and_then(|mask| {
            if mask.dim() == grid.shape() {
                Ok(mask)
            } else {
                Err(EngineError::ShapeMismatch {
                    expected: grid.shape(),
                    actual: mask.dim(),
                })
            }
        })
        .map_err(|source| Error::ExternalEngine {
            feature: feature.id.clone(),
            source,
        })?;

    let membership = compute_membership(&distances, params);
    let output = composite(&membership, &visibility, &distances, config.max_distance)?;

    Ok(ViewshedOutput {
        feature: feature.clone(),
        params,
        observer_height: config.observer_height,
        max_distance: config.max_distance,
        engine: engine.name().to_string(),
        grid: output,
    })
}
