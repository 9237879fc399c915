//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Converts underlying I/O, GDAL, JSON, geometry and engine errors, and separates
//! per-feature failures (the batch continues) from fatal ones (the batch stops).
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("Invalid geometry for feature {feature}: {source}")]
    InputGeometry {
        feature: String,
        #[source]
        source: crate::core::geometry::GeometryError,
    },

    #[error("Invalid configuration: {arg}={value} ({reason})")]
    Configuration {
        arg: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("Visibility engine failed for feature {feature}: {source}")]
    ExternalEngine {
        feature: String,
        #[source]
        source: crate::engine::EngineError,
    },

    #[error("Grid mismatch in {stage}: expected {expected:?}, got {actual:?}")]
    GridMismatch {
        stage: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Duplicate feature id: {feature}")]
    DuplicateFeatureId { feature: String },

    #[error("Feature {feature} abandoned: batch cancelled")]
    Cancelled { feature: String },

    #[error("Processing error: {0}")]
    Processing(String),
}

impl Error {
    pub fn configuration(arg: &'static str, value: impl ToString, reason: &'static str) -> Self {
        Error::Configuration {
            arg,
            value: value.to_string(),
            reason,
        }
    }

    /// Whether this error aborts the whole run rather than a single feature.
    ///
    /// I/O and GDAL failures only reach this check when raised outside a
    /// feature (opening the DEM, creating the output directory); the sink
    /// wraps per-feature write failures as `Processing`.
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::Configuration { .. } | Error::GridMismatch { .. } => true,
            Error::Io(_) | Error::Gdal(_) | Error::Json(_) | Error::Shape(_) => true,
            Error::InputGeometry { .. }
            | Error::ExternalEngine { .. }
            | Error::DuplicateFeatureId { .. }
            | Error::Cancelled { .. }
            | Error::Processing(_) => false,
        }
    }

    /// Feature identifier carried by per-feature errors.
    pub fn feature(&self) -> Option<&str> {
        match self {
            Error::InputGeometry { feature, .. }
            | Error::ExternalEngine { feature, .. }
            | Error::DuplicateFeatureId { feature }
            | Error::Cancelled { feature } => Some(feature),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::GeometryError;
    use crate::engine::EngineError;

    #[test]
    fn test_fatality_classification() {
        assert!(Error::configuration("b1", 0.0, "must be positive").is_fatal());
        assert!(
            Error::GridMismatch {
                stage: "composite",
                expected: (2, 2),
                actual: (3, 2),
            }
            .is_fatal()
        );

        let geom = Error::InputGeometry {
            feature: "7".into(),
            source: GeometryError::TooFewVertices(2),
        };
        assert!(!geom.is_fatal());
        assert_eq!(geom.feature(), Some("7"));

        let engine = Error::ExternalEngine {
            feature: "a".into(),
            source: EngineError::Timeout(std::time::Duration::from_secs(5)),
        };
        assert!(!engine.is_fatal());
        assert_eq!(engine.feature(), Some("a"));
    }

    #[test]
    fn test_configuration_message() {
        let e = Error::configuration("max_distance", -1.0, "must be positive when set");
        assert_eq!(
            e.to_string(),
            "Invalid configuration: max_distance=-1 (must be positive when set)"
        );
    }
}
