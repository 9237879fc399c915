//! Visibility engine seam: the capability "produce a line-of-sight mask for
//! terrain + observer point + height". The fuzzy pipeline treats engines as
//! black boxes; `whitebox` drives the WhiteboxTools `Viewshed` tool.
use std::time::Duration;

use thiserror::Error;

use crate::io::raster::Terrain;
use crate::types::{Point, VisibilityMask};

pub mod whitebox;
pub use whitebox::WhiteboxViewshed;

/// Errors raised by a visibility engine for one observer
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Engine unavailable: {0}")]
    Unavailable(String),
    #[error("Engine timed out after {0:?}")]
    Timeout(Duration),
    #[error("Engine exited with status {status:?}: {stderr}")]
    Failed { status: Option<i32>, stderr: String },
    #[error("Engine mask has shape {actual:?}, grid is {expected:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),
}

/// Line-of-sight provider.
///
/// Implementations must be reentrant: the batch orchestrator calls
/// `visibility` concurrently for distinct features.
pub trait VisibilityEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Mask of cells visible from a sensor at `observer`, raised
    /// `observer_height` above ground. `true` = visible.
    fn visibility(
        &self,
        terrain: &Terrain,
        observer: Point,
        observer_height: f64,
        timeout: Option<Duration>,
    ) -> Result<VisibilityMask, EngineError>;
}
