#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use fuzzyview::{
    EngineError, GridModel, OutputSink, Point, Terrain, ViewshedOutput, VisibilityEngine,
    VisibilityMask,
};
use ndarray::Array2;

/// 10x10 grid, resolution 1, cell coordinates 0..=9 on both axes
pub fn terrain_10x10() -> Terrain {
    let grid = GridModel::new(10, 10, 1.0, 1.0, 0.0, 9.0).unwrap();
    Terrain::in_memory(grid, "", Array2::zeros((10, 10))).unwrap()
}

#[derive(Default)]
pub struct AllVisible {
    pub calls: AtomicUsize,
}

impl AllVisible {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl VisibilityEngine for AllVisible {
    fn name(&self) -> &str {
        "all-visible"
    }

    fn visibility(
        &self,
        terrain: &Terrain,
        _observer: Point,
        _observer_height: f64,
        _timeout: Option<Duration>,
    ) -> Result<VisibilityMask, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Array2::from_elem(terrain.grid.shape(), true))
    }
}

/// Visible only at x <= observer.x
pub struct HalfPlane;

impl VisibilityEngine for HalfPlane {
    fn name(&self) -> &str {
        "half-plane"
    }

    fn visibility(
        &self,
        terrain: &Terrain,
        observer: Point,
        _observer_height: f64,
        _timeout: Option<Duration>,
    ) -> Result<VisibilityMask, EngineError> {
        let grid = terrain.grid;
        Ok(Array2::from_shape_fn(grid.shape(), |(_, c)| grid.col_x(c) <= observer.x))
    }
}

/// Fails for observers whose x is below the threshold, all-visible otherwise
pub struct FailsWest(pub f64);

impl VisibilityEngine for FailsWest {
    fn name(&self) -> &str {
        "fails-west"
    }

    fn visibility(
        &self,
        terrain: &Terrain,
        observer: Point,
        _observer_height: f64,
        timeout: Option<Duration>,
    ) -> Result<VisibilityMask, EngineError> {
        if observer.x < self.0 {
            return Err(EngineError::Timeout(timeout.unwrap_or_default()));
        }
        Ok(Array2::from_elem(terrain.grid.shape(), true))
    }
}

/// Returns a mask one row short
pub struct WrongShape;

impl VisibilityEngine for WrongShape {
    fn name(&self) -> &str {
        "wrong-shape"
    }

    fn visibility(
        &self,
        terrain: &Terrain,
        _observer: Point,
        _observer_height: f64,
        _timeout: Option<Duration>,
    ) -> Result<VisibilityMask, EngineError> {
        let (rows, cols) = terrain.grid.shape();
        Ok(Array2::from_elem((rows - 1, cols), true))
    }
}

/// Keeps finished outputs in memory
#[derive(Default)]
pub struct MemorySink {
    pub written: Mutex<Vec<ViewshedOutput>>,
}

impl MemorySink {
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .written
            .lock()
            .unwrap()
            .iter()
            .map(|o| o.feature.id.clone())
            .collect();
        ids.sort();
        ids
    }
}

impl OutputSink for MemorySink {
    fn write(&self, _terrain: &Terrain, output: &ViewshedOutput) -> fuzzyview::Result<PathBuf> {
        self.written.lock().unwrap().push(output.clone());
        Ok(PathBuf::from(format!("mem://{}", output.feature.id)))
    }
}

pub fn square(x0: f64, y0: f64, side: f64) -> fuzzyview::Polygon {
    fuzzyview::Polygon::new(vec![
        Point::new(x0, y0),
        Point::new(x0 + side, y0),
        Point::new(x0 + side, y0 + side),
        Point::new(x0, y0 + side),
        Point::new(x0, y0),
    ])
}
